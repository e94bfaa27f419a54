use anyhow::{bail, Result};
use std::time::Duration;

/// Parse a human duration such as `5min`, `1hour`, `90s` or `1h30m`.
///
/// One or more `<integer><unit>` groups, optionally separated by spaces.
/// A total of zero is rejected.
pub fn parse(input: &str) -> Result<Duration> {
    let s = input.trim();
    if s.is_empty() {
        bail!("empty duration");
    }

    let mut total_ms: u64 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            bail!("expected a number at '{rest}' in '{s}'");
        }
        let value: u64 = rest[..digits].parse()?;
        rest = &rest[digits..];

        let unit_len = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()).len();
        let unit = &rest[..unit_len];
        rest = rest[unit_len..].trim_start();

        let Some(scale) = unit_ms(unit) else {
            if unit.is_empty() {
                bail!("missing unit after {value} in '{s}'");
            }
            bail!("unknown unit '{unit}' in '{s}'");
        };
        total_ms = value
            .checked_mul(scale)
            .and_then(|ms| total_ms.checked_add(ms))
            .ok_or_else(|| anyhow::anyhow!("duration '{s}' is too large"))?;
    }

    if total_ms == 0 {
        bail!("duration must be greater than zero");
    }
    Ok(Duration::from_millis(total_ms))
}

fn unit_ms(unit: &str) -> Option<u64> {
    const SECOND: u64 = 1_000;
    const MINUTE: u64 = 60 * SECOND;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    let ms = match unit.to_ascii_lowercase().as_str() {
        "ms" => 1,
        "s" | "sec" | "secs" | "second" | "seconds" => SECOND,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "week" | "weeks" => 7 * DAY,
        _ => return None,
    };
    Some(ms)
}
