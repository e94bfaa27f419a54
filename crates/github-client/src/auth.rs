use std::process::Command;

use crate::{GitHubError, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_HOST: &str = "github.com";

/// Resolve the API token.
///
/// Priority:
/// 1. `GH_TOKEN`
/// 2. `GITHUB_TOKEN`
/// 3. `gh auth token` (only when the `gh` binary is on `PATH`)
pub fn resolve_token() -> Result<String> {
    if let Some(token) = token_from_env(|k| std::env::var(k).ok()) {
        return Ok(token);
    }
    token_from_gh(host_from_env(|k| std::env::var(k).ok()).as_deref())
}

/// Resolve the REST base URL (no trailing slash).
///
/// Priority:
/// 1. `GITHUB_API_URL`
/// 2. `GH_HOST` → `https://{host}/api/v3` (GitHub Enterprise Server)
/// 3. `https://api.github.com`
pub fn resolve_base_url() -> String {
    base_url_from_env(|k| std::env::var(k).ok())
}

pub(crate) fn token_from_env(get: impl Fn(&str) -> Option<String>) -> Option<String> {
    ["GH_TOKEN", "GITHUB_TOKEN"]
        .iter()
        .filter_map(|k| get(k))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

pub(crate) fn base_url_from_env(get: impl Fn(&str) -> Option<String>) -> String {
    if let Some(url) = get("GITHUB_API_URL").filter(|u| !u.trim().is_empty()) {
        return url.trim().trim_end_matches('/').to_string();
    }
    match host_from_env(get) {
        Some(host) => format!("https://{host}/api/v3"),
        None => DEFAULT_API_URL.to_string(),
    }
}

/// `GH_HOST`, unless it is unset, blank, or plain `github.com`.
fn host_from_env(get: impl Fn(&str) -> Option<String>) -> Option<String> {
    get("GH_HOST")
        .map(|h| h.trim().trim_end_matches('/').to_string())
        .filter(|h| !h.is_empty() && h != DEFAULT_HOST)
}

fn token_from_gh(host: Option<&str>) -> Result<String> {
    let gh = which::which("gh").map_err(|_| GitHubError::MissingToken)?;
    let mut cmd = Command::new(gh);
    cmd.args(["auth", "token"]);
    if let Some(host) = host {
        cmd.args(["--hostname", host]);
    }
    let output = cmd.output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(GitHubError::TokenCommand(stderr));
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(GitHubError::MissingToken);
    }
    tracing::debug!("using token from `gh auth token`");
    Ok(token)
}
