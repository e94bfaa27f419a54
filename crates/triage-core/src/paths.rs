use crate::error::{Result, TriageError};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory / file constants
// ---------------------------------------------------------------------------

pub const APP_DIR: &str = "gh-triage";
pub const PROFILE_EXT: &str = "yml";
pub const DEFAULT_PROFILE_FILE: &str = "default.yml";
/// Single-profile config file written by earlier releases.
pub const LEGACY_CONFIG_FILE: &str = "config.yml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `$XDG_DATA_HOME/gh-triage`, else `$HOME/.local/share/gh-triage`.
pub fn data_dir() -> Result<PathBuf> {
    data_dir_from(std::env::var("XDG_DATA_HOME").ok(), home::home_dir())
}

pub(crate) fn data_dir_from(xdg_data_home: Option<String>, home: Option<PathBuf>) -> Result<PathBuf> {
    match xdg_data_home.filter(|v| !v.is_empty()) {
        Some(xdg) => Ok(PathBuf::from(xdg).join(APP_DIR)),
        None => {
            let home = home.ok_or(TriageError::HomeNotFound)?;
            Ok(home.join(".local").join("share").join(APP_DIR))
        }
    }
}

/// File backing the profile `name` inside `dir`. An empty name selects the
/// default profile.
pub fn profile_path(dir: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() {
        return Ok(dir.join(DEFAULT_PROFILE_FILE));
    }
    validate_profile_name(name)?;
    Ok(dir.join(format!("{name}.{PROFILE_EXT}")))
}

pub fn legacy_config_path(dir: &Path) -> PathBuf {
    dir.join(LEGACY_CONFIG_FILE)
}

fn validate_profile_name(name: &str) -> Result<()> {
    if name.starts_with('.') || name.contains('/') || name.contains('\\') {
        return Err(TriageError::InvalidProfileName(name.to_string()));
    }
    Ok(())
}
