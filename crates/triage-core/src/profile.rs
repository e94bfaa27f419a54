use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tempfile::NamedTempFile;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// One rule category: the conditions that select notifications and how many
/// of them a single run may act on.
///
/// A missing section or field deserializes to zero / empty, which never
/// fires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Maximum number of issues/pull requests to process per run.
    #[serde(default)]
    pub max: i64,
    /// Conditions to match issues/pull requests. `"*"` matches everything.
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl Action {
    pub fn new(max: i64, conditions: &[&str]) -> Self {
        Self {
            max,
            conditions: conditions.iter().map(|c| c.to_string()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// A named rule set, stored as `<data dir>/<name>.yml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Mark as read issues/pull requests that match the conditions.
    #[serde(default)]
    pub read: Action,
    /// Open issues/pull requests that match the conditions.
    #[serde(default)]
    pub open: Action,
    /// List issues/pull requests that match the conditions.
    #[serde(default)]
    pub list: Action,
}

pub const DEFAULT_OPEN_CONDITION: &str =
    "is_pull_request && me in reviewers && passed && !approved && !draft && !closed && !merged";

impl Default for Profile {
    fn default() -> Self {
        Self {
            read: Action::new(1000, &["merged"]),
            open: Action::new(1, &[DEFAULT_OPEN_CONDITION]),
            list: Action::new(1000, &["*"]),
        }
    }
}

impl Profile {
    /// Load profile `name` (empty for the default profile) from the user's
    /// data directory.
    pub fn load(name: &str) -> Result<Self> {
        Self::load_from(&paths::data_dir()?, name)
    }

    /// Load profile `name` from `dir`.
    ///
    /// - default profile only: a legacy `config.yml` is moved to
    ///   `default.yml` when the latter does not exist yet;
    /// - a missing file is created with [`Profile::default`] and that default
    ///   is returned.
    pub fn load_from(dir: &Path, name: &str) -> Result<Self> {
        let path = paths::profile_path(dir, name)?;

        if name.is_empty() && !path.exists() {
            let legacy = paths::legacy_config_path(dir);
            if legacy.exists() {
                create_dir_private(dir)?;
                let data = std::fs::read(&legacy)?;
                write_private(&path, &data)?;
                std::fs::remove_file(&legacy)?;
                tracing::info!(
                    from = %legacy.display(),
                    to = %path.display(),
                    "migrated config file"
                );
            }
        }

        if !path.exists() {
            create_dir_private(dir)?;
            let profile = Self::default();
            let yaml = serde_yaml::to_string(&profile)?;
            write_private(&path, yaml.as_bytes())?;
            tracing::info!(path = %path.display(), "created config file");
            return Ok(profile);
        }

        let data = std::fs::read_to_string(&path)?;
        let profile: Profile = serde_yaml::from_str(&data)?;
        Ok(profile)
    }
}

// ---------------------------------------------------------------------------
// Private-permission file helpers
// ---------------------------------------------------------------------------

fn create_dir_private(dir: &Path) -> std::io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

/// Atomically write `data` to `path` through a tempfile in the same
/// directory. The tempfile is created 0600 on unix.
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
