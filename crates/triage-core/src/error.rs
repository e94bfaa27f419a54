use github_client::GitHubError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    #[error(transparent)]
    Remote(#[from] GitHubError),

    #[error("failed to resolve {url}: {reason}")]
    Resolution { url: String, reason: String },

    #[error("failed to open {url} in browser: {source}")]
    Browser {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write listing: {0}")]
    Output(#[source] std::io::Error),

    #[error("failed to process notifications (page {page}): {source}")]
    Page {
        page: u32,
        #[source]
        source: Box<TriageError>,
    },

    #[error("triage cancelled")]
    Cancelled,

    #[error("notification worker failed: {0}")]
    Worker(String),

    #[error("invalid profile name '{0}': must not contain path separators or start with '.'")]
    InvalidProfileName(String),

    #[error("home directory not found: set HOME or XDG_DATA_HOME")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl TriageError {
    pub fn resolution(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// `true` when the run stopped because its cancellation token fired,
    /// either directly or on behalf of a failing sibling.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Page { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
