use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API returned {status} for {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    #[error("no GitHub token found: set GH_TOKEN or GITHUB_TOKEN, or run `gh auth login`")]
    MissingToken,

    #[error("`gh auth token` failed: {0}")]
    TokenCommand(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GitHubError {
    /// HTTP status code for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
