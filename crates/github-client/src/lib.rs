//! `github-client` — typed async access to the GitHub REST endpoints that
//! `gh-triage` needs.
//!
//! # Architecture
//!
//! ```text
//! auth::resolve_token / auth::resolve_base_url
//!     │
//!     ▼
//! Client          ← reqwest client with the GitHub headers preset
//!     │              one method per endpoint, JSON decoded into `types`
//!     ▼
//! Api trait       ← the seam the triage engine consumes (`Arc<dyn Api>`)
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use github_client::{Api, Client};
//!
//! let client = Client::from_env()?;
//! let page = client.list_notifications(1, 100).await?;
//! for n in page {
//!     println!("{} {}", n.subject.kind, n.subject.title);
//! }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod types;


pub use api::Api;
pub use client::Client;
pub use error::GitHubError;
pub use types::{
    CheckRun, CheckRunList, CombinedStatus, CommitRef, CommitStatus, Issue, Label, Notification,
    PullRequest, Repository, Review, Subject, Team, User,
};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, GitHubError>;
