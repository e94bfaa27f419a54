use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit JSON `null` the same as a missing field.
fn null_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

// ─── Notifications ────────────────────────────────────────────────────────

/// One thread from `GET /notifications`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Notification {
    /// Thread id, only meaningful to `PATCH /notifications/threads/{id}`.
    pub id: String,
    #[serde(default)]
    pub unread: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub reason: String,
    pub subject: Subject,
    pub repository: Repository,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Subject {
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    /// API URL of the subject (`…/issues/42`, `…/pulls/7`, `…/releases/1`).
    /// `null` for some subject types such as discussions.
    #[serde(default)]
    pub url: Option<String>,
    /// `Issue`, `PullRequest`, `Release`, `Discussion`, `CheckSuite`, …
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub owner: User,
    #[serde(default, deserialize_with = "null_default")]
    pub html_url: String,
}

// ─── Users / labels / teams ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

// ─── Issues / pull requests ───────────────────────────────────────────────

/// `GET /repos/{owner}/{repo}/issues/{number}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub html_url: String,
    /// `open` or `closed`.
    pub state: String,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_default")]
    pub labels: Vec<Label>,
    #[serde(default, deserialize_with = "null_default")]
    pub assignees: Vec<User>,
    #[serde(default)]
    pub user: Option<User>,
}

/// `GET /repos/{owner}/{repo}/pulls/{number}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub html_url: String,
    pub state: String,
    #[serde(default, deserialize_with = "null_default")]
    pub draft: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub merged: bool,
    /// `null` while GitHub is still computing mergeability.
    #[serde(default)]
    pub mergeable: Option<bool>,
    #[serde(default)]
    pub mergeable_state: Option<String>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_default")]
    pub labels: Vec<Label>,
    #[serde(default, deserialize_with = "null_default")]
    pub requested_reviewers: Vec<User>,
    #[serde(default, deserialize_with = "null_default")]
    pub requested_teams: Vec<Team>,
    #[serde(default, deserialize_with = "null_default")]
    pub assignees: Vec<User>,
    #[serde(default)]
    pub user: Option<User>,
    pub head: CommitRef,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommitRef {
    pub sha: String,
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
}

/// One entry of `GET /repos/{owner}/{repo}/pulls/{number}/reviews`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Review {
    #[serde(default)]
    pub id: u64,
    /// `APPROVED`, `CHANGES_REQUESTED`, `COMMENTED`, `DISMISSED`, `PENDING`.
    pub state: String,
    /// Absent for pending reviews.
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<User>,
}

// ─── CI signals ───────────────────────────────────────────────────────────

/// `GET /repos/{owner}/{repo}/commits/{ref}/status`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CombinedStatus {
    #[serde(default, deserialize_with = "null_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_default")]
    pub statuses: Vec<CommitStatus>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommitStatus {
    /// `error`, `failure`, `pending` or `success`.
    pub state: String,
    #[serde(default, deserialize_with = "null_default")]
    pub context: String,
}

/// `GET /repos/{owner}/{repo}/commits/{ref}/check-runs`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CheckRunList {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub check_runs: Vec<CheckRun>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckRun {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    /// `queued`, `in_progress` or `completed`.
    pub status: String,
    /// Only set once `status == "completed"`.
    #[serde(default)]
    pub conclusion: Option<String>,
}
