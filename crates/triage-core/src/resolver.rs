//! Turns a [`NotificationRef`] into the [`Attributes`] rules run against.
//!
//! Issues and pull requests are fetched by number (taken from the subject
//! URL); pull requests additionally pull their reviews, combined commit
//! status and check runs for the head commit. Releases need no API calls.
//! Anything else is skipped with a warning.

use crate::attributes::Attributes;
use crate::error::{Result, TriageError};
use crate::notification::{NotificationRef, SubjectKind};
use github_client::{Api, CheckRunList, CombinedStatus, Review};
use std::sync::Arc;
use tokio::sync::OnceCell;
use url::Url;

const APPROVED: &str = "APPROVED";
const PASSING_CONCLUSIONS: &[&str] = &["neutral", "skipped", "success"];

/// A notification ready for rule evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub attributes: Attributes,
    /// Where `open` points the browser and what the listing links to.
    pub display_url: String,
}

/// Resolves notifications for a single run.
///
/// The authenticated login (`me`) is fetched on first use and shared by every
/// notification resolved through this instance.
pub struct Resolver {
    api: Arc<dyn Api>,
    me: OnceCell<String>,
}

impl Resolver {
    pub fn new(api: Arc<dyn Api>) -> Self {
        Self {
            api,
            me: OnceCell::new(),
        }
    }

    pub async fn me(&self) -> Result<String> {
        let login = self
            .me
            .get_or_try_init(|| async {
                let user = self.api.current_user().await?;
                Ok::<_, TriageError>(user.login)
            })
            .await?;
        Ok(login.clone())
    }

    /// `Ok(None)` for subject types rules cannot be written against.
    pub async fn resolve(&self, n: &NotificationRef) -> Result<Option<Resolved>> {
        if let SubjectKind::Unknown(kind) = &n.kind {
            tracing::warn!(
                subject_type = %kind,
                url = n.subject_url.as_deref().unwrap_or_default(),
                "Unknown subject type"
            );
            return Ok(None);
        }

        let me = self.me().await?;
        let mut attrs = Attributes::new(&n.title, &n.owner, &n.repo, me);

        let display_url = match n.kind {
            SubjectKind::Issue => self.fill_issue(n, &mut attrs).await?,
            SubjectKind::PullRequest => self.fill_pull_request(n, &mut attrs).await?,
            _ => {
                attrs.is_release = true;
                release_page(n)
            }
        };

        tracing::debug!(
            repo = %n.full_name(),
            number = attrs.number,
            state = %attrs.state,
            "resolved notification"
        );
        Ok(Some(Resolved {
            attributes: attrs,
            display_url,
        }))
    }

    async fn fill_issue(&self, n: &NotificationRef, attrs: &mut Attributes) -> Result<String> {
        attrs.is_issue = true;
        let number = subject_number(n)?;
        attrs.number = number as i64;

        let issue = self.api.get_issue(&n.owner, &n.repo, number).await?;
        attrs.state = issue.state;
        attrs.closed = issue.closed_at.is_some();
        attrs.labels = issue.labels.into_iter().map(|l| l.name).collect();
        attrs.assignees = issue.assignees.into_iter().map(|u| u.login).collect();
        attrs.author = issue.user.map(|u| u.login).unwrap_or_default();
        attrs.html_url = issue.html_url.clone();
        Ok(issue.html_url)
    }

    async fn fill_pull_request(&self, n: &NotificationRef, attrs: &mut Attributes) -> Result<String> {
        attrs.is_pull_request = true;
        let number = subject_number(n)?;
        attrs.number = number as i64;

        let pr = self.api.get_pull_request(&n.owner, &n.repo, number).await?;
        attrs.state = pr.state;
        attrs.draft = pr.draft;
        attrs.merged = pr.merged;
        attrs.mergeable = pr.mergeable.unwrap_or(false);
        attrs.mergeable_state = pr
            .mergeable_state
            .unwrap_or_else(|| crate::attributes::UNKNOWN.to_string());
        attrs.closed = pr.closed_at.is_some();
        attrs.labels = pr.labels.into_iter().map(|l| l.name).collect();
        attrs.reviewers = pr.requested_reviewers.into_iter().map(|u| u.login).collect();
        attrs.review_teams = pr.requested_teams.into_iter().map(|t| t.name).collect();
        attrs.assignees = pr.assignees.into_iter().map(|u| u.login).collect();
        attrs.author = pr.user.map(|u| u.login).unwrap_or_default();
        attrs.html_url = pr.html_url.clone();

        let sha = pr.head.sha;
        let (reviews, status, checks) = tokio::try_join!(
            self.api.list_reviews(&n.owner, &n.repo, number),
            self.api.combined_status(&n.owner, &n.repo, &sha),
            self.api.list_check_runs(&n.owner, &n.repo, &sha),
        )?;

        let (approved, review_states) = review_summary(reviews);
        attrs.approved = approved;
        attrs.review_states = review_states;
        attrs.status_passed = status_passed(&status);
        attrs.checks_passed = checks_passed(&checks);
        attrs.passed = attrs.status_passed && attrs.checks_passed;

        Ok(pr.html_url)
    }
}

/// The trailing number of `…/issues/42` or `…/pulls/42`.
fn subject_number(n: &NotificationRef) -> Result<u64> {
    let raw = n
        .subject_url
        .as_deref()
        .ok_or_else(|| TriageError::resolution(n.full_name(), "notification has no subject URL"))?;
    let url = Url::parse(raw)
        .map_err(|e| TriageError::resolution(raw, format!("failed to parse URL: {e}")))?;
    let last = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(|| TriageError::resolution(raw, "URL has no path"))?;
    last.parse::<u64>().map_err(|e| {
        TriageError::resolution(raw, format!("failed to parse number from URL: {e}"))
    })
}

fn release_page(n: &NotificationRef) -> String {
    if n.repo_html_url.is_empty() {
        String::new()
    } else {
        format!("{}/releases", n.repo_html_url)
    }
}

/// Walk reviews oldest first and stop at the first approval. Returns whether
/// one was found and every state seen up to and including it.
fn review_summary(mut reviews: Vec<Review>) -> (bool, Vec<String>) {
    reviews.sort_by_key(|r| r.submitted_at);
    let mut states = Vec::new();
    for review in reviews {
        let approved = review.state == APPROVED;
        states.push(review.state);
        if approved {
            return (true, states);
        }
    }
    (false, states)
}

fn status_passed(status: &CombinedStatus) -> bool {
    status.statuses.iter().all(|s| s.state == "success")
}

fn checks_passed(checks: &CheckRunList) -> bool {
    checks.check_runs.iter().all(|run| {
        run.status == "completed"
            && run
                .conclusion
                .as_deref()
                .is_some_and(|c| PASSING_CONCLUSIONS.contains(&c))
    })
}
