use async_trait::async_trait;

use crate::types::{CheckRunList, CombinedStatus, Issue, Notification, PullRequest, Review, User};
use crate::{Client, Result};

/// The GitHub operations the triage engine depends on.
///
/// [`Client`] is the production implementation; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait Api: Send + Sync {
    async fn list_notifications(&self, page: u32, per_page: u32) -> Result<Vec<Notification>>;
    async fn current_user(&self) -> Result<User>;
    async fn get_issue(&self, owner: &str, repo: &str, number: u64) -> Result<Issue>;
    async fn get_pull_request(&self, owner: &str, repo: &str, number: u64) -> Result<PullRequest>;
    async fn list_reviews(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<Review>>;
    async fn combined_status(&self, owner: &str, repo: &str, sha: &str) -> Result<CombinedStatus>;
    async fn list_check_runs(&self, owner: &str, repo: &str, sha: &str) -> Result<CheckRunList>;
    async fn mark_thread_read(&self, thread_id: &str) -> Result<()>;
}

#[async_trait]
impl Api for Client {
    async fn list_notifications(&self, page: u32, per_page: u32) -> Result<Vec<Notification>> {
        Client::list_notifications(self, page, per_page).await
    }

    async fn current_user(&self) -> Result<User> {
        Client::current_user(self).await
    }

    async fn get_issue(&self, owner: &str, repo: &str, number: u64) -> Result<Issue> {
        Client::get_issue(self, owner, repo, number).await
    }

    async fn get_pull_request(&self, owner: &str, repo: &str, number: u64) -> Result<PullRequest> {
        Client::get_pull_request(self, owner, repo, number).await
    }

    async fn list_reviews(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<Review>> {
        Client::list_reviews(self, owner, repo, number).await
    }

    async fn combined_status(&self, owner: &str, repo: &str, sha: &str) -> Result<CombinedStatus> {
        Client::combined_status(self, owner, repo, sha).await
    }

    async fn list_check_runs(&self, owner: &str, repo: &str, sha: &str) -> Result<CheckRunList> {
        Client::list_check_runs(self, owner, repo, sha).await
    }

    async fn mark_thread_read(&self, thread_id: &str) -> Result<()> {
        Client::mark_thread_read(self, thread_id).await
    }
}
