//! In-memory GitHub and browser fakes shared by the unit tests.

use crate::browser::Browser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use github_client::{
    Api, CheckRun, CheckRunList, CombinedStatus, CommitRef, GitHubError, Issue, Notification,
    PullRequest, Repository, Review, Subject, User,
};
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

pub const OWNER: &str = "octo";
pub const REPO: &str = "hello";

pub fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

pub fn issue_api_url(number: u64) -> String {
    format!("https://api.github.com/repos/{OWNER}/{REPO}/issues/{number}")
}

pub fn pull_api_url(number: u64) -> String {
    format!("https://api.github.com/repos/{OWNER}/{REPO}/pulls/{number}")
}

pub fn notification(id: &str, kind: &str, url: Option<&str>) -> Notification {
    Notification {
        id: id.to_string(),
        unread: true,
        reason: "subscribed".into(),
        subject: Subject {
            title: format!("title {id}"),
            url: url.map(str::to_string),
            kind: kind.to_string(),
        },
        repository: Repository {
            name: REPO.into(),
            full_name: Some(format!("{OWNER}/{REPO}")),
            owner: User { login: OWNER.into() },
            html_url: format!("https://github.com/{OWNER}/{REPO}"),
        },
        updated_at: None,
    }
}

pub fn issue_notification(id: &str, number: u64) -> Notification {
    notification(id, "Issue", Some(&issue_api_url(number)))
}

pub fn pull_notification(id: &str, number: u64) -> Notification {
    notification(id, "PullRequest", Some(&pull_api_url(number)))
}

pub fn issue(number: u64, state: &str) -> Issue {
    Issue {
        number,
        html_url: format!("https://github.com/{OWNER}/{REPO}/issues/{number}"),
        state: state.to_string(),
        closed_at: None,
        labels: vec![],
        assignees: vec![],
        user: Some(User { login: "author".into() }),
    }
}

pub fn pull(number: u64) -> PullRequest {
    PullRequest {
        number,
        html_url: format!("https://github.com/{OWNER}/{REPO}/pull/{number}"),
        state: "open".into(),
        draft: false,
        merged: false,
        mergeable: Some(true),
        mergeable_state: Some("clean".into()),
        closed_at: None,
        labels: vec![],
        requested_reviewers: vec![],
        requested_teams: vec![],
        assignees: vec![],
        user: Some(User { login: "author".into() }),
        head: CommitRef {
            sha: format!("sha-{number}"),
            git_ref: Some("feature".into()),
        },
    }
}

pub fn merged_pull(number: u64) -> PullRequest {
    PullRequest {
        state: "closed".into(),
        merged: true,
        closed_at: Some(ts(1_000)),
        ..pull(number)
    }
}

pub fn review(state: &str, submitted: Option<i64>) -> Review {
    Review {
        id: 0,
        state: state.to_string(),
        submitted_at: submitted.map(ts),
        user: None,
    }
}

pub fn check_run(status: &str, conclusion: Option<&str>) -> CheckRun {
    CheckRun {
        name: "build".into(),
        status: status.to_string(),
        conclusion: conclusion.map(str::to_string),
    }
}

fn not_found(what: String) -> GitHubError {
    GitHubError::Status {
        status: 404,
        url: what,
        message: "Not Found".into(),
    }
}

/// Serves canned responses and records every call as `"<method> <arg>"`.
#[derive(Default)]
pub struct FakeApi {
    pub login: String,
    /// `pages[0]` is page 1; anything past the end is an empty page.
    pub pages: Vec<Vec<Notification>>,
    pub issues: HashMap<u64, Issue>,
    pub pulls: HashMap<u64, PullRequest>,
    pub reviews: HashMap<u64, Vec<Review>>,
    pub statuses: HashMap<String, CombinedStatus>,
    pub check_runs: HashMap<String, CheckRunList>,
    /// Thread ids whose mark-read call fails.
    pub fail_mark_read: HashSet<String>,
    /// Issue numbers whose fetch never completes.
    pub hang_issues: HashSet<u64>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new(login: &str) -> Self {
        Self {
            login: login.to_string(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, method: &str) -> Vec<String> {
        let prefix = format!("{method} ");
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Api for FakeApi {
    async fn list_notifications(
        &self,
        page: u32,
        _per_page: u32,
    ) -> github_client::Result<Vec<Notification>> {
        self.record(format!("list_notifications {page}"));
        let idx = page.saturating_sub(1) as usize;
        Ok(self.pages.get(idx).cloned().unwrap_or_default())
    }

    async fn current_user(&self) -> github_client::Result<User> {
        self.record("current_user".into());
        Ok(User {
            login: self.login.clone(),
        })
    }

    async fn get_issue(&self, _owner: &str, _repo: &str, number: u64) -> github_client::Result<Issue> {
        self.record(format!("get_issue {number}"));
        if self.hang_issues.contains(&number) {
            std::future::pending::<()>().await;
        }
        self.issues
            .get(&number)
            .cloned()
            .ok_or_else(|| not_found(issue_api_url(number)))
    }

    async fn get_pull_request(
        &self,
        _owner: &str,
        _repo: &str,
        number: u64,
    ) -> github_client::Result<PullRequest> {
        self.record(format!("get_pull_request {number}"));
        self.pulls
            .get(&number)
            .cloned()
            .ok_or_else(|| not_found(pull_api_url(number)))
    }

    async fn list_reviews(&self, _owner: &str, _repo: &str, number: u64) -> github_client::Result<Vec<Review>> {
        self.record(format!("list_reviews {number}"));
        Ok(self.reviews.get(&number).cloned().unwrap_or_default())
    }

    async fn combined_status(&self, _owner: &str, _repo: &str, sha: &str) -> github_client::Result<CombinedStatus> {
        self.record(format!("combined_status {sha}"));
        Ok(self.statuses.get(sha).cloned().unwrap_or_default())
    }

    async fn list_check_runs(&self, _owner: &str, _repo: &str, sha: &str) -> github_client::Result<CheckRunList> {
        self.record(format!("list_check_runs {sha}"));
        Ok(self.check_runs.get(sha).cloned().unwrap_or_default())
    }

    async fn mark_thread_read(&self, thread_id: &str) -> github_client::Result<()> {
        self.record(format!("mark_thread_read {thread_id}"));
        if self.fail_mark_read.contains(thread_id) {
            return Err(GitHubError::Status {
                status: 500,
                url: format!("https://api.github.com/notifications/threads/{thread_id}"),
                message: "boom".into(),
            });
        }
        Ok(())
    }
}

/// Records opened URLs instead of launching anything.
#[derive(Default)]
pub struct FakeBrowser {
    pub fail: bool,
    opened: Mutex<Vec<String>>,
}

impl FakeBrowser {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl Browser for FakeBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no browser"));
        }
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// A `Write` whose bytes stay readable after it is boxed away.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
