use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::auth;
use crate::types::{CheckRunList, CombinedStatus, Issue, Notification, PullRequest, Review, User};
use crate::{GitHubError, Result};

const API_VERSION: &str = "2022-11-28";

/// Page size used for listings that are read in a single request
/// (reviews, check runs). GitHub caps `per_page` at 100.
const LIST_PAGE_SIZE: u32 = 100;

// ─── Client ───────────────────────────────────────────────────────────────

/// A thin, typed wrapper over the GitHub REST API.
///
/// Cloning is cheap: the underlying `reqwest::Client` shares its connection
/// pool.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Build a client for `base_url` authenticated with `token`.
    pub fn new(base_url: impl Into<String>, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(API_VERSION),
        );
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| GitHubError::MissingToken)?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("gh-triage/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build a client from the environment (see [`auth`]).
    pub fn from_env() -> Result<Self> {
        let token = auth::resolve_token()?;
        Self::new(auth::resolve_base_url(), &token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ─── Endpoints ────────────────────────────────────────────────────────

    /// One page of unread notifications for the authenticated user.
    pub async fn list_notifications(&self, page: u32, per_page: u32) -> Result<Vec<Notification>> {
        let req = self
            .request(Method::GET, "/notifications")
            .query(&[("page", page), ("per_page", per_page)]);
        self.json(req).await
    }

    pub async fn current_user(&self) -> Result<User> {
        self.json(self.request(Method::GET, "/user")).await
    }

    pub async fn get_issue(&self, owner: &str, repo: &str, number: u64) -> Result<Issue> {
        let path = format!("/repos/{owner}/{repo}/issues/{number}");
        self.json(self.request(Method::GET, &path)).await
    }

    pub async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest> {
        let path = format!("/repos/{owner}/{repo}/pulls/{number}");
        self.json(self.request(Method::GET, &path)).await
    }

    pub async fn list_reviews(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<Review>> {
        let path = format!("/repos/{owner}/{repo}/pulls/{number}/reviews");
        let req = self
            .request(Method::GET, &path)
            .query(&[("per_page", LIST_PAGE_SIZE)]);
        self.json(req).await
    }

    pub async fn combined_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<CombinedStatus> {
        let path = format!("/repos/{owner}/{repo}/commits/{sha}/status");
        self.json(self.request(Method::GET, &path)).await
    }

    pub async fn list_check_runs(&self, owner: &str, repo: &str, sha: &str) -> Result<CheckRunList> {
        let path = format!("/repos/{owner}/{repo}/commits/{sha}/check-runs");
        let req = self
            .request(Method::GET, &path)
            .query(&[("per_page", LIST_PAGE_SIZE)]);
        self.json(req).await
    }

    /// Mark a notification thread as read. GitHub answers `205 Reset Content`.
    pub async fn mark_thread_read(&self, thread_id: &str) -> Result<()> {
        let path = format!("/notifications/threads/{thread_id}");
        self.send(self.request(Method::PATCH, &path)).await?;
        Ok(())
    }

    // ─── Internal ─────────────────────────────────────────────────────────

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = self.send(req).await?;
        Ok(resp.json::<T>().await?)
    }

    /// Send `req`, turning any non-2xx answer into [`GitHubError::Status`].
    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let url = resp.url().to_string();
        let body = resp.text().await.unwrap_or_default();
        Err(GitHubError::Status {
            status: status.as_u16(),
            url,
            message: error_message(&body),
        })
    }
}

/// Extract GitHub's `{"message": "..."}` from an error body, falling back to
/// the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
