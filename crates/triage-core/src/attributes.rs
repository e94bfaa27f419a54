//! The flat, fixed-schema view of one notification that rules are evaluated
//! against.
//!
//! [`Attributes`] is a plain struct: every key exists for every notification,
//! with a zero value when it does not apply to the subject type. The
//! expression engine sees it only through [`Lookup`].

use crate::expr::{Lookup, Value};

/// Every key a rule may reference.
pub const KEYS: &[&str] = &[
    "title",
    "owner",
    "repo",
    "number",
    "is_issue",
    "is_pull_request",
    "is_release",
    "state",
    "draft",
    "merged",
    "mergeable",
    "mergeable_state",
    "closed",
    "labels",
    "reviewers",
    "review_teams",
    "assignees",
    "author",
    "html_url",
    "approved",
    "review_states",
    "status_passed",
    "checks_passed",
    "passed",
    "me",
];

pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct Attributes {
    pub title: String,
    pub owner: String,
    pub repo: String,
    /// `-1` unless the subject is an issue or pull request.
    pub number: i64,
    pub is_issue: bool,
    pub is_pull_request: bool,
    pub is_release: bool,
    pub state: String,
    pub draft: bool,
    pub merged: bool,
    pub mergeable: bool,
    pub mergeable_state: String,
    pub closed: bool,
    pub labels: Vec<String>,
    /// Logins of requested reviewers.
    pub reviewers: Vec<String>,
    /// Names of requested teams.
    pub review_teams: Vec<String>,
    pub assignees: Vec<String>,
    pub author: String,
    pub html_url: String,
    pub approved: bool,
    /// Review states in submission order, up to and including the first
    /// approval.
    pub review_states: Vec<String>,
    pub status_passed: bool,
    pub checks_passed: bool,
    pub passed: bool,
    /// Login of the authenticated user.
    pub me: String,
}

impl Attributes {
    /// A fully populated map with every subject-specific key at its zero
    /// value.
    pub fn new(
        title: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        me: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            owner: owner.into(),
            repo: repo.into(),
            number: -1,
            is_issue: false,
            is_pull_request: false,
            is_release: false,
            state: UNKNOWN.to_string(),
            draft: false,
            merged: false,
            mergeable: false,
            mergeable_state: UNKNOWN.to_string(),
            closed: false,
            labels: Vec::new(),
            reviewers: Vec::new(),
            review_teams: Vec::new(),
            assignees: Vec::new(),
            author: String::new(),
            html_url: String::new(),
            approved: false,
            review_states: Vec::new(),
            status_passed: false,
            checks_passed: false,
            passed: false,
            me: me.into(),
        }
    }
}

fn strings(v: &[String]) -> Value {
    Value::List(v.iter().cloned().map(Value::Str).collect())
}

impl Lookup for Attributes {
    fn lookup(&self, name: &str) -> Option<Value> {
        let v = match name {
            "title" => Value::Str(self.title.clone()),
            "owner" => Value::Str(self.owner.clone()),
            "repo" => Value::Str(self.repo.clone()),
            "number" => Value::Int(self.number),
            "is_issue" => Value::Bool(self.is_issue),
            "is_pull_request" => Value::Bool(self.is_pull_request),
            "is_release" => Value::Bool(self.is_release),
            "state" => Value::Str(self.state.clone()),
            "draft" => Value::Bool(self.draft),
            "merged" => Value::Bool(self.merged),
            "mergeable" => Value::Bool(self.mergeable),
            "mergeable_state" => Value::Str(self.mergeable_state.clone()),
            "closed" => Value::Bool(self.closed),
            "labels" => strings(&self.labels),
            "reviewers" => strings(&self.reviewers),
            "review_teams" => strings(&self.review_teams),
            "assignees" => strings(&self.assignees),
            "author" => Value::Str(self.author.clone()),
            "html_url" => Value::Str(self.html_url.clone()),
            "approved" => Value::Bool(self.approved),
            "review_states" => strings(&self.review_states),
            "status_passed" => Value::Bool(self.status_passed),
            "checks_passed" => Value::Bool(self.checks_passed),
            "passed" => Value::Bool(self.passed),
            "me" => Value::Str(self.me.clone()),
            _ => return None,
        };
        Some(v)
    }
}
