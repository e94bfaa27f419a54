use github_client::Notification;

/// What a notification points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectKind {
    Issue,
    PullRequest,
    Release,
    /// Discussions, check suites, commits, … carried with their wire tag.
    Unknown(String),
}

impl SubjectKind {
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "Issue" => SubjectKind::Issue,
            "PullRequest" => SubjectKind::PullRequest,
            "Release" => SubjectKind::Release,
            other => SubjectKind::Unknown(other.to_string()),
        }
    }
}

/// One unread notification, as handed from the orchestrator to a worker.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRef {
    /// Thread id; only used to mark the thread read.
    pub thread_id: String,
    pub kind: SubjectKind,
    pub title: String,
    /// API URL of the subject, when GitHub provides one.
    pub subject_url: Option<String>,
    pub owner: String,
    pub repo: String,
    pub repo_html_url: String,
}

impl NotificationRef {
    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl From<Notification> for NotificationRef {
    fn from(n: Notification) -> Self {
        Self {
            thread_id: n.id,
            kind: SubjectKind::from_wire(&n.subject.kind),
            title: n.subject.title,
            subject_url: n.subject.url,
            owner: n.repository.owner.login,
            repo: n.repository.name,
            repo_html_url: n.repository.html_url,
        }
    }
}
