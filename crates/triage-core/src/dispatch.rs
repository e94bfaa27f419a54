use crate::browser::Browser;
use crate::error::{Result, TriageError};
use crate::notification::NotificationRef;
use crate::quota::Quota;
use crate::render::Listing;
use crate::resolver::Resolved;
use crate::rules::{Category, Rules};
use github_client::Api;
use std::sync::Arc;

/// What happened to one notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub opened: bool,
    pub marked_read: bool,
    /// Set when the `list` rule fired; rendered later in feed order.
    pub listing: Option<Listing>,
}

/// Applies the open, read and list rules to resolved notifications.
///
/// A category fires only when it has quota left, its condition matches and
/// the quota unit is won. Opening takes priority over marking read; listing
/// is independent of both. A unit spent on an open or mark-read that fails
/// is refunded before the error is returned.
pub struct Dispatcher {
    api: Arc<dyn Api>,
    browser: Arc<dyn Browser>,
    rules: Arc<Rules>,
    quota: Arc<Quota>,
}

impl Dispatcher {
    pub fn new(
        api: Arc<dyn Api>,
        browser: Arc<dyn Browser>,
        rules: Arc<Rules>,
        quota: Arc<Quota>,
    ) -> Self {
        Self {
            api,
            browser,
            rules,
            quota,
        }
    }

    pub fn quota(&self) -> &Quota {
        &self.quota
    }

    pub async fn dispatch(&self, n: &NotificationRef, resolved: &Resolved) -> Result<Outcome> {
        let mut outcome = Outcome::default();
        if self.quota.exhausted() {
            return Ok(outcome);
        }

        if self.fires(Category::Open, resolved) {
            self.open(&resolved.display_url)
                .await
                .inspect_err(|_| self.quota.refund(Category::Open))?;
            tracing::info!(url = %resolved.display_url, "opened in browser");
            outcome.opened = true;
        }

        if !outcome.opened && self.fires(Category::Read, resolved) {
            self.api
                .mark_thread_read(&n.thread_id)
                .await
                .inspect_err(|_| self.quota.refund(Category::Read))?;
            tracing::info!(
                repo = %n.full_name(),
                number = resolved.attributes.number,
                title = %n.title,
                "marked as read"
            );
            outcome.marked_read = true;
        }

        if self.fires(Category::List, resolved) {
            outcome.listing = Some(Listing::new(n, resolved));
        }

        Ok(outcome)
    }

    fn fires(&self, category: Category, resolved: &Resolved) -> bool {
        self.quota.has_remaining(category)
            && self.rules.get(category).matches(&resolved.attributes)
            && self.quota.try_consume(category)
    }

    async fn open(&self, url: &str) -> Result<()> {
        let browser = Arc::clone(&self.browser);
        let target = url.to_string();
        tokio::task::spawn_blocking(move || browser.open(&target))
            .await
            .map_err(|e| TriageError::Browser {
                url: url.to_string(),
                source: std::io::Error::other(e),
            })?
            .map_err(|source| TriageError::Browser {
                url: url.to_string(),
                source,
            })
    }
}
