//! One triage run: page through unread notifications and fan each page out
//! to concurrent workers.
//!
//! Every notification of a page gets its own task that resolves it and
//! dispatches the resolved attributes. The page is joined before the next one
//! is requested; listings collected by the workers are then written in the
//! order the feed returned them. The run ends at the first empty page.
//!
//! A worker error cancels the rest of its page and ends the run with
//! [`TriageError::Page`]. Actions already taken (opened tabs, threads marked
//! read, listings of finished workers) stay done.

use crate::browser::Browser;
use crate::dispatch::{Dispatcher, Outcome};
use crate::error::{Result, TriageError};
use crate::notification::{NotificationRef, SubjectKind};
use crate::profile::Profile;
use crate::quota::Quota;
use crate::render::Renderer;
use crate::resolver::Resolver;
use crate::rules::Rules;
use github_client::{Api, Notification};
use std::io::Write;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Notifications requested per page.
pub const PAGE_SIZE: u32 = 100;

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub pages: u32,
    pub notifications: usize,
    /// Unsupported subject types.
    pub skipped: usize,
    pub opened: usize,
    pub marked_read: usize,
    pub listed: usize,
}

#[derive(Debug, Clone)]
enum Processed {
    Skipped,
    Done(Outcome),
}

pub struct Triage {
    api: Arc<dyn Api>,
    browser: Arc<dyn Browser>,
    profile: Profile,
    rules: Arc<Rules>,
    renderer: Renderer,
    out: Box<dyn Write + Send>,
}

impl Triage {
    /// Rules are compiled once here; quotas are fresh for every [`run`].
    ///
    /// [`run`]: Triage::run
    pub fn new(
        profile: Profile,
        api: Arc<dyn Api>,
        browser: Arc<dyn Browser>,
        renderer: Renderer,
        out: Box<dyn Write + Send>,
    ) -> Self {
        let rules = Arc::new(Rules::compile(&profile));
        Self {
            api,
            browser,
            profile,
            rules,
            renderer,
            out,
        }
    }

    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<Summary> {
        let quota = Arc::new(Quota::from_profile(&self.profile));
        let resolver = Arc::new(Resolver::new(Arc::clone(&self.api)));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&self.api),
            Arc::clone(&self.browser),
            Arc::clone(&self.rules),
            quota,
        ));

        let mut summary = Summary::default();
        let mut page = 1u32;
        loop {
            let notifications = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TriageError::Cancelled),
                listed = self.api.list_notifications(page, PAGE_SIZE) => listed?,
            };
            if notifications.is_empty() {
                break;
            }
            tracing::debug!(page, count = notifications.len(), "processing page");
            summary.pages += 1;
            summary.notifications += notifications.len();

            self.process_page(page, notifications, &resolver, &dispatcher, cancel, &mut summary)
                .await?;
            page += 1;
        }

        tracing::debug!(
            pages = summary.pages,
            notifications = summary.notifications,
            opened = summary.opened,
            marked_read = summary.marked_read,
            listed = summary.listed,
            "triage finished"
        );
        Ok(summary)
    }

    async fn process_page(
        &mut self,
        page: u32,
        notifications: Vec<Notification>,
        resolver: &Arc<Resolver>,
        dispatcher: &Arc<Dispatcher>,
        cancel: &CancellationToken,
        summary: &mut Summary,
    ) -> Result<()> {
        let page_token = cancel.child_token();
        let mut results: Vec<Option<Processed>> = vec![None; notifications.len()];
        let mut tasks = JoinSet::new();

        for (idx, notification) in notifications.into_iter().enumerate() {
            let n = NotificationRef::from(notification);
            let resolver = Arc::clone(resolver);
            let dispatcher = Arc::clone(dispatcher);
            let token = page_token.clone();
            tasks.spawn(async move {
                let result = tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(TriageError::Cancelled),
                    r = process(&resolver, &dispatcher, &n) => r,
                };
                (idx, result)
            });
        }

        let mut failure: Option<TriageError> = None;
        while let Some(joined) = tasks.join_next().await {
            let err = match joined {
                Ok((idx, Ok(processed))) => {
                    results[idx] = Some(processed);
                    continue;
                }
                Ok((_, Err(e))) => e,
                Err(e) => TriageError::Worker(e.to_string()),
            };
            if err.is_cancelled() {
                continue;
            }
            if failure.is_none() {
                tracing::error!(page, error = %err, "notification failed; cancelling page");
                page_token.cancel();
                failure = Some(err);
            } else {
                tracing::debug!(page, error = %err, "further failure after cancellation");
            }
        }

        self.flush(results.into_iter().flatten(), summary)?;

        if let Some(source) = failure {
            return Err(TriageError::Page {
                page,
                source: Box::new(source),
            });
        }
        if cancel.is_cancelled() {
            return Err(TriageError::Cancelled);
        }
        Ok(())
    }

    /// Tally outcomes and write listings, in feed order.
    fn flush(
        &mut self,
        processed: impl Iterator<Item = Processed>,
        summary: &mut Summary,
    ) -> Result<()> {
        for p in processed {
            let outcome = match p {
                Processed::Skipped => {
                    summary.skipped += 1;
                    continue;
                }
                Processed::Done(outcome) => outcome,
            };
            summary.opened += usize::from(outcome.opened);
            summary.marked_read += usize::from(outcome.marked_read);
            if let Some(listing) = outcome.listing {
                self.renderer
                    .write(&mut *self.out, &listing)
                    .map_err(TriageError::Output)?;
                summary.listed += 1;
            }
        }
        self.out.flush().map_err(TriageError::Output)
    }
}

async fn process(
    resolver: &Resolver,
    dispatcher: &Dispatcher,
    n: &NotificationRef,
) -> Result<Processed> {
    // Nothing left to spend: skip the API round trips. Unknown subjects
    // resolve without any and still count as skipped.
    let unknown = matches!(n.kind, SubjectKind::Unknown(_));
    if !unknown && dispatcher.quota().exhausted() {
        return Ok(Processed::Done(Outcome::default()));
    }
    match resolver.resolve(n).await? {
        None => Ok(Processed::Skipped),
        Some(resolved) => Ok(Processed::Done(dispatcher.dispatch(n, &resolved).await?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Action;
    use crate::testing::{self, FakeApi, FakeBrowser, SharedBuf};
    use std::time::Duration;

    struct Run {
        api: Arc<FakeApi>,
        browser: Arc<FakeBrowser>,
        out: SharedBuf,
        result: Result<Summary>,
    }

    async fn run(profile: Profile, api: FakeApi, browser: FakeBrowser) -> Run {
        let api = Arc::new(api);
        let browser = Arc::new(browser);
        let out = SharedBuf::default();
        let mut triage = Triage::new(
            profile,
            api.clone(),
            browser.clone(),
            Renderer::plain(),
            Box::new(out.clone()),
        );
        let result = triage.run(&CancellationToken::new()).await;
        Run {
            api,
            browser,
            out,
            result,
        }
    }

    fn only(list: Action) -> Profile {
        Profile {
            open: Action::new(0, &[]),
            read: Action::new(0, &[]),
            list,
        }
    }

    #[tokio::test]
    async fn merged_pull_request_is_read_and_listed() {
        let mut api = FakeApi::new("alice");
        api.pages = vec![vec![testing::pull_notification("1001", 7)]];
        api.pulls.insert(7, testing::merged_pull(7));

        let r = run(Profile::default(), api, FakeBrowser::default()).await;
        let summary = r.result.unwrap();
        assert_eq!(summary.marked_read, 1);
        assert_eq!(summary.listed, 1);
        assert_eq!(summary.opened, 0);
        assert_eq!(r.api.called("mark_thread_read"), vec!["1001".to_string()]);
        assert!(r.browser.opened().is_empty());
        assert_eq!(
            r.out.contents(),
            "▬ octo/hello #7\n  title 1001 ( https://github.com/octo/hello/pull/7 )\n"
        );
    }

    #[tokio::test]
    async fn review_request_is_opened() {
        let mut api = FakeApi::new("alice");
        api.pages = vec![vec![testing::pull_notification("1002", 8)]];
        let mut pr = testing::pull(8);
        pr.requested_reviewers = vec![github_client::User { login: "alice".into() }];
        api.pulls.insert(8, pr);

        let r = run(Profile::default(), api, FakeBrowser::default()).await;
        let summary = r.result.unwrap();
        assert_eq!(summary.opened, 1);
        assert_eq!(summary.marked_read, 0);
        assert_eq!(r.browser.opened(), vec!["https://github.com/octo/hello/pull/8".to_string()]);
        assert!(r.api.called("mark_thread_read").is_empty());
    }

    #[tokio::test]
    async fn open_quota_is_shared_across_pages() {
        let mut api = FakeApi::new("alice");
        api.pages = vec![
            (1..=3).map(|i| testing::pull_notification(&i.to_string(), i)).collect(),
            (4..=5).map(|i| testing::pull_notification(&i.to_string(), i)).collect(),
        ];
        for i in 1..=5 {
            let mut pr = testing::pull(i);
            pr.requested_reviewers = vec![github_client::User { login: "alice".into() }];
            api.pulls.insert(i, pr);
        }
        let profile = Profile {
            open: Action::new(2, &[crate::profile::DEFAULT_OPEN_CONDITION]),
            read: Action::new(0, &[]),
            list: Action::new(0, &[]),
        };

        let r = run(profile, api, FakeBrowser::default()).await;
        let summary = r.result.unwrap();
        assert_eq!(summary.pages, 2);
        assert_eq!(summary.notifications, 5);
        assert_eq!(summary.opened, 2);
        assert_eq!(r.browser.opened().len(), 2);
        // Paging stops at the first empty page.
        assert_eq!(
            r.api.called("list_notifications"),
            vec!["1".to_string(), "2".to_string(), "3".to_string()]
        );
    }

    #[tokio::test]
    async fn listing_follows_feed_order() {
        let mut api = FakeApi::new("alice");
        api.pages = vec![(1..=20)
            .map(|i| testing::issue_notification(&format!("t{i}"), i))
            .collect()];
        for i in 1..=20 {
            api.issues.insert(i, testing::issue(i, "open"));
        }

        let r = run(only(Action::new(1000, &["*"])), api, FakeBrowser::default()).await;
        assert_eq!(r.result.unwrap().listed, 20);
        let numbers: Vec<String> = r
            .out
            .contents()
            .lines()
            .filter(|l| l.starts_with('▬'))
            .map(|l| l.rsplit('#').next().unwrap_or_default().to_string())
            .collect();
        let expected: Vec<String> = (1..=20).map(|i| i.to_string()).collect();
        assert_eq!(numbers, expected);
    }

    #[tokio::test]
    async fn list_quota_caps_output() {
        let mut api = FakeApi::new("alice");
        api.pages = vec![(1..=5).map(|i| testing::issue_notification(&i.to_string(), i)).collect()];
        for i in 1..=5 {
            api.issues.insert(i, testing::issue(i, "open"));
        }

        let r = run(only(Action::new(2, &["is_issue"])), api, FakeBrowser::default()).await;
        assert_eq!(r.result.unwrap().listed, 2);
        assert_eq!(r.out.contents().lines().count(), 4);
    }

    #[tokio::test]
    async fn release_is_resolved_without_item_calls() {
        let mut api = FakeApi::new("alice");
        api.pages = vec![vec![testing::notification(
            "r1",
            "Release",
            Some("https://api.github.com/repos/octo/hello/releases/1"),
        )]];

        let r = run(only(Action::new(10, &["is_release"])), api, FakeBrowser::default()).await;
        assert_eq!(r.result.unwrap().listed, 1);
        assert!(r.api.called("get_issue").is_empty());
        assert!(r.api.called("get_pull_request").is_empty());
        assert!(r.api.called("list_reviews").is_empty());
        assert_eq!(
            r.out.contents(),
            "▬ octo/hello\n  title r1 ( https://github.com/octo/hello/releases )\n"
        );
    }

    #[tokio::test]
    async fn unknown_subject_is_skipped() {
        let mut api = FakeApi::new("alice");
        api.pages = vec![vec![testing::notification("d1", "Discussion", None)]];

        let r = run(only(Action::new(10, &["*"])), api, FakeBrowser::default()).await;
        let summary = r.result.unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.listed, 0);
        assert_eq!(r.out.contents(), "");
        assert!(r.api.called("mark_thread_read").is_empty());
    }

    #[tokio::test]
    async fn zero_quotas_do_nothing() {
        let mut api = FakeApi::new("alice");
        api.pages = vec![vec![testing::pull_notification("1", 1)]];
        api.pulls.insert(1, testing::merged_pull(1));
        let profile = Profile {
            open: Action::new(0, &["*"]),
            read: Action::new(0, &["*"]),
            list: Action::new(0, &["*"]),
        };

        let r = run(profile, api, FakeBrowser::default()).await;
        let summary = r.result.unwrap();
        assert_eq!(summary.notifications, 1);
        assert_eq!((summary.opened, summary.marked_read, summary.listed), (0, 0, 0));
        assert_eq!(r.out.contents(), "");
        assert!(r.api.called("get_pull_request").is_empty());
    }

    #[tokio::test]
    async fn unknown_subject_is_skipped_with_quotas_spent() {
        let mut api = FakeApi::new("alice");
        api.pages = vec![vec![
            testing::notification("d1", "Discussion", None),
            testing::pull_notification("1", 1),
        ]];
        api.pulls.insert(1, testing::merged_pull(1));
        let profile = Profile {
            open: Action::new(0, &["*"]),
            read: Action::new(0, &["*"]),
            list: Action::new(0, &["*"]),
        };

        let r = run(profile, api, FakeBrowser::default()).await;
        let summary = r.result.unwrap();
        assert_eq!(summary.notifications, 2);
        assert_eq!(summary.skipped, 1);
        assert!(r.api.called("current_user").is_empty());
        assert!(r.api.called("get_pull_request").is_empty());
    }

    #[tokio::test]
    async fn worker_error_fails_the_page() {
        let mut api = FakeApi::new("alice");
        // Issue 2 is missing, so its worker fails with a 404.
        api.pages = vec![
            vec![
                testing::issue_notification("t1", 1),
                testing::issue_notification("t2", 2),
            ],
            vec![testing::issue_notification("t3", 3)],
        ];
        api.issues.insert(1, testing::issue(1, "open"));
        api.issues.insert(3, testing::issue(3, "open"));

        let r = run(only(Action::new(10, &["*"])), api, FakeBrowser::default()).await;
        let err = r.result.unwrap_err();
        match &err {
            TriageError::Page { page, source } => {
                assert_eq!(*page, 1);
                assert!(matches!(**source, TriageError::Remote(_)), "{source}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(r.api.called("list_notifications"), vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn failure_cancels_hanging_siblings() {
        let mut api = FakeApi::new("alice");
        // Issue 1 is missing; issue 2 never answers.
        api.pages = vec![vec![
            testing::issue_notification("t1", 1),
            testing::issue_notification("t2", 2),
        ]];
        api.hang_issues.insert(2);

        let r = tokio::time::timeout(
            Duration::from_secs(5),
            run(only(Action::new(10, &["*"])), api, FakeBrowser::default()),
        )
        .await
        .expect("page did not finish after a sibling failed");
        match r.result.unwrap_err() {
            TriageError::Page { page, source } => {
                assert_eq!(page, 1);
                assert!(matches!(*source, TriageError::Remote(_)), "{source}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(r.out.contents(), "");
    }

    #[tokio::test]
    async fn cancel_stops_in_flight_page() {
        let mut api = FakeApi::new("alice");
        api.pages = vec![vec![
            testing::issue_notification("t1", 1),
            testing::issue_notification("t2", 2),
        ]];
        api.issues.insert(1, testing::issue(1, "open"));
        api.hang_issues.insert(2);
        let api = Arc::new(api);
        let out = SharedBuf::default();
        let mut triage = Triage::new(
            only(Action::new(10, &["*"])),
            api.clone(),
            Arc::new(FakeBrowser::default()),
            Renderer::plain(),
            Box::new(out.clone()),
        );

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let err = tokio::time::timeout(Duration::from_secs(5), triage.run(&token))
            .await
            .expect("run did not stop after cancellation")
            .unwrap_err();
        assert!(err.is_cancelled(), "{err}");
        // The finished sibling is still flushed.
        assert_eq!(out.contents().lines().count(), 2);
        assert_eq!(api.called("list_notifications"), vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn empty_feed_is_a_no_op() {
        let r = run(Profile::default(), FakeApi::new("alice"), FakeBrowser::default()).await;
        assert_eq!(r.result.unwrap(), Summary::default());
        assert!(r.api.called("current_user").is_empty());
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let api = Arc::new(FakeApi::new("alice"));
        let mut triage = Triage::new(
            Profile::default(),
            api.clone(),
            Arc::new(FakeBrowser::default()),
            Renderer::plain(),
            Box::new(SharedBuf::default()),
        );
        let token = CancellationToken::new();
        token.cancel();
        let err = triage.run(&token).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn quotas_reset_between_runs() {
        let mut api = FakeApi::new("alice");
        api.pages = vec![vec![testing::issue_notification("t1", 1)]];
        api.issues.insert(1, testing::issue(1, "open"));
        let out = SharedBuf::default();
        let mut triage = Triage::new(
            only(Action::new(1, &["*"])),
            Arc::new(api),
            Arc::new(FakeBrowser::default()),
            Renderer::plain(),
            Box::new(out.clone()),
        );
        let token = CancellationToken::new();
        assert_eq!(triage.run(&token).await.unwrap().listed, 1);
        assert_eq!(triage.run(&token).await.unwrap().listed, 1);
        assert_eq!(out.contents().lines().count(), 4);
    }
}
