use crate::profile::Profile;
use crate::rules::Category;
use std::sync::atomic::{AtomicI64, Ordering};

/// Per-run action budget: one counter per category, shared by every worker
/// of the run.
///
/// Counters go down one unit per successful [`try_consume`] and never below
/// zero. A unit comes back through [`refund`] only when the action it paid
/// for failed.
///
/// [`try_consume`]: Quota::try_consume
/// [`refund`]: Quota::refund
#[derive(Debug)]
pub struct Quota {
    open: AtomicI64,
    read: AtomicI64,
    list: AtomicI64,
}

impl Quota {
    /// Negative maxima are treated as zero.
    pub fn new(open: i64, read: i64, list: i64) -> Self {
        Self {
            open: AtomicI64::new(open.max(0)),
            read: AtomicI64::new(read.max(0)),
            list: AtomicI64::new(list.max(0)),
        }
    }

    pub fn from_profile(profile: &Profile) -> Self {
        Self::new(profile.open.max, profile.read.max, profile.list.max)
    }

    fn cell(&self, category: Category) -> &AtomicI64 {
        match category {
            Category::Open => &self.open,
            Category::Read => &self.read,
            Category::List => &self.list,
        }
    }

    /// Take one unit of `category` if any is left. The check and the
    /// decrement are a single atomic step.
    pub fn try_consume(&self, category: Category) -> bool {
        self.cell(category)
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n > 0).then_some(n - 1)
            })
            .is_ok()
    }

    /// Return a unit taken by [`try_consume`](Quota::try_consume).
    pub fn refund(&self, category: Category) {
        self.cell(category).fetch_add(1, Ordering::AcqRel);
    }

    pub fn remaining(&self, category: Category) -> i64 {
        self.cell(category).load(Ordering::Acquire)
    }

    pub fn has_remaining(&self, category: Category) -> bool {
        self.remaining(category) > 0
    }

    /// `true` once no category has anything left.
    pub fn exhausted(&self) -> bool {
        Category::ALL.iter().all(|c| !self.has_remaining(*c))
    }
}
