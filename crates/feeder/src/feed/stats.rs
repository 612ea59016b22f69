//! Run counters derived from progress events.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::progress::{FeedProgress, ProgressCallback};
use crate::error::FailureCategory;

/// Per-worker counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerCounts {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// Point-in-time copy of [`FeedStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Items still waiting or in flight.
    pub remaining: i64,
    pub succeeded: usize,
    pub clone_failures: usize,
    pub api_failures: usize,
    pub push_failures: usize,
    pub cancelled: usize,
    pub malformed: usize,
    pub push_retries: usize,
    pub orgs_created: usize,
    pub org_create_failures: usize,
    pub workers: BTreeMap<usize, WorkerCounts>,
}

/// Thread-safe counters fed by [`FeedProgress`] events.
///
/// Wrap another callback with [`FeedStats::observer`] to count events on
/// their way to a reporter.
#[derive(Debug, Default)]
pub struct FeedStats {
    remaining: AtomicI64,
    succeeded: AtomicUsize,
    clone_failures: AtomicUsize,
    api_failures: AtomicUsize,
    push_failures: AtomicUsize,
    cancelled: AtomicUsize,
    malformed: AtomicUsize,
    push_retries: AtomicUsize,
    orgs_created: AtomicUsize,
    org_create_failures: AtomicUsize,
    workers: Mutex<BTreeMap<usize, WorkerCounts>>,
}

impl FeedStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the counters.
    pub fn observe(&self, event: &FeedProgress) {
        match event {
            FeedProgress::WorkQueued { queued, .. } => {
                self.remaining.store(*queued as i64, Ordering::Relaxed);
            }
            FeedProgress::MalformedInput { .. } => {
                self.malformed.fetch_add(1, Ordering::Relaxed);
            }
            FeedProgress::OrgSwitched { .. } => {
                self.orgs_created.fetch_add(1, Ordering::Relaxed);
            }
            FeedProgress::OrgCreateFailed { .. } => {
                self.org_create_failures.fetch_add(1, Ordering::Relaxed);
            }
            FeedProgress::PushRetry { .. } => {
                self.push_retries.fetch_add(1, Ordering::Relaxed);
            }
            FeedProgress::ItemSucceeded { worker, .. } => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                self.finish_item(*worker, |c| c.succeeded += 1);
            }
            FeedProgress::ItemFailed {
                worker, category, ..
            } => {
                let counter = match category {
                    FailureCategory::Clone => &self.clone_failures,
                    FailureCategory::Api => &self.api_failures,
                    FailureCategory::Push => &self.push_failures,
                };
                counter.fetch_add(1, Ordering::Relaxed);
                self.finish_item(*worker, |c| c.failed += 1);
            }
            FeedProgress::ItemCancelled { worker, .. } => {
                self.cancelled.fetch_add(1, Ordering::Relaxed);
                self.finish_item(*worker, |c| c.cancelled += 1);
            }
            FeedProgress::BookkeepingError { .. }
            | FeedProgress::CleanupFailed { .. }
            | FeedProgress::WorkerFinished { .. } => {}
        }
    }

    fn finish_item(&self, worker: usize, bump: impl FnOnce(&mut WorkerCounts)) {
        self.remaining.fetch_sub(1, Ordering::Relaxed);
        let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        let counts = workers.entry(worker).or_default();
        counts.processed += 1;
        bump(counts);
    }

    /// Items not yet finished.
    pub fn remaining(&self) -> i64 {
        self.remaining.load(Ordering::Relaxed)
    }

    /// Copy out all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            remaining: self.remaining(),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            clone_failures: self.clone_failures.load(Ordering::Relaxed),
            api_failures: self.api_failures.load(Ordering::Relaxed),
            push_failures: self.push_failures.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            push_retries: self.push_retries.load(Ordering::Relaxed),
            orgs_created: self.orgs_created.load(Ordering::Relaxed),
            org_create_failures: self.org_create_failures.load(Ordering::Relaxed),
            workers: self
                .workers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        }
    }

    /// Build a callback that counts each event, then forwards it to `next`.
    pub fn observer(self: &Arc<Self>, next: Option<ProgressCallback>) -> ProgressCallback {
        let stats = Arc::clone(self);
        Box::new(move |event| {
            stats.observe(&event);
            if let Some(next) = &next {
                next(event);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(worker: usize) -> String {
        format!("owner/repo{worker}")
    }

    #[test]
    fn counts_outcomes_per_worker_and_category() {
        let stats = FeedStats::new();
        stats.observe(&FeedProgress::WorkQueued {
            queued: 4,
            skipped: 0,
            malformed: 1,
            workers: 2,
        });
        stats.observe(&FeedProgress::ItemSucceeded {
            worker: 0,
            item: item(0),
            org: None,
        });
        stats.observe(&FeedProgress::ItemFailed {
            worker: 1,
            item: item(1),
            category: FailureCategory::Clone,
            error: "boom".to_string(),
        });
        stats.observe(&FeedProgress::ItemFailed {
            worker: 1,
            item: item(1),
            category: FailureCategory::Push,
            error: "boom".to_string(),
        });

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.remaining, 1);
        assert_eq!(snapshot.succeeded, 1);
        assert_eq!(snapshot.clone_failures, 1);
        assert_eq!(snapshot.push_failures, 1);
        assert_eq!(snapshot.api_failures, 0);
        assert_eq!(
            snapshot.workers[&1],
            WorkerCounts {
                processed: 2,
                succeeded: 0,
                failed: 2,
                cancelled: 0,
            }
        );
    }

    #[test]
    fn observer_counts_and_forwards() {
        let stats = Arc::new(FeedStats::new());
        let forwarded = Arc::new(AtomicUsize::new(0));
        let forwarded_capture = Arc::clone(&forwarded);

        let callback = stats.observer(Some(Box::new(move |_| {
            forwarded_capture.fetch_add(1, Ordering::SeqCst);
        })));

        callback(FeedProgress::MalformedInput {
            line: "x".to_string(),
        });
        callback(FeedProgress::ItemCancelled {
            worker: 0,
            item: item(0),
        });

        assert_eq!(forwarded.load(Ordering::SeqCst), 2);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.malformed, 1);
        assert_eq!(snapshot.cancelled, 1);
    }
}
