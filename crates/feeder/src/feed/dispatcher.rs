//! Fan-out of work items to the worker pool.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use super::progress::{FeedProgress, ProgressCallback, emit};
use super::types::{FeedOptions, FeedSummary};
use super::worker::{Shared, Worker};
use crate::gate::Gate;
use crate::git::SourceControl;
use crate::platform::{ApiRateLimiter, DestinationApi};
use crate::shutdown::Shutdown;
use crate::store::{self, BookkeepingStore};
use crate::work::{WorkItem, prepare_tokens};

/// External systems a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn SourceControl>,
    pub api: Arc<dyn DestinationApi>,
    pub store: Arc<dyn BookkeepingStore>,
}

/// Migrate every `owner/repo` line with a pool of workers.
///
/// Lines are normalized and parsed; malformed lines are reported and
/// skipped. With `options.resume`, items that already have a record are
/// skipped too. The rest are queued and drained by up to `options.workers`
/// workers sharing one clone gate, one push gate and one rate limiter.
///
/// Individual item failures never fail the run; they are recorded and
/// counted in the returned summary.
///
/// # Errors
/// Returns a store error only if the resume lookup fails, before any work starts.
#[tracing::instrument(skip_all, fields(workers = options.workers))]
pub async fn run_feed<I, S>(
    lines: I,
    collaborators: Collaborators,
    options: FeedOptions,
    shutdown: Shutdown,
    on_progress: Option<ProgressCallback>,
) -> store::Result<FeedSummary>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut summary = FeedSummary::default();
    let mut items = Vec::new();

    for token in prepare_tokens(lines) {
        match token.parse::<WorkItem>() {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::warn!(line = %e.line, "Skipping malformed input");
                summary.malformed += 1;
                emit(on_progress.as_ref(), FeedProgress::MalformedInput { line: e.line });
            }
        }
    }

    if options.resume {
        let mut pending = Vec::with_capacity(items.len());
        for item in items {
            if collaborators.store.is_recorded(&item.key()).await? {
                summary.skipped += 1;
            } else {
                pending.push(item);
            }
        }
        items = pending;
    }

    summary.queued = items.len();
    let worker_count = options.workers.max(1).min(items.len());
    emit(
        on_progress.as_ref(),
        FeedProgress::WorkQueued {
            queued: summary.queued,
            skipped: summary.skipped,
            malformed: summary.malformed,
            workers: worker_count,
        },
    );
    tracing::info!(
        queued = summary.queued,
        skipped = summary.skipped,
        malformed = summary.malformed,
        workers = worker_count,
        "Starting feed"
    );

    if worker_count == 0 {
        return Ok(summary);
    }

    let (tx, rx) = mpsc::unbounded_channel();
    for item in items {
        // The receiver is alive until the workers are joined below.
        let _ = tx.send(item);
    }
    drop(tx);
    let queue = Arc::new(Mutex::new(rx));

    let shared = Arc::new(Shared {
        source: collaborators.source,
        api: collaborators.api,
        store: collaborators.store,
        limiter: ApiRateLimiter::new(options.api_rps),
        clone_gate: Gate::new("clone", options.clone_concurrency),
        push_gate: Gate::new("push", options.push_concurrency),
        options,
        shutdown,
        on_progress,
    });

    let mut handles = Vec::with_capacity(worker_count);
    for index in 0..worker_count {
        let worker = Worker::new(index, Arc::clone(&shared));
        let queue = Arc::clone(&queue);
        handles.push(tokio::spawn(worker.run(queue)));
    }

    for handle in handles {
        match handle.await {
            Ok(report) => {
                summary.succeeded += report.succeeded;
                summary.clone_failures += report.clone_failures;
                summary.api_failures += report.api_failures;
                summary.push_failures += report.push_failures;
                summary.cancelled += report.cancelled;
                summary.workers.push(report);
            }
            Err(e) => {
                tracing::error!(error = %e, "Worker task panicked");
                summary.crashed_workers += 1;
            }
        }
    }

    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed(),
        cancelled = summary.cancelled,
        "Feed finished"
    );
    Ok(summary)
}
