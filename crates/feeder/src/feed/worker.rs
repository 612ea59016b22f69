//! The per-repository pipeline run by each worker.
//!
//! A worker pulls items off the shared queue one at a time and drives each
//! through clone, destination repository creation, remote registration and
//! push. It alone translates the outcome into a bookkeeping record.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use backon::Retryable;
use tokio::sync::{Mutex, mpsc};

use super::progress::{FeedProgress, ProgressCallback, emit};
use super::types::{FeedOptions, WorkerReport};
use crate::error::{Cancelled, FailureCategory, FeedError, StageError};
use crate::gate::Gate;
use crate::ghe::authenticated_remote_url;
use crate::git::SourceControl;
use crate::org::{OrgAllocator, OrgSlot};
use crate::platform::{self, ApiError, ApiRateLimiter, DestinationApi, short_error_message};
use crate::shutdown::Shutdown;
use crate::store::BookkeepingStore;
use crate::work::WorkItem;

/// Receiving end of the work queue, shared by all workers.
pub(crate) type WorkQueue = Arc<Mutex<mpsc::UnboundedReceiver<WorkItem>>>;

/// Handles shared by every worker of one run.
pub(crate) struct Shared {
    pub source: Arc<dyn SourceControl>,
    pub api: Arc<dyn DestinationApi>,
    pub store: Arc<dyn BookkeepingStore>,
    pub limiter: ApiRateLimiter,
    pub clone_gate: Gate,
    pub push_gate: Gate,
    pub options: FeedOptions,
    pub shutdown: Shutdown,
    pub on_progress: Option<ProgressCallback>,
}

impl Shared {
    fn emit(&self, event: FeedProgress) {
        emit(self.on_progress.as_ref(), event);
    }
}

pub(crate) struct Worker {
    index: usize,
    scratch_dir: PathBuf,
    shared: Arc<Shared>,
    allocator: OrgAllocator,
    slot: OrgSlot,
    report: WorkerReport,
}

impl Worker {
    pub(crate) fn new(index: usize, shared: Arc<Shared>) -> Self {
        let options = &shared.options;
        let allocator = match options.org_seed {
            Some(seed) => OrgAllocator::seeded(
                options.org_min_capacity,
                options.org_max_capacity,
                seed.wrapping_add(index as u64),
            ),
            None => OrgAllocator::new(options.org_min_capacity, options.org_max_capacity),
        };

        Self {
            index,
            scratch_dir: options.scratch_dir.join(format!("worker-{index}")),
            slot: OrgSlot::unnamed(options.org_min_capacity.max(1)),
            allocator,
            report: WorkerReport {
                worker: index,
                ..Default::default()
            },
            shared,
        }
    }

    /// Process items until the queue is drained or shutdown fires.
    #[tracing::instrument(skip_all, fields(worker = self.index))]
    pub(crate) async fn run(mut self, queue: WorkQueue) -> WorkerReport {
        self.prepare_scratch().await;
        self.slot = self.open_org().await;

        while let Some(item) = self.next_item(&queue).await {
            let result = self.process(&item).await;
            self.cleanup(&item).await;
            self.finish(&item, result).await;
        }

        tracing::debug!(
            succeeded = self.report.succeeded,
            failed = self.report.failed(),
            cancelled = self.report.cancelled,
            "Worker finished"
        );
        self.shared.emit(FeedProgress::WorkerFinished {
            worker: self.index,
            succeeded: self.report.succeeded,
            failed: self.report.failed(),
            cancelled: self.report.cancelled,
        });
        self.report
    }

    async fn next_item(&self, queue: &WorkQueue) -> Option<WorkItem> {
        self.shared
            .shutdown
            .race(async { queue.lock().await.recv().await })
            .await
            .ok()
            .flatten()
    }

    async fn prepare_scratch(&self) {
        if let Err(e) = remove_dir_if_exists(&self.scratch_dir).await {
            tracing::warn!(path = %self.scratch_dir.display(), error = %e, "Failed to clear scratch directory");
        }
        if let Err(e) = tokio::fs::create_dir_all(&self.scratch_dir).await {
            tracing::error!(path = %self.scratch_dir.display(), error = %e, "Failed to create scratch directory");
        }
    }

    /// Allocate, create and declare a fresh organization.
    ///
    /// Falls back to the default namespace when creation fails.
    async fn open_org(&mut self) -> OrgSlot {
        let (name, capacity) = self.allocator.allocate();
        let admin = self.shared.options.destination.admin.clone();

        let created = self
            .call_api(self.shared.api.create_organization(&name, &admin))
            .await;

        match created {
            Ok(()) => {
                tracing::debug!(org = %name, capacity, "Switching to organization");
                self.shared.emit(FeedProgress::OrgSwitched {
                    worker: self.index,
                    org: name.clone(),
                    capacity,
                });
                if let Err(e) = self.shared.store.declare_organization(&name).await {
                    tracing::debug!(org = %name, error = %e, "Failed to declare organization");
                    self.shared.emit(FeedProgress::BookkeepingError {
                        worker: self.index,
                        subject: name.clone(),
                        error: e.to_string(),
                    });
                }
                self.report.orgs_created += 1;
                OrgSlot::named(name, capacity)
            }
            Err(e) => {
                if !e.is_cancelled() {
                    tracing::debug!(org = %name, error = %e, "Failed to create organization, using default namespace");
                    self.shared.emit(FeedProgress::OrgCreateFailed {
                        worker: self.index,
                        org: name,
                        error: short_error_message(&e),
                    });
                }
                OrgSlot::unnamed(capacity)
            }
        }
    }

    /// Run one destination API call under the rate limiter and the API deadline.
    async fn call_api<T>(
        &self,
        call: impl Future<Output = platform::Result<T>>,
    ) -> Result<T, StageError> {
        let shared = &self.shared;
        shared.limiter.wait_or_cancel(&shared.shutdown).await?;

        let timeout = shared.options.api_timeout;
        match shared
            .shutdown
            .race(tokio::time::timeout(timeout, call))
            .await?
        {
            Ok(result) => Ok(result?),
            Err(_) => Err(ApiError::timeout(timeout).into()),
        }
    }

    async fn process(&self, item: &WorkItem) -> Result<(), FeedError> {
        let checkout = self
            .clone_item(item)
            .await
            .map_err(|e| e.in_stage(FailureCategory::Clone))?;

        self.register_remote(item, &checkout)
            .await
            .map_err(|e| e.in_stage(FailureCategory::Api))?;

        self.push_with_retry(item, &checkout)
            .await
            .map_err(|e| e.in_stage(FailureCategory::Push))
    }

    async fn clone_item(&self, item: &WorkItem) -> Result<PathBuf, StageError> {
        let shared = &self.shared;
        let _permit = shared.clone_gate.acquire(&shared.shutdown).await?;

        let owner_dir = self.scratch_dir.join(item.owner());
        tokio::fs::create_dir_all(&owner_dir).await?;

        let checkout = owner_dir.join(item.repo());
        let url = item.source_url(&shared.options.source_base);
        shared
            .shutdown
            .race(
                shared
                    .source
                    .clone_repo(&url, &checkout, shared.options.clone_timeout),
            )
            .await??;

        Ok(checkout)
    }

    async fn register_remote(&self, item: &WorkItem, checkout: &Path) -> Result<(), StageError> {
        let shared = &self.shared;
        let created = self
            .call_api(
                shared
                    .api
                    .create_repository(self.slot.name(), &item.dest_repo_name()),
            )
            .await?;

        let destination = &shared.options.destination;
        let url = authenticated_remote_url(&destination.host, &destination.token, &created.full_name);
        shared
            .shutdown
            .race(
                shared
                    .source
                    .add_remote(checkout, &shared.options.remote_name, &url),
            )
            .await??;

        Ok(())
    }

    /// Push, retrying only the push until the attempt ceiling is reached.
    async fn push_with_retry(&self, item: &WorkItem, checkout: &Path) -> Result<(), StageError> {
        let shared = Arc::clone(&self.shared);
        let attempts = Arc::new(AtomicUsize::new(0));

        let push_once = {
            let shared = Arc::clone(&shared);
            let attempts = Arc::clone(&attempts);
            let checkout = checkout.to_path_buf();
            move || {
                let shared = Arc::clone(&shared);
                let attempts = Arc::clone(&attempts);
                let checkout = checkout.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    let _permit = shared.push_gate.acquire(&shared.shutdown).await?;
                    let options = &shared.options;
                    shared
                        .shutdown
                        .race(shared.source.push(
                            &checkout,
                            &options.remote_name,
                            &options.push_branch,
                            options.clone_timeout,
                        ))
                        .await??;
                    Ok::<(), StageError>(())
                }
            }
        };

        let on_retry = {
            let shared = Arc::clone(&shared);
            let attempts = Arc::clone(&attempts);
            let worker = self.index;
            let key = item.key();
            move |err: &StageError, dur: Duration| {
                let attempt = attempts.load(Ordering::SeqCst);
                tracing::debug!(item = %key, attempt, retry_in = ?dur, error = %err, "Push failed, retrying");
                shared.emit(FeedProgress::PushRetry {
                    worker,
                    item: key.clone(),
                    attempt,
                    retry_after: dur,
                    error: short_error_message(err),
                });
            }
        };

        let retried = push_once
            .retry(shared.options.push_retry.clone().into_backoff())
            .notify(on_retry)
            .when(|e: &StageError| !e.is_cancelled());

        let result = match shared.shutdown.race(retried).await {
            Ok(result) => result,
            Err(Cancelled) => return Err(Cancelled.into()),
        };

        match result {
            Err(_) if shared.shutdown.is_triggered() => Err(Cancelled.into()),
            other => other,
        }
    }

    async fn cleanup(&self, item: &WorkItem) {
        let owner_dir = self.scratch_dir.join(item.owner());
        if let Err(e) = remove_dir_if_exists(&owner_dir).await {
            tracing::debug!(item = %item, path = %owner_dir.display(), error = %e, "Failed to clean up clone");
            self.shared.emit(FeedProgress::CleanupFailed {
                worker: self.index,
                path: owner_dir.display().to_string(),
                error: e.to_string(),
            });
        }
    }

    async fn finish(&mut self, item: &WorkItem, result: Result<(), FeedError>) {
        let key = item.key();
        match result {
            Ok(()) => {
                let org = self.slot.name().map(str::to_string);
                self.record(&key, self.shared.store.record_success(&key, org.as_deref()))
                    .await;
                self.report.succeeded += 1;
                tracing::debug!(item = %key, org = org.as_deref().unwrap_or("<default>"), "Migrated");
                self.shared.emit(FeedProgress::ItemSucceeded {
                    worker: self.index,
                    item: key,
                    org,
                });

                self.slot = self.slot.after_placement();
                if self.slot.is_full() {
                    self.slot = self.open_org().await;
                }
            }
            Err(FeedError::Cancelled) => {
                self.report.cancelled += 1;
                tracing::debug!(item = %key, "Cancelled");
                self.shared.emit(FeedProgress::ItemCancelled {
                    worker: self.index,
                    item: key,
                });
            }
            Err(FeedError::Failed { category, source }) => {
                self.record(&key, self.shared.store.record_failure(&key, category))
                    .await;
                self.report.add_failure(category);
                tracing::debug!(item = %key, %category, error = %source, "Migration failed");
                self.shared.emit(FeedProgress::ItemFailed {
                    worker: self.index,
                    item: key,
                    category,
                    error: short_error_message(&source),
                });
            }
        }
    }

    async fn record(
        &self,
        key: &str,
        write: impl Future<Output = crate::store::Result<()>>,
    ) {
        if let Err(e) = write.await {
            tracing::debug!(item = %key, error = %e, "Failed to record outcome");
            self.shared.emit(FeedProgress::BookkeepingError {
                worker: self.index,
                subject: key.to_string(),
                error: e.to_string(),
            });
        }
    }
}

async fn remove_dir_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remove_dir_if_exists_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        remove_dir_if_exists(&missing).await.unwrap();

        let present = dir.path().join("owner").join("repo");
        std::fs::create_dir_all(&present).unwrap();
        remove_dir_if_exists(&dir.path().join("owner")).await.unwrap();
        assert!(!dir.path().join("owner").exists());
    }
}
