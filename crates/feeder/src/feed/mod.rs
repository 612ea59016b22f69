//! The migration pipeline.
//!
//! # Module Structure
//!
//! - [`types`] - `FeedOptions`, `FeedSummary`, constants
//! - [`progress`] - `FeedProgress`, `ProgressCallback`, `emit()`
//! - [`stats`] - `FeedStats`, counters folded from progress events
//! - `dispatcher` - `run_feed()`, the worker pool
//! - `worker` - the per-repository pipeline
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use feeder::feed::{Collaborators, FeedOptions, run_feed};
//! use feeder::{GitCli, MemoryStore, Shutdown, ghe::GheClient};
//!
//! let collaborators = Collaborators {
//!     source: Arc::new(GitCli::new()),
//!     api: Arc::new(GheClient::new("https://ghe.example.com/api/v3", &token)?),
//!     store: Arc::new(MemoryStore::new()),
//! };
//! let summary = run_feed(lines, collaborators, FeedOptions::default(), Shutdown::new(), None).await?;
//! println!("{} migrated, {} failed", summary.succeeded, summary.failed());
//! ```

mod dispatcher;
pub mod progress;
pub mod stats;
pub mod types;
mod worker;

pub use dispatcher::{Collaborators, run_feed};
pub use progress::{FeedProgress, ProgressCallback, emit};
pub use stats::{FeedStats, StatsSnapshot, WorkerCounts};
pub use types::{
    API_TIMEOUT, DEFAULT_CLONE_CONCURRENCY, DEFAULT_CLONE_TIMEOUT_SECS, DEFAULT_PUSH_BRANCH,
    DEFAULT_PUSH_CONCURRENCY, DEFAULT_REMOTE_NAME, DEFAULT_SOURCE_BASE, DEFAULT_WORKERS,
    Destination, FeedOptions, FeedSummary, WorkerReport,
};
