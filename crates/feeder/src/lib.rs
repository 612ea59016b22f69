//! Feeder - bulk repository migration into GitHub Enterprise.
//!
//! Repositories listed as `owner/repo` lines are cloned from the source
//! host, created on the destination (spread across generated organizations
//! of bounded size), and pushed, by a fixed pool of workers sharing a clone
//! gate, a push gate and an API rate limiter. Every item ends with at most
//! one outcome record in the bookkeeping store.
//!
//! # Features
//!
//! - `migrate` - Enables database migration support. When enabled, you can use
//!   [`connect_and_migrate`] to create the bookkeeping schema on connection.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use feeder::feed::{Collaborators, FeedOptions, run_feed};
//! use feeder::{GitCli, Shutdown, SqlStore, connect_and_migrate, ghe::GheClient};
//!
//! let db = connect_and_migrate("sqlite://feeder.db?mode=rwc").await?;
//! let collaborators = Collaborators {
//!     source: Arc::new(GitCli::new()),
//!     api: Arc::new(GheClient::new("https://ghe.example.com/api/v3", &token)?),
//!     store: Arc::new(SqlStore::new(db)),
//! };
//! let summary = run_feed(lines, collaborators, FeedOptions::default(), Shutdown::new(), None).await?;
//! ```

pub mod db;
pub mod entity;
pub mod error;
pub mod feed;
pub mod gate;
pub mod ghe;
pub mod git;
pub mod org;
pub mod platform;
pub mod retry;
pub mod shutdown;
pub mod store;
pub mod work;

#[cfg(feature = "migrate")]
pub mod migration;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use error::{Cancelled, FeedError, StageError, WorkItemError};
pub use gate::{Gate, GatePermit};
pub use git::{GitCli, GitError, SourceControl};
pub use org::{OrgAllocator, OrgSlot};
pub use platform::{ApiError, ApiRateLimiter, CreatedRepo, DestinationApi, rate_limits};
pub use retry::RetryConfig;
pub use shutdown::Shutdown;
pub use store::{BookkeepingStore, MemoryStore, OutcomeRecord, SqlStore, StoreError, StoreSummary};
pub use work::WorkItem;
