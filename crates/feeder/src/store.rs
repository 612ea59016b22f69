//! Bookkeeping store: durable per-item outcomes and declared organizations.
//!
//! Workers are the only writers. Each work item gets at most one terminal
//! record; a second write for the same key is rejected with
//! [`StoreError::AlreadyRecorded`], so concurrent workers can never produce
//! duplicate outcomes.
//!
//! - [`SqlStore`] - SeaORM-backed store used by the CLI
//! - [`MemoryStore`] - in-process store for tests and dry runs

mod memory;
mod sql;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

pub use crate::entity::outcome_status::OutcomeStatus;
use crate::error::FailureCategory;

pub use memory::MemoryStore;
pub use sql::SqlStore;

/// Errors that can occur in the bookkeeping store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// The item already has a terminal record.
    #[error("Outcome already recorded for {key}")]
    AlreadyRecorded { key: String },
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// One terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeRecord {
    /// Work item key (`owner/repo`).
    pub item: String,
    /// Terminal status.
    pub status: OutcomeStatus,
    /// Failed stage, for failures.
    pub category: Option<FailureCategory>,
    /// Destination organization, for successes placed in a named org.
    pub organization: Option<String>,
    /// When the record was written.
    pub recorded_at: DateTime<Utc>,
}

/// Aggregate view of the store, for status reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    /// Items migrated successfully.
    pub succeeded: u64,
    /// Items that failed while cloning.
    pub clone_failures: u64,
    /// Items that failed creating the destination repo or remote.
    pub api_failures: u64,
    /// Items whose push attempts were exhausted.
    pub push_failures: u64,
    /// Organizations declared.
    pub organizations: u64,
}

impl StoreSummary {
    /// Total failed items across categories.
    pub fn failed(&self) -> u64 {
        self.clone_failures + self.api_failures + self.push_failures
    }

    /// Total items with a terminal record.
    pub fn recorded(&self) -> u64 {
        self.succeeded + self.failed()
    }

    fn add_failures(&mut self, category: FailureCategory, count: u64) {
        match category {
            FailureCategory::Clone => self.clone_failures += count,
            FailureCategory::Api => self.api_failures += count,
            FailureCategory::Push => self.push_failures += count,
        }
    }
}

/// Durable ledger consulted and updated by workers.
///
/// Implementations must be safe for concurrent use from many workers.
#[async_trait]
pub trait BookkeepingStore: Send + Sync {
    /// Record that an organization was created at the destination.
    /// Declaring the same name twice is not an error.
    async fn declare_organization(&self, name: &str) -> Result<()>;

    /// Record a successful migration into `org` (`None` = default namespace).
    async fn record_success(&self, item_key: &str, org: Option<&str>) -> Result<()>;

    /// Record a failed migration tagged with the failing stage.
    async fn record_failure(&self, item_key: &str, category: FailureCategory) -> Result<()>;

    /// Whether the item already has a terminal record.
    async fn is_recorded(&self, item_key: &str) -> Result<bool>;

    /// Aggregate counts over all records.
    async fn summary(&self) -> Result<StoreSummary>;
}
