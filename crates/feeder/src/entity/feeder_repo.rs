//! FeederRepo entity - one terminal outcome per migrated repository.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::failure_category::FailureCategory;
use super::outcome_status::OutcomeStatus;

/// Outcome of migrating one `owner/repo` work item.
///
/// The natural key is the work item itself, which is what makes a second
/// terminal record for the same item impossible.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feeder_repos")]
pub struct Model {
    /// Work item key in `owner/repo` form.
    #[sea_orm(primary_key, auto_increment = false)]
    pub owner_repo: String,

    /// Whether the migration succeeded.
    pub status: OutcomeStatus,

    /// Stage that failed (failures only).
    pub failure_category: Option<FailureCategory>,

    /// Destination organization (successes only; `None` means the default namespace).
    pub organization: Option<String>,

    /// When the outcome was recorded.
    pub recorded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
