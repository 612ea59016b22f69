//! Pipeline stage in which a work item failed.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Failure taxonomy surfaced per work item.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, DeriveActiveEnum,
    Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum FailureCategory {
    /// Cloning from the source host failed.
    #[sea_orm(string_value = "clone")]
    Clone,
    /// Creating the destination repository or registering its remote failed.
    #[sea_orm(string_value = "api")]
    Api,
    /// Every push attempt failed.
    #[sea_orm(string_value = "push")]
    Push,
}

impl FailureCategory {
    /// Stable label used in logs, metrics and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::Clone => "clone",
            FailureCategory::Api => "api",
            FailureCategory::Push => "push",
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
