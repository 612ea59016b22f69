//! Terminal status of a work item.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Terminal outcome recorded for a work item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    #[sea_orm(string_value = "succeeded")]
    Succeeded,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeStatus::Succeeded => write!(f, "succeeded"),
            OutcomeStatus::Failed => write!(f, "failed"),
        }
    }
}
