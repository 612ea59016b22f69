//! Common re-exports for convenient entity usage.

pub use super::failure_category::FailureCategory;
pub use super::feeder_org::{
    ActiveModel as FeederOrgActiveModel, Column as FeederOrgColumn, Entity as FeederOrg,
    Model as FeederOrgModel,
};
pub use super::feeder_repo::{
    ActiveModel as FeederRepoActiveModel, Column as FeederRepoColumn, Entity as FeederRepo,
    Model as FeederRepoModel,
};
pub use super::outcome_status::OutcomeStatus;
