//! SeaORM entity definitions for the feeder bookkeeping schema.

pub mod failure_category;
pub mod feeder_org;
pub mod feeder_repo;
pub mod outcome_status;
pub mod prelude;
