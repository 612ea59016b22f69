//! FeederOrg entity - destination organizations created by workers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A destination organization that was created and declared.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feeder_orgs")]
pub struct Model {
    /// Organization login on the destination.
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,

    /// When the organization was declared.
    pub declared_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
