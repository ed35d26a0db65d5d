//! TrackedUser entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::ruleset::Ruleset;

/// A user whose completion history is mirrored. Created on first sighting,
/// refreshed by the worker on every claim, never deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// External id assigned by the remote service.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub name: String,
    pub avatar_url: String,
    pub banner_url: String,
    /// Preferred ruleset; drives the incremental sync's discipline order.
    pub ruleset: Ruleset,
    /// Epoch milliseconds of the last completed sync cycle. 0 = never synced.
    pub last_score_update: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
