//! Completion entity - a user's recorded pass of a beatmap under a ruleset.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::ruleset::Ruleset;

/// Append-only record of one pass. The composite primary key
/// (user, beatmap, ruleset) makes duplicate insertion a no-op, which is what
/// lets both sync strategies re-derive history idempotently.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "completions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub beatmap_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub ruleset: Ruleset,
    /// Owning mapset of the passed beatmap.
    pub mapset_id: i64,
    /// Beatmap status at the time the pass was recorded.
    pub status: String,
    /// Whether the pass was on a converted rendition.
    pub is_convert: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
