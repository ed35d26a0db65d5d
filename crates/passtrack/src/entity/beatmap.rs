//! Beatmap entity - one playable difficulty of a mapset.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::ruleset::Ruleset;

/// A mirrored beatmap, including derived "convert" renditions for rulesets
/// other than the one it was charted in. Written in the same transaction as
/// its owning mapset.
///
/// Converts reuse the original chart's external id, so the primary key is
/// (id, ruleset) rather than id alone.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "beatmaps")]
pub struct Model {
    /// External id assigned by the remote service. Shared between an
    /// original chart and its converts.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub ruleset: Ruleset,
    /// Owning mapset.
    pub mapset_id: i64,
    /// Lifecycle status, carried verbatim from the remote service.
    pub status: String,
    /// Difficulty display label.
    pub version: String,
    pub star_rating: f64,
    /// Whether this is a derived/converted rendition rather than an original chart.
    pub is_convert: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mapset::Entity",
        from = "Column::MapsetId",
        to = "super::mapset::Column::Id"
    )]
    Mapset,
}

impl Related<super::mapset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mapset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
