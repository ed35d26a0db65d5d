//! Mapset entity - one top-level catalog item (a song's set of beatmaps).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A mirrored beatmapset. Identity is the remote service's id; rows are
/// replaced atomically by discovery and never deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mapsets")]
pub struct Model {
    /// External id assigned by the remote service.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Lifecycle status (ranked, loved, graveyard, ...). Opaque to the engine.
    pub status: String,
    pub title: String,
    pub artist: String,
    /// Ranked date if present, else submission date, as epoch milliseconds.
    pub recency_ms: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::beatmap::Entity")]
    Beatmap,
}

impl Related<super::beatmap::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Beatmap.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
