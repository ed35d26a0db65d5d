//! Conversions from remote wire types to entity models.

use std::collections::HashSet;

use sea_orm::Set;

use crate::api::types::{BeatmapDetail, MapsetDetail};
use crate::entity::{beatmap, completion, mapset};

/// Build the active models for a fully-detailed mapset: the mapset row plus
/// one beatmap row per original chart and per convert.
///
/// Originals are listed first and win any (id, ruleset) collision, so a
/// malformed payload cannot demote a real chart to a convert.
pub fn mapset_models(
    detail: &MapsetDetail,
) -> (mapset::ActiveModel, Vec<beatmap::ActiveModel>) {
    let mapset = mapset::ActiveModel {
        id: Set(detail.id),
        status: Set(detail.status.clone()),
        title: Set(detail.title.clone()),
        artist: Set(detail.artist.clone()),
        recency_ms: Set(detail.recency_ms()),
    };

    let mut seen: HashSet<(i64, crate::entity::ruleset::Ruleset)> = HashSet::new();
    let mut beatmaps = Vec::with_capacity(detail.beatmaps.len() + detail.converts.len());
    for map in detail.beatmaps.iter().chain(detail.converts.iter()) {
        if !seen.insert((map.id, map.mode)) {
            continue;
        }
        beatmaps.push(beatmap::ActiveModel {
            id: Set(map.id),
            ruleset: Set(map.mode),
            mapset_id: Set(detail.id),
            status: Set(map.status.clone()),
            version: Set(map.version.clone()),
            star_rating: Set(map.difficulty_rating),
            is_convert: Set(map.convert),
        });
    }

    (mapset, beatmaps)
}

/// Build a completion row for a user's pass of `map` under the map's ruleset.
pub fn completion_model(user_id: i64, map: &BeatmapDetail) -> completion::ActiveModel {
    completion::ActiveModel {
        user_id: Set(user_id),
        beatmap_id: Set(map.id),
        ruleset: Set(map.mode),
        mapset_id: Set(map.beatmapset_id),
        status: Set(map.status.clone()),
        is_convert: Set(map.convert),
    }
}
