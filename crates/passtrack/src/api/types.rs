//! Wire types for the remote catalog/profile API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::ruleset::Ruleset;

/// One page of the catalog search, newest first, with an opaque continuation
/// cursor. An absent cursor means the listing is exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsetSearchPage {
    pub cursor_string: Option<String>,
    pub beatmapsets: Vec<MapsetSummary>,
}

/// A mapset as returned by the search listing. The listing omits converts,
/// which is why discovery re-fetches new mapsets in full detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsetSummary {
    pub id: i64,
    pub status: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub ranked_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submitted_date: Option<DateTime<Utc>>,
}

/// A mapset fetched individually, with full beatmap and convert detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsetDetail {
    pub id: i64,
    pub status: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub ranked_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submitted_date: Option<DateTime<Utc>>,
    pub beatmaps: Vec<BeatmapDetail>,
    #[serde(default)]
    pub converts: Vec<BeatmapDetail>,
}

impl MapsetDetail {
    /// The single recency timestamp used for ordering: ranked date if
    /// present, else submission date, as epoch milliseconds.
    #[must_use]
    pub fn recency_ms(&self) -> i64 {
        self.ranked_date
            .or(self.submitted_date)
            .map(|t| t.timestamp_millis())
            .unwrap_or(0)
    }
}

/// One beatmap as seen anywhere in the remote API (mapset detail, score
/// payloads, passed-beatmap batches).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatmapDetail {
    pub id: i64,
    pub beatmapset_id: i64,
    pub status: String,
    #[serde(default)]
    pub version: String,
    pub mode: Ruleset,
    #[serde(default)]
    pub difficulty_rating: f64,
    #[serde(default)]
    pub convert: bool,
}

/// A user profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub avatar_url: String,
    #[serde(default)]
    pub cover: Cover,
    pub playmode: Ruleset,
}

/// Profile cover/banner media.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cover {
    #[serde(default)]
    pub url: Option<String>,
}

/// A recent score. Only the beatmap identity matters to the engine; fails are
/// excluded server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    pub beatmap: BeatmapDetail,
    pub beatmapset: MapsetRef,
}

/// Bare mapset reference embedded in score payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsetRef {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_mapset_detail_recency_prefers_ranked_date() {
        let ranked = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let submitted = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let detail = MapsetDetail {
            id: 1,
            status: "ranked".into(),
            title: "t".into(),
            artist: "a".into(),
            ranked_date: Some(ranked),
            submitted_date: Some(submitted),
            beatmaps: vec![],
            converts: vec![],
        };
        assert_eq!(detail.recency_ms(), ranked.timestamp_millis());

        let detail = MapsetDetail {
            ranked_date: None,
            ..detail
        };
        assert_eq!(detail.recency_ms(), submitted.timestamp_millis());
    }

    #[test]
    fn test_deserialize_mapset_detail() {
        let json = r#"{
            "id": 42,
            "status": "ranked",
            "title": "Song",
            "artist": "Artist",
            "ranked_date": "2024-05-01T12:00:00Z",
            "beatmaps": [
                {"id": 7, "beatmapset_id": 42, "status": "ranked",
                 "version": "Hard", "mode": "osu", "difficulty_rating": 3.4}
            ],
            "converts": [
                {"id": 7, "beatmapset_id": 42, "status": "ranked",
                 "version": "Hard", "mode": "taiko", "difficulty_rating": 3.1,
                 "convert": true}
            ]
        }"#;
        let detail: MapsetDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.beatmaps.len(), 1);
        assert_eq!(detail.converts.len(), 1);
        assert_eq!(detail.beatmaps[0].mode, Ruleset::Osu);
        assert!(detail.converts[0].convert);
        assert!(!detail.beatmaps[0].convert);
    }

    #[test]
    fn test_deserialize_profile_without_cover() {
        let json = r#"{"id": 3, "username": "peppy", "avatar_url": "https://a/3", "playmode": "osu"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.cover.url, None);
        assert_eq!(profile.playmode, Ruleset::Osu);
    }

    #[test]
    fn test_deserialize_search_page_end_of_listing() {
        let json = r#"{"cursor_string": null, "beatmapsets": []}"#;
        let page: MapsetSearchPage = serde_json::from_str(json).unwrap();
        assert!(page.cursor_string.is_none());
        assert!(page.beatmapsets.is_empty());
    }
}
