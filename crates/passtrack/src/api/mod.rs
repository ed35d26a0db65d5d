//! Remote catalog/profile API surface.
//!
//! The engine talks to the remote service exclusively through the [`OsuApi`]
//! trait so the sync loops can be driven against a scripted fake in tests.
//! [`ApiClient`] is the production implementation.

mod client;
mod error;
mod rate_limit;
pub mod types;

pub use client::{ApiClient, ApiCredentials};
pub use error::{ApiError, Result, classify_status};
pub use rate_limit::{ApiRateLimiter, DEFAULT_RPS};

use async_trait::async_trait;

use crate::entity::ruleset::Ruleset;
use types::{BeatmapDetail, MapsetDetail, MapsetSearchPage, Score, UserProfile};

/// The remote operations the synchronization engine depends on.
///
/// Implementations must surface a distinguishable not-found condition
/// ([`ApiError::NotFound`]) and a distinguishable throttling condition
/// ([`ApiError::RateLimited`]); everything else is opaque failure.
#[async_trait]
pub trait OsuApi: Send + Sync {
    /// One page of the catalog, newest first, continuing from `cursor`.
    async fn search_ranked_mapsets(&self, cursor: Option<&str>) -> Result<MapsetSearchPage>;

    /// One mapset in full detail, converts included.
    async fn get_mapset(&self, mapset_id: i64) -> Result<MapsetDetail>;

    /// One user profile by id.
    async fn get_user(&self, user_id: i64) -> Result<UserProfile>;

    /// A page of a user's most recent completions for one ruleset, fails
    /// excluded. `limit`/`offset` paginate within the remote's recent window.
    async fn get_user_recent_scores(
        &self,
        user_id: i64,
        ruleset: Ruleset,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Score>>;

    /// Which beatmaps of the given mapsets the user has passed, converts and
    /// difficulty-reduction mods included.
    async fn get_passed_beatmaps(
        &self,
        user_id: i64,
        mapset_ids: &[i64],
    ) -> Result<Vec<BeatmapDetail>>;
}
