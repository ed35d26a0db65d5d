//! Catalog discovery loop: mirror newly published mapsets.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::store::catalog;

use super::convert::mapset_models;
use super::{DISCOVERY_INTERVAL, Lifecycle, Result, SyncContext};

/// What one discovery sweep saved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryStats {
    pub new_mapsets: u64,
    pub new_beatmaps: u64,
}

/// Run discovery until the engine drains: one sweep, a long sleep, repeat.
/// A failed sweep is logged and treated as end-of-cycle, never fatal.
pub async fn run(ctx: Arc<SyncContext>, lifecycle: Lifecycle) {
    loop {
        if !lifecycle.is_running() {
            break;
        }
        match discover_once(&ctx).await {
            Ok(stats) => {
                debug!(
                    new_mapsets = stats.new_mapsets,
                    new_beatmaps = stats.new_beatmaps,
                    "discovery sweep finished"
                );
            }
            Err(error) => error!(%error, "error while fetching beatmaps"),
        }
        if !lifecycle.pause(DISCOVERY_INTERVAL).await {
            break;
        }
    }
    debug!("catalog discovery loop stopped");
}

/// One discovery sweep.
///
/// Pages the remote catalog newest-first. An already-known mapset is the
/// discovery boundary: everything after it is older and already mirrored, so
/// the sweep stops (unless force-full backfill mode is on, in which case
/// known items are skipped and paging continues). Unknown mapsets are
/// re-fetched in full detail, because the search listing omits converts, and
/// saved atomically with all their beatmaps.
pub async fn discover_once(ctx: &SyncContext) -> Result<DiscoveryStats> {
    let mut stats = DiscoveryStats::default();
    let mut cursor: Option<String> = None;

    loop {
        ctx.limiter.wait().await;
        let page = ctx.api.search_ranked_mapsets(cursor.as_deref()).await?;
        cursor = page.cursor_string.clone();

        let mut found_existing = false;
        let mut newly_saved = 0u64;
        for summary in &page.beatmapsets {
            if catalog::mapset_exists(&ctx.db, summary.id).await? {
                if ctx.force_full_discovery {
                    continue;
                }
                found_existing = true;
                break;
            }

            ctx.limiter.wait().await;
            let detail = ctx.api.get_mapset(summary.id).await?;
            let (mapset, beatmaps) = mapset_models(&detail);
            stats.new_beatmaps += beatmaps.len() as u64;
            catalog::save_mapset(&ctx.db, mapset, beatmaps).await?;
            stats.new_mapsets += 1;
            newly_saved += 1;
        }

        if newly_saved > 0 {
            let mapset_total = catalog::count_mapsets(&ctx.db).await?;
            let beatmap_total = catalog::count_beatmaps(&ctx.db).await?;
            info!(
                "now storing data for {} mapsets and {} beatmaps",
                mapset_total, beatmap_total
            );
        }

        if cursor.is_none() || page.beatmapsets.is_empty() || found_existing {
            info!("beatmap mirror is up to date");
            return Ok(stats);
        }
    }
}
