//! Queue admission loop: move stale users into the work queue.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::store::{queue, users};

use super::{ADMISSION_INTERVAL, Lifecycle, Result, STALE_THRESHOLD_MS, SyncContext, now_ms};

/// Run admission until the engine drains. The loop re-arms after a fixed
/// short interval whether or not the scan succeeded.
pub async fn run(ctx: Arc<SyncContext>, lifecycle: Lifecycle) {
    loop {
        if !lifecycle.is_running() {
            break;
        }
        if let Err(error) = admit_once(&ctx).await {
            error!(%error, "error while queuing users for update");
        }
        if !lifecycle.pause(ADMISSION_INTERVAL).await {
            break;
        }
    }
    debug!("queue admission loop stopped");
}

/// One admission scan: enqueue every user whose last sync is older than the
/// staleness threshold and who has no live queue entry, oldest first.
/// Returns how many users were queued.
pub async fn admit_once(ctx: &SyncContext) -> Result<u64> {
    let now = now_ms();
    let cutoff = now - STALE_THRESHOLD_MS;

    let mut queued = 0u64;
    for user in users::find_stale(&ctx.db, cutoff).await? {
        queue::enqueue(&ctx.db, user.id, now).await?;
        info!(user_id = user.id, "queued {} for update", user.name);
        queued += 1;
    }
    Ok(queued)
}
