//! Full rescan: re-derive a user's entire completion history against the
//! mirrored catalog, resumable via the queue entry's persisted cursor.

use sea_orm::TransactionTrait;
use tracing::info;

use crate::entity::{update_task, user};
use crate::store::{StoreError, catalog, completions, queue, users};

use super::convert::completion_model;
use super::{
    Lifecycle, RESCAN_BATCH_SIZE, RESCAN_PACING_DELAY, Result, SyncContext, THROTTLE_RETRY_DELAY,
    now_ms, retry_on_throttle,
};

/// Walk the catalog in ascending-id batches starting after the entry's
/// cursor, asking the remote which beatmaps in each batch the user passed.
///
/// Each batch commits atomically: new completions, the advanced cursor, the
/// progress percentage and the running counter all land together, so a crash
/// or error between batches resumes exactly where the last commit left off.
/// The queue entry is deleted only when a batch comes back empty, meaning the
/// whole catalog has been covered.
pub async fn run_rescan(
    ctx: &SyncContext,
    lifecycle: &Lifecycle,
    user: &user::Model,
    task: update_task::Model,
) -> Result<()> {
    let total_mapsets = catalog::count_mapsets(&ctx.db).await?;
    let mut cursor = task.last_mapset_id;

    loop {
        let batch = catalog::mapset_ids_after(&ctx.db, cursor, RESCAN_BATCH_SIZE).await?;

        let Some(&batch_end) = batch.last() else {
            // Catalog exhausted: the cycle is complete.
            let txn = ctx.db.begin().await.map_err(StoreError::from)?;
            users::set_last_score_update(&txn, user.id, now_ms()).await?;
            queue::complete(&txn, user.id).await?;
            txn.commit().await.map_err(StoreError::from)?;
            info!("completed full pass history update for {}", user.name);
            return Ok(());
        };

        let covered_before = catalog::count_mapsets_through(&ctx.db, cursor).await?;
        let covered_after = covered_before + batch.len() as u64;
        let percent = if total_mapsets == 0 {
            100.0
        } else {
            covered_after as f64 / total_mapsets as f64 * 100.0
        };
        info!("[{:.2}%] fetching passed maps for {}...", percent, user.name);

        // Idempotent batch fetch: safe to retry for as long as the remote
        // keeps throttling. Other errors abort with the cursor unchanged.
        let passed = retry_on_throttle(THROTTLE_RETRY_DELAY, || async {
            ctx.limiter.wait().await;
            ctx.api.get_passed_beatmaps(user.id, &batch).await
        })
        .await?;

        let mut fresh = Vec::new();
        for map in &passed {
            if completions::exists(&ctx.db, user.id, map.id, map.mode).await? {
                continue;
            }
            fresh.push(completion_model(user.id, map));
        }
        let new_count = fresh.len() as i64;

        let txn = ctx.db.begin().await.map_err(StoreError::from)?;
        completions::insert_ignore_many(&txn, fresh).await?;
        queue::advance_cursor(&txn, user.id, batch_end, percent, new_count).await?;
        txn.commit().await.map_err(StoreError::from)?;

        if new_count > 0 {
            info!(
                "[{:.2}%] found {} new map completions for {}",
                percent, new_count, user.name
            );
        }

        cursor = batch_end;

        // Deliberate pacing between batches; the pause doubles as the drain
        // check so a shutdown mid-rescan stops at a committed batch boundary.
        if !lifecycle.pause(RESCAN_PACING_DELAY).await {
            info!(
                "pausing full pass history update for {} at mapset {}",
                user.name, cursor
            );
            return Ok(());
        }
    }
}
