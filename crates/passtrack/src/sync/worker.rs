//! User synchronization worker: drain the queue one user at a time.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::store::{ProfileUpdate, completions, queue, users};

use super::{
    Lifecycle, RECENT_WINDOW_MS, Result, SyncContext, WORKER_CYCLE_DELAY, WORKER_IDLE_DELAY,
    now_ms, recent, rescan,
};

/// Outcome of one claim cycle, which determines the next delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerTick {
    /// Queue was empty; poll again soon.
    Idle,
    /// A claim was processed (fully or partially).
    Worked,
}

/// Run the worker until the engine drains. Errors from a claim cycle are
/// logged and leave the queue entry intact for the next tick; the loop always
/// re-arms.
pub async fn run(ctx: Arc<SyncContext>, lifecycle: Lifecycle) {
    loop {
        if !lifecycle.is_running() {
            break;
        }
        let delay = match tick(&ctx, &lifecycle).await {
            Ok(WorkerTick::Idle) => WORKER_IDLE_DELAY,
            Ok(WorkerTick::Worked) => WORKER_CYCLE_DELAY,
            Err(error) => {
                error!(%error, "error while updating user data");
                WORKER_CYCLE_DELAY
            }
        };
        if !lifecycle.pause(delay).await {
            break;
        }
    }
    debug!("user sync worker stopped");
}

/// One claim cycle of the worker state machine.
///
/// Claims the oldest queue entry, refreshes the user's profile, then runs one
/// sync strategy: incremental if the user was synced within the last 24
/// hours, otherwise the resumable full rescan (a never-synced user has
/// `last_score_update = 0` and always rescans). The entry is deleted by the
/// strategy itself, and only on full completion.
pub async fn tick(ctx: &SyncContext, lifecycle: &Lifecycle) -> Result<WorkerTick> {
    let Some(task) = queue::claim_oldest(&ctx.db).await? else {
        return Ok(WorkerTick::Idle);
    };

    ctx.limiter.wait().await;
    let profile = ctx.api.get_user(task.user_id).await?;
    let (user, inserted) = users::upsert_profile(
        &ctx.db,
        ProfileUpdate {
            id: profile.id,
            name: profile.username,
            avatar_url: profile.avatar_url,
            banner_url: profile.cover.url.unwrap_or_default(),
            ruleset: profile.playmode,
        },
    )
    .await?;
    if inserted {
        info!(user_id = user.id, "stored user data for {}", user.name);
    } else {
        info!(user_id = user.id, "updated stored user data for {}", user.name);
    }

    if now_ms() - user.last_score_update < RECENT_WINDOW_MS {
        recent::sync_recent(ctx, &user).await?;
    } else {
        rescan::run_rescan(ctx, lifecycle, &user, task).await?;
    }

    let total = completions::count_for_user(&ctx.db, user.id).await?;
    info!("now storing {} map completions for {}", total, user.name);
    Ok(WorkerTick::Worked)
}
