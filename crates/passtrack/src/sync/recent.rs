//! Incremental sync: fetch a user's recent completions across all rulesets.

use std::collections::HashSet;

use sea_orm::TransactionTrait;
use tracing::info;

use crate::entity::ruleset::Ruleset;
use crate::entity::user;
use crate::store::{StoreError, completions, queue, users};

use super::convert::completion_model;
use super::{Result, SCORE_PAGE_SIZE, SyncContext, now_ms};

/// Sweep the user's recent completions, one ruleset at a time in
/// `sync_order(preferred)`, then commit everything in one transaction that
/// also advances `last_score_update` and deletes the queue entry.
///
/// A short page ends a ruleset; a not-found response means the user has no
/// data for that ruleset and ends it the same way. Any other error aborts the
/// whole pass and leaves the queue entry intact for the next claim cycle.
pub async fn sync_recent(ctx: &SyncContext, user: &user::Model) -> Result<()> {
    info!("fetching recent scores for {}", user.name);

    // last_score_update lands on the time the sweep started, so anything set
    // while we paged is re-observed next cycle rather than skipped.
    let update_time = now_ms();

    let mut pending = Vec::new();
    let mut seen: HashSet<(i64, Ruleset)> = HashSet::new();

    for ruleset in Ruleset::sync_order(user.ruleset) {
        let mut offset = 0usize;
        loop {
            ctx.limiter.wait().await;
            let scores = match ctx
                .api
                .get_user_recent_scores(user.id, ruleset, SCORE_PAGE_SIZE, offset)
                .await
            {
                Ok(scores) => scores,
                Err(error) if error.is_not_found() => Vec::new(),
                Err(error) => return Err(error.into()),
            };
            let fetched = scores.len();

            let mut new_count = 0i64;
            for score in scores {
                let map = score.beatmap;
                if !seen.insert((map.id, map.mode)) {
                    continue;
                }
                if completions::exists(&ctx.db, user.id, map.id, map.mode).await? {
                    continue;
                }
                pending.push(completion_model(user.id, &map));
                new_count += 1;
            }

            if new_count > 0 {
                info!(
                    "found {} new {} map completions for {}",
                    new_count, ruleset, user.name
                );
                // Visible in-progress counter, ahead of the final commit.
                queue::add_new_completions(&ctx.db, user.id, new_count).await?;
            }

            if fetched < SCORE_PAGE_SIZE {
                break;
            }
            offset += fetched;
        }
    }

    let txn = ctx.db.begin().await.map_err(StoreError::from)?;
    completions::insert_ignore_many(&txn, pending).await?;
    users::set_last_score_update(&txn, user.id, update_time).await?;
    queue::complete(&txn, user.id).await?;
    txn.commit().await.map_err(StoreError::from)?;

    info!("completed recent score update for {}", user.name);
    Ok(())
}
