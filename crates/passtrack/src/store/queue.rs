//! Durable FIFO work queue for user synchronization.
//!
//! One row per user awaiting or undergoing a sync cycle. The worker claims
//! the oldest row, makes progress against it (possibly across several of its
//! own transactions for a resumable rescan), and deletes it only when the
//! chosen strategy fully completes. Crash recovery falls out of that: a
//! surviving row is simply claimed again and resumes from its cursor.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::entity::update_task::{self, Entity as UpdateTask};

use super::errors::{Result, StoreError};

/// Enqueue a user for synchronization at `now_ms`.
///
/// The caller is responsible for not enqueueing a user who already has a live
/// entry (admission filters those out; `user_id` is the primary key so a
/// violation fails loudly rather than double-queueing).
pub async fn enqueue(
    db: &DatabaseConnection,
    user_id: i64,
    now_ms: i64,
) -> Result<update_task::Model> {
    let model = update_task::ActiveModel {
        user_id: Set(user_id),
        time_queued: Set(now_ms),
        count_new_completions: Set(0),
        last_mapset_id: Set(0),
        percent_complete: Set(0.0),
    };
    model.insert(db).await.map_err(StoreError::from)
}

/// Claim the oldest queued entry, or `None` when the queue is empty.
///
/// Single-instance operation is assumed: nothing fences two engines claiming
/// the same row. The user id tiebreak makes claim order deterministic when
/// entries share a `time_queued`.
pub async fn claim_oldest(db: &DatabaseConnection) -> Result<Option<update_task::Model>> {
    UpdateTask::find()
        .order_by_asc(update_task::Column::TimeQueued)
        .order_by_asc(update_task::Column::UserId)
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Look up a user's live entry, if any.
pub async fn find_by_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Option<update_task::Model>> {
    UpdateTask::find_by_id(user_id)
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Bump the entry's running new-completion counter. Called as pages are
/// fetched so in-progress work is visible before the cycle commits.
pub async fn add_new_completions<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    delta: i64,
) -> Result<()> {
    if delta == 0 {
        return Ok(());
    }
    UpdateTask::update_many()
        .col_expr(
            update_task::Column::CountNewCompletions,
            Expr::col(update_task::Column::CountNewCompletions).add(delta),
        )
        .filter(update_task::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Record partial rescan progress: advance the resumption cursor, refresh the
/// progress percentage, and bump the new-completion counter. Runs inside the
/// caller's per-batch transaction so the cursor never gets ahead of the
/// completions it covers.
pub async fn advance_cursor<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    last_mapset_id: i64,
    percent_complete: f64,
    new_completions: i64,
) -> Result<()> {
    UpdateTask::update_many()
        .col_expr(
            update_task::Column::LastMapsetId,
            Expr::value(last_mapset_id),
        )
        .col_expr(
            update_task::Column::PercentComplete,
            Expr::value(percent_complete),
        )
        .col_expr(
            update_task::Column::CountNewCompletions,
            Expr::col(update_task::Column::CountNewCompletions).add(new_completions),
        )
        .filter(update_task::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Delete a user's entry: the single signal of "cycle complete". Callers run
/// this inside the transaction that commits the cycle's final writes.
pub async fn complete<C: ConnectionTrait>(conn: &C, user_id: i64) -> Result<u64> {
    let result = UpdateTask::delete_by_id(user_id).exec(conn).await?;
    Ok(result.rows_affected)
}

/// Number of live entries (waiting or in progress).
pub async fn len(db: &DatabaseConnection) -> Result<u64> {
    UpdateTask::find().count(db).await.map_err(StoreError::from)
}
