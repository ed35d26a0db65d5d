//! Completion record reads and writes.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

use crate::entity::completion::{self, Entity as Completion};
use crate::entity::ruleset::Ruleset;

use super::errors::{Result, StoreError};

/// Check whether a pass is already recorded for (user, beatmap, ruleset).
pub async fn exists(
    db: &DatabaseConnection,
    user_id: i64,
    beatmap_id: i64,
    ruleset: Ruleset,
) -> Result<bool> {
    let count = Completion::find_by_id((user_id, beatmap_id, ruleset))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Insert a batch of completions, silently skipping any already recorded.
///
/// The composite primary key is the dedup boundary; `ON CONFLICT DO NOTHING`
/// makes re-derivation from either sync strategy idempotent.
pub async fn insert_ignore_many<C: ConnectionTrait>(
    conn: &C,
    models: Vec<completion::ActiveModel>,
) -> Result<()> {
    if models.is_empty() {
        return Ok(());
    }

    Completion::insert_many(models)
        .on_conflict(
            OnConflict::columns([
                completion::Column::UserId,
                completion::Column::BeatmapId,
                completion::Column::Ruleset,
            ])
            .do_nothing()
            .to_owned(),
        )
        .do_nothing()
        .exec(conn)
        .await?;
    Ok(())
}

/// Count all recorded completions for a user.
pub async fn count_for_user(db: &DatabaseConnection, user_id: i64) -> Result<u64> {
    Completion::find()
        .filter(completion::Column::UserId.eq(user_id))
        .count(db)
        .await
        .map_err(StoreError::from)
}
