//! Tracked user reads and writes.

use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entity::ruleset::Ruleset;
use crate::entity::update_task;
use crate::entity::user::{self, Entity as User};

use super::errors::{Result, StoreError};

/// A freshly fetched remote profile, ready to be folded into the users table.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub id: i64,
    pub name: String,
    pub avatar_url: String,
    pub banner_url: String,
    pub ruleset: Ruleset,
}

/// Insert or refresh a user from their remote profile.
///
/// Only profile fields are written; `last_score_update` is owned by the sync
/// strategies and is never touched here (new users start at 0 = never synced).
///
/// Returns the stored model and whether a new row was inserted.
pub async fn upsert_profile(
    db: &DatabaseConnection,
    profile: ProfileUpdate,
) -> Result<(user::Model, bool)> {
    match User::find_by_id(profile.id).one(db).await? {
        Some(existing) => {
            let mut model: user::ActiveModel = existing.into();
            model.name = Set(profile.name);
            model.avatar_url = Set(profile.avatar_url);
            model.banner_url = Set(profile.banner_url);
            model.ruleset = Set(profile.ruleset);
            let updated = model.update(db).await?;
            Ok((updated, false))
        }
        None => {
            let model = user::ActiveModel {
                id: Set(profile.id),
                name: Set(profile.name),
                avatar_url: Set(profile.avatar_url),
                banner_url: Set(profile.banner_url),
                ruleset: Set(profile.ruleset),
                last_score_update: Set(0),
            };
            let inserted = model.insert(db).await?;
            Ok((inserted, true))
        }
    }
}

/// Find a user by id, erroring if absent.
pub async fn get(db: &DatabaseConnection, id: i64) -> Result<user::Model> {
    User::find_by_id(id)
        .one(db)
        .await?
        .ok_or(StoreError::UserNotFound(id))
}

/// Mark a user's sync cycle as complete at `timestamp_ms`. Callers run this
/// inside the same transaction that commits the cycle's completions.
pub async fn set_last_score_update<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    timestamp_ms: i64,
) -> Result<()> {
    use sea_orm::sea_query::Expr;

    User::update_many()
        .col_expr(user::Column::LastScoreUpdate, Expr::value(timestamp_ms))
        .filter(user::Column::Id.eq(user_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Find users overdue for a refresh: `last_score_update` below the cutoff and
/// no live queue entry, oldest first. This ordering is what makes admission
/// fair across batches.
pub async fn find_stale(db: &DatabaseConnection, cutoff_ms: i64) -> Result<Vec<user::Model>> {
    let queued = Query::select()
        .column(update_task::Column::UserId)
        .from(update_task::Entity)
        .to_owned();

    User::find()
        .filter(user::Column::LastScoreUpdate.lt(cutoff_ms))
        .filter(user::Column::Id.not_in_subquery(queued))
        .order_by_asc(user::Column::LastScoreUpdate)
        .all(db)
        .await
        .map_err(StoreError::from)
}
