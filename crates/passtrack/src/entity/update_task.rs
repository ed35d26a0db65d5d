//! UpdateTask entity - the durable work queue.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per user awaiting or undergoing synchronization.
///
/// Existence of a row means the user is queued or actively being processed;
/// deletion is the single signal of "cycle complete". A user has at most one
/// live entry (`user_id` is the primary key).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "update_tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    /// Enqueue time in epoch milliseconds; FIFO ordering key for claims.
    pub time_queued: i64,
    /// Newly discovered completions this cycle, updated as pages are fetched
    /// so in-progress work is visible before the final commit.
    pub count_new_completions: i64,
    /// Resumption cursor for the full rescan: the last mapset id whose batch
    /// was fully persisted. 0 = not started.
    pub last_mapset_id: i64,
    /// Rescan progress, 0.0 to 100.0.
    pub percent_complete: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
