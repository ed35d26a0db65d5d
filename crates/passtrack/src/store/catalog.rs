//! Catalog reads and writes: mapsets and their beatmaps.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};

use crate::entity::beatmap::{self, Entity as Beatmap};
use crate::entity::mapset::{self, Entity as Mapset};

use super::errors::{Result, StoreError};

/// Check whether a mapset is already mirrored. This is discovery's stop
/// condition: the remote pages in descending recency, so the first known id
/// marks the boundary of new content.
pub async fn mapset_exists<C: ConnectionTrait>(conn: &C, id: i64) -> Result<bool> {
    let count = Mapset::find_by_id(id).count(conn).await?;
    Ok(count > 0)
}

/// Atomically upsert a mapset together with all of its beatmaps (originals
/// and converts alike). Replace semantics: a re-fetched mapset fully
/// supersedes the stored row and its beatmap rows.
pub async fn save_mapset(
    db: &DatabaseConnection,
    mapset: mapset::ActiveModel,
    beatmaps: Vec<beatmap::ActiveModel>,
) -> Result<()> {
    let txn = db.begin().await?;

    Mapset::insert(mapset)
        .on_conflict(
            OnConflict::column(mapset::Column::Id)
                .update_columns([
                    mapset::Column::Status,
                    mapset::Column::Title,
                    mapset::Column::Artist,
                    mapset::Column::RecencyMs,
                ])
                .to_owned(),
        )
        .exec(&txn)
        .await?;

    if !beatmaps.is_empty() {
        Beatmap::insert_many(beatmaps)
            .on_conflict(
                OnConflict::columns([beatmap::Column::Id, beatmap::Column::Ruleset])
                    .update_columns([
                        beatmap::Column::MapsetId,
                        beatmap::Column::Status,
                        beatmap::Column::Version,
                        beatmap::Column::StarRating,
                        beatmap::Column::IsConvert,
                    ])
                    .to_owned(),
            )
            .exec(&txn)
            .await?;
    }

    txn.commit().await.map_err(StoreError::from)
}

/// Fetch the next batch of mapset ids strictly after `cursor`, ascending.
/// This is the full rescan's resumable pagination over the mirrored catalog.
pub async fn mapset_ids_after(
    db: &DatabaseConnection,
    cursor: i64,
    limit: u64,
) -> Result<Vec<i64>> {
    let ids: Vec<i64> = Mapset::find()
        .select_only()
        .column(mapset::Column::Id)
        .filter(mapset::Column::Id.gt(cursor))
        .order_by_asc(mapset::Column::Id)
        .limit(limit)
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids)
}

/// Count all mirrored mapsets.
pub async fn count_mapsets(db: &DatabaseConnection) -> Result<u64> {
    Mapset::find().count(db).await.map_err(StoreError::from)
}

/// Count mirrored mapsets with id at or below `cursor`. Used to derive the
/// rescan progress percentage.
pub async fn count_mapsets_through(db: &DatabaseConnection, cursor: i64) -> Result<u64> {
    Mapset::find()
        .filter(mapset::Column::Id.lte(cursor))
        .count(db)
        .await
        .map_err(StoreError::from)
}

/// Count all mirrored beatmaps.
pub async fn count_beatmaps(db: &DatabaseConnection) -> Result<u64> {
    Beatmap::find().count(db).await.map_err(StoreError::from)
}
