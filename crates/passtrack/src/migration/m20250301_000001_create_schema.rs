//! Initial migration to create the passtrack database schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_mapsets(manager).await?;
        self.create_beatmaps(manager).await?;
        self.create_users(manager).await?;
        self.create_update_tasks(manager).await?;
        self.create_completions(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Completions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UpdateTasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Beatmaps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Mapsets::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_mapsets(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Mapsets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Mapsets::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Mapsets::Status).string().not_null())
                    .col(ColumnDef::new(Mapsets::Title).string().not_null())
                    .col(ColumnDef::new(Mapsets::Artist).string().not_null())
                    .col(ColumnDef::new(Mapsets::RecencyMs).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_mapsets_recency")
                    .table(Mapsets::Table)
                    .col(Mapsets::RecencyMs)
                    .to_owned(),
            )
            .await
    }

    async fn create_beatmaps(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Beatmaps::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Beatmaps::Id).big_integer().not_null())
                    .col(ColumnDef::new(Beatmaps::Ruleset).string().not_null())
                    .col(ColumnDef::new(Beatmaps::MapsetId).big_integer().not_null())
                    .col(ColumnDef::new(Beatmaps::Status).string().not_null())
                    .col(ColumnDef::new(Beatmaps::Version).string().not_null())
                    .col(ColumnDef::new(Beatmaps::StarRating).double().not_null())
                    .col(
                        ColumnDef::new(Beatmaps::IsConvert)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    // Converts share the original chart's id; the ruleset
                    // disambiguates.
                    .primary_key(Index::create().col(Beatmaps::Id).col(Beatmaps::Ruleset))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_beatmaps_mapset")
                            .from(Beatmaps::Table, Beatmaps::MapsetId)
                            .to(Mapsets::Table, Mapsets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_beatmaps_mapset_id")
                    .table(Beatmaps::Table)
                    .col(Beatmaps::MapsetId)
                    .to_owned(),
            )
            .await
    }

    async fn create_users(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::AvatarUrl).text().not_null())
                    .col(ColumnDef::new(Users::BannerUrl).text().not_null())
                    .col(ColumnDef::new(Users::Ruleset).string().not_null())
                    .col(
                        ColumnDef::new(Users::LastScoreUpdate)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // Staleness scans filter and order on last_score_update.
        manager
            .create_index(
                Index::create()
                    .name("idx_users_last_score_update")
                    .table(Users::Table)
                    .col(Users::LastScoreUpdate)
                    .to_owned(),
            )
            .await
    }

    async fn create_update_tasks(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UpdateTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UpdateTasks::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UpdateTasks::TimeQueued)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UpdateTasks::CountNewCompletions)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UpdateTasks::LastMapsetId)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UpdateTasks::PercentComplete)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .to_owned(),
            )
            .await?;

        // Claims always take the minimum time_queued.
        manager
            .create_index(
                Index::create()
                    .name("idx_update_tasks_time_queued")
                    .table(UpdateTasks::Table)
                    .col(UpdateTasks::TimeQueued)
                    .to_owned(),
            )
            .await
    }

    async fn create_completions(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Completions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Completions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Completions::BeatmapId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Completions::Ruleset).string().not_null())
                    .col(
                        ColumnDef::new(Completions::MapsetId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Completions::Status).string().not_null())
                    .col(
                        ColumnDef::new(Completions::IsConvert)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .primary_key(
                        Index::create()
                            .col(Completions::UserId)
                            .col(Completions::BeatmapId)
                            .col(Completions::Ruleset),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_completions_user_id")
                    .table(Completions::Table)
                    .col(Completions::UserId)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Mapsets {
    Table,
    Id,
    Status,
    Title,
    Artist,
    RecencyMs,
}

#[derive(DeriveIden)]
enum Beatmaps {
    Table,
    Id,
    MapsetId,
    Status,
    Version,
    Ruleset,
    StarRating,
    IsConvert,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    AvatarUrl,
    BannerUrl,
    Ruleset,
    LastScoreUpdate,
}

#[derive(DeriveIden)]
enum UpdateTasks {
    Table,
    UserId,
    TimeQueued,
    CountNewCompletions,
    LastMapsetId,
    PercentComplete,
}

#[derive(DeriveIden)]
enum Completions {
    Table,
    UserId,
    BeatmapId,
    Ruleset,
    MapsetId,
    Status,
    IsConvert,
}
