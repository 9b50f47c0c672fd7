use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LivePanel::Table)
                    .if_not_exists()
                    .col(string(LivePanel::GuildId).primary_key())
                    .col(string(LivePanel::GameId))
                    .col(string(LivePanel::EventKey))
                    .col(string(LivePanel::ChannelId))
                    .col(string(LivePanel::MessageId))
                    .col(timestamp_null(LivePanel::StartedAt))
                    .col(integer_null(LivePanel::TimeLimitSeconds))
                    .col(
                        timestamp(LivePanel::UpdatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LivePanel::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum LivePanel {
    Table,
    GuildId,
    GameId,
    EventKey,
    ChannelId,
    MessageId,
    StartedAt,
    TimeLimitSeconds,
    UpdatedAt,
}
