use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventPanelState::Table)
                    .if_not_exists()
                    .col(string(EventPanelState::MessageId).primary_key())
                    .col(string(EventPanelState::GuildId))
                    .col(string(EventPanelState::ChannelId))
                    .col(string(EventPanelState::PanelType))
                    .col(string(EventPanelState::Status))
                    .col(json_binary(EventPanelState::State))
                    .col(
                        timestamp(EventPanelState::UpdatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_panel_state_guild_id")
                    .table(EventPanelState::Table)
                    .col(EventPanelState::GuildId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventPanelState::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum EventPanelState {
    Table,
    MessageId,
    GuildId,
    ChannelId,
    PanelType,
    Status,
    State,
    UpdatedAt,
}
