use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PanelChannel::Table)
                    .if_not_exists()
                    .col(string(PanelChannel::GuildId))
                    .col(string(PanelChannel::PanelKey))
                    .col(string(PanelChannel::ChannelId))
                    .col(
                        timestamp(PanelChannel::UpdatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_panel_channel")
                            .col(PanelChannel::GuildId)
                            .col(PanelChannel::PanelKey),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PanelChannel::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PanelChannel {
    Table,
    GuildId,
    PanelKey,
    ChannelId,
    UpdatedAt,
}
