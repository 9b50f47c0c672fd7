use sea_orm::entity::prelude::*;

/// Per-guild channel binding for a panel key.
///
/// Maps a panel key ("eventpanel", "eventannounce", "adminpanel") to the
/// Discord channel staff routed it to.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "panel_channel")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub panel_key: String,
    pub channel_id: String,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
