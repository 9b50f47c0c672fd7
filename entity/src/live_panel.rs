use sea_orm::entity::prelude::*;

/// Record of the live stats message a guild currently has running.
///
/// One row per guild. Lets the bot find and resume or clean up a live
/// leaderboard message after a restart.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "live_panel")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: String,
    pub game_id: String,
    pub event_key: String,
    pub channel_id: String,
    pub message_id: String,
    pub started_at: Option<DateTimeUtc>,
    pub time_limit_seconds: Option<i32>,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
