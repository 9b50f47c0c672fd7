use crate::data::live_panel::{LivePanelRecord, LivePanelRepository};
use sea_orm::{DbErr, EntityTrait, PaginatorTrait};
use test_utils::{builder::TestBuilder, factory};

mod all;
mod delete_by_guild;
mod upsert;

fn record(guild_id: &str, game_id: &str) -> LivePanelRecord {
    LivePanelRecord {
        guild_id: guild_id.to_string(),
        game_id: game_id.to_string(),
        event_key: "killstreak".to_string(),
        channel_id: "c1".to_string(),
        message_id: "m1".to_string(),
        started_at: None,
        time_limit_seconds: None,
    }
}
