//! Live panel factory for creating test live stats rows.

use crate::factory::helpers::next_id;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};

/// Factory for creating test live panel rows with customizable fields.
pub struct LivePanelFactory<'a> {
    db: &'a DatabaseConnection,
    guild_id: String,
    game_id: String,
    event_key: String,
    channel_id: String,
    message_id: String,
    time_limit_seconds: Option<i32>,
}

impl<'a> LivePanelFactory<'a> {
    /// Creates a new LivePanelFactory with default values.
    ///
    /// Defaults:
    /// - guild_id: `"guild_{id}"` where id is auto-incremented
    /// - game_id: `"game_{id}"`
    /// - event_key: `"killstreak"`
    /// - channel_id: `"channel_{id}"`
    /// - message_id: `"message_{id}"`
    /// - time_limit_seconds: `None`
    pub fn new(db: &'a DatabaseConnection) -> Self {
        let id = next_id();
        Self {
            db,
            guild_id: format!("guild_{}", id),
            game_id: format!("game_{}", id),
            event_key: "killstreak".to_string(),
            channel_id: format!("channel_{}", id),
            message_id: format!("message_{}", id),
            time_limit_seconds: None,
        }
    }

    pub fn guild_id(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = guild_id.into();
        self
    }

    pub fn game_id(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = game_id.into();
        self
    }

    pub fn event_key(mut self, event_key: impl Into<String>) -> Self {
        self.event_key = event_key.into();
        self
    }

    pub fn time_limit_seconds(mut self, time_limit_seconds: Option<i32>) -> Self {
        self.time_limit_seconds = time_limit_seconds;
        self
    }

    /// Builds and inserts the live panel row into the database.
    pub async fn build(self) -> Result<entity::live_panel::Model, DbErr> {
        entity::live_panel::ActiveModel {
            guild_id: ActiveValue::Set(self.guild_id),
            game_id: ActiveValue::Set(self.game_id),
            event_key: ActiveValue::Set(self.event_key),
            channel_id: ActiveValue::Set(self.channel_id),
            message_id: ActiveValue::Set(self.message_id),
            started_at: ActiveValue::Set(Some(Utc::now())),
            time_limit_seconds: ActiveValue::Set(self.time_limit_seconds),
            updated_at: ActiveValue::Set(Utc::now()),
        }
        .insert(self.db)
        .await
    }
}

/// Creates a live panel row with default values.
pub async fn create_live_panel(
    db: &DatabaseConnection,
) -> Result<entity::live_panel::Model, DbErr> {
    LivePanelFactory::new(db).build().await
}
