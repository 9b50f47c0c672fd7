//! Panel channel factory for creating test channel binding rows.

use crate::factory::helpers::next_id;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};

/// Factory for creating test panel channel bindings with customizable fields.
pub struct PanelChannelFactory<'a> {
    db: &'a DatabaseConnection,
    guild_id: String,
    panel_key: String,
    channel_id: String,
}

impl<'a> PanelChannelFactory<'a> {
    /// Creates a new PanelChannelFactory with default values.
    ///
    /// Defaults:
    /// - guild_id: `"guild_{id}"` where id is auto-incremented
    /// - panel_key: `"eventpanel"`
    /// - channel_id: `"channel_{id}"`
    pub fn new(db: &'a DatabaseConnection) -> Self {
        let id = next_id();
        Self {
            db,
            guild_id: format!("guild_{}", id),
            panel_key: "eventpanel".to_string(),
            channel_id: format!("channel_{}", id),
        }
    }

    pub fn guild_id(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = guild_id.into();
        self
    }

    pub fn panel_key(mut self, panel_key: impl Into<String>) -> Self {
        self.panel_key = panel_key.into();
        self
    }

    pub fn channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = channel_id.into();
        self
    }

    /// Builds and inserts the panel channel row into the database.
    pub async fn build(self) -> Result<entity::panel_channel::Model, DbErr> {
        entity::panel_channel::ActiveModel {
            guild_id: ActiveValue::Set(self.guild_id),
            panel_key: ActiveValue::Set(self.panel_key),
            channel_id: ActiveValue::Set(self.channel_id),
            updated_at: ActiveValue::Set(Utc::now()),
        }
        .insert(self.db)
        .await
    }
}

/// Creates a panel channel binding with default values.
pub async fn create_panel_channel(
    db: &DatabaseConnection,
) -> Result<entity::panel_channel::Model, DbErr> {
    PanelChannelFactory::new(db).build().await
}
