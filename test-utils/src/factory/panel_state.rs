//! Event panel state factory for creating test panel rows.

use crate::factory::helpers::next_id;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};

/// Factory for creating test event panel state rows with customizable fields.
///
/// Defaults produce a staff panel in setup status with an empty JSON state blob.
pub struct PanelStateFactory<'a> {
    db: &'a DatabaseConnection,
    message_id: String,
    guild_id: String,
    channel_id: String,
    panel_type: String,
    status: String,
    state: serde_json::Value,
}

impl<'a> PanelStateFactory<'a> {
    /// Creates a new PanelStateFactory with default values.
    ///
    /// Defaults:
    /// - message_id: `"message_{id}"` where id is auto-incremented
    /// - guild_id: `"guild_{id}"`
    /// - channel_id: `"channel_{id}"`
    /// - panel_type: `"staff"`
    /// - status: `"setup"`
    /// - state: `{}`
    pub fn new(db: &'a DatabaseConnection) -> Self {
        let id = next_id();
        Self {
            db,
            message_id: format!("message_{}", id),
            guild_id: format!("guild_{}", id),
            channel_id: format!("channel_{}", id),
            panel_type: "staff".to_string(),
            status: "setup".to_string(),
            state: serde_json::json!({}),
        }
    }

    pub fn message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = message_id.into();
        self
    }

    pub fn guild_id(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = guild_id.into();
        self
    }

    pub fn channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = channel_id.into();
        self
    }

    pub fn panel_type(mut self, panel_type: impl Into<String>) -> Self {
        self.panel_type = panel_type.into();
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn state(mut self, state: serde_json::Value) -> Self {
        self.state = state;
        self
    }

    /// Builds and inserts the panel state row into the database.
    pub async fn build(self) -> Result<entity::event_panel_state::Model, DbErr> {
        entity::event_panel_state::ActiveModel {
            message_id: ActiveValue::Set(self.message_id),
            guild_id: ActiveValue::Set(self.guild_id),
            channel_id: ActiveValue::Set(self.channel_id),
            panel_type: ActiveValue::Set(self.panel_type),
            status: ActiveValue::Set(self.status),
            state: ActiveValue::Set(self.state),
            updated_at: ActiveValue::Set(Utc::now()),
        }
        .insert(self.db)
        .await
    }
}

/// Creates an event panel state row with default values.
///
/// Shorthand for `PanelStateFactory::new(db).build().await`.
pub async fn create_panel_state(
    db: &DatabaseConnection,
) -> Result<entity::event_panel_state::Model, DbErr> {
    PanelStateFactory::new(db).build().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TestBuilder;
    use entity::prelude::*;

    #[tokio::test]
    async fn creates_panel_state_with_defaults() -> Result<(), DbErr> {
        let test = TestBuilder::new()
            .with_table(EventPanelState)
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();

        let panel = create_panel_state(db).await?;

        assert!(!panel.message_id.is_empty());
        assert_eq!(panel.panel_type, "staff");
        assert_eq!(panel.status, "setup");

        Ok(())
    }

    #[tokio::test]
    async fn creates_panel_state_with_custom_values() -> Result<(), DbErr> {
        let test = TestBuilder::new()
            .with_table(EventPanelState)
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();

        let panel = PanelStateFactory::new(db)
            .message_id("111")
            .guild_id("222")
            .status("running")
            .state(serde_json::json!({ "selected_event_key": "killstreak" }))
            .build()
            .await?;

        assert_eq!(panel.message_id, "111");
        assert_eq!(panel.guild_id, "222");
        assert_eq!(panel.status, "running");
        assert_eq!(panel.state["selected_event_key"], "killstreak");

        Ok(())
    }
}
