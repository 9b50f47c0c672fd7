//! Event panel state repository.
//!
//! Each panel message owns one row keyed by its Discord message id. The full
//! `PanelState` lives in the JSON column; the indexed columns are duplicated
//! from it on every save so guild scans stay cheap.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder,
};

use crate::panel::state::PanelState;

/// Repository providing database operations for event panel states.
pub struct EventPanelRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> EventPanelRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Upserts the panel state keyed by its message id.
    ///
    /// States with the placeholder message id "pending" are skipped; they get
    /// saved once the Discord message exists and a real id is known.
    pub async fn save(&self, state: &PanelState) -> Result<(), DbErr> {
        if state.message_id.trim().is_empty() || state.message_id == "pending" {
            return Ok(());
        }

        let blob = serde_json::to_value(state)
            .map_err(|e| DbErr::Custom(format!("panel state serialization failed: {e}")))?;

        let existing = entity::prelude::EventPanelState::find_by_id(state.message_id.clone())
            .one(self.db)
            .await?;

        let active = entity::event_panel_state::ActiveModel {
            message_id: ActiveValue::Set(state.message_id.clone()),
            guild_id: ActiveValue::Set(state.guild_id.clone()),
            channel_id: ActiveValue::Set(state.channel_id.clone()),
            panel_type: ActiveValue::Set(state.panel_type.as_str().to_string()),
            status: ActiveValue::Set(state.status.as_str().to_string()),
            state: ActiveValue::Set(blob),
            updated_at: ActiveValue::Set(Utc::now()),
        };

        if existing.is_some() {
            active.update(self.db).await?;
        } else {
            active.insert(self.db).await?;
        }

        Ok(())
    }

    /// Loads and hydrates one panel state by message id.
    pub async fn get_by_message_id(&self, message_id: &str) -> Result<Option<PanelState>, DbErr> {
        let row = entity::prelude::EventPanelState::find_by_id(message_id.to_string())
            .one(self.db)
            .await?;

        Ok(row.and_then(|r| decode_state(&r.state)))
    }

    /// All panel states for a guild, newest first. Rows whose JSON no longer
    /// decodes are skipped rather than failing the scan.
    pub async fn get_by_guild(&self, guild_id: &str) -> Result<Vec<PanelState>, DbErr> {
        let rows = entity::prelude::EventPanelState::find()
            .filter(entity::event_panel_state::Column::GuildId.eq(guild_id))
            .order_by_desc(entity::event_panel_state::Column::UpdatedAt)
            .all(self.db)
            .await?;

        Ok(rows.iter().filter_map(|r| decode_state(&r.state)).collect())
    }

    /// Deletes one panel state row. Returns whether a row was removed.
    pub async fn delete_by_message_id(&self, message_id: &str) -> Result<bool, DbErr> {
        let res = entity::prelude::EventPanelState::delete_by_id(message_id.to_string())
            .exec(self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }
}

fn decode_state(raw: &serde_json::Value) -> Option<PanelState> {
    match serde_json::from_value::<PanelState>(raw.clone()) {
        Ok(state) => Some(state.hydrate()),
        Err(e) => {
            tracing::warn!("Dropping undecodable panel state row: {e}");
            None
        }
    }
}
