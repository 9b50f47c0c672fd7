//! Panel channel bindings repository.
//!
//! One row per (guild, panel key) pair mapping a panel to the channel staff
//! routed it to with `-setpanel`.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, QueryFilter,
};

/// A configured panel-to-channel binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelChannel {
    pub panel_key: String,
    pub channel_id: String,
    pub updated_at: DateTime<Utc>,
}

/// Repository providing database operations for panel channel bindings.
pub struct PanelChannelRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PanelChannelRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Channel id a panel is bound to, if any.
    pub async fn get(&self, guild_id: &str, panel_key: &str) -> Result<Option<String>, DbErr> {
        let row = entity::prelude::PanelChannel::find_by_id((
            guild_id.to_string(),
            panel_key.to_string(),
        ))
        .one(self.db)
        .await?;

        Ok(row.map(|r| r.channel_id))
    }

    /// Binds a panel to a channel, replacing any previous binding.
    pub async fn set(
        &self,
        guild_id: &str,
        panel_key: &str,
        channel_id: &str,
    ) -> Result<(), DbErr> {
        let existing = entity::prelude::PanelChannel::find_by_id((
            guild_id.to_string(),
            panel_key.to_string(),
        ))
        .one(self.db)
        .await?;

        let active = entity::panel_channel::ActiveModel {
            guild_id: ActiveValue::Set(guild_id.to_string()),
            panel_key: ActiveValue::Set(panel_key.to_string()),
            channel_id: ActiveValue::Set(channel_id.to_string()),
            updated_at: ActiveValue::Set(Utc::now()),
        };

        if existing.is_some() {
            active.update(self.db).await?;
        } else {
            active.insert(self.db).await?;
        }

        Ok(())
    }

    /// Removes a binding. Returns whether one existed.
    pub async fn clear(&self, guild_id: &str, panel_key: &str) -> Result<bool, DbErr> {
        let Some(row) = entity::prelude::PanelChannel::find_by_id((
            guild_id.to_string(),
            panel_key.to_string(),
        ))
        .one(self.db)
        .await?
        else {
            return Ok(false);
        };

        row.delete(self.db).await?;
        Ok(true)
    }

    /// All bindings for a guild.
    pub async fn all_for_guild(&self, guild_id: &str) -> Result<Vec<PanelChannel>, DbErr> {
        let rows = entity::prelude::PanelChannel::find()
            .filter(entity::panel_channel::Column::GuildId.eq(guild_id))
            .all(self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| PanelChannel {
                panel_key: r.panel_key,
                channel_id: r.channel_id,
                updated_at: r.updated_at,
            })
            .collect())
    }
}
