//! Live leaderboard message repository.
//!
//! One row per guild recording which live stats message is currently
//! running, so a restarted bot can find and clean it up.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr, EntityTrait, ModelTrait};

/// A guild's live stats message record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LivePanelRecord {
    pub guild_id: String,
    pub game_id: String,
    pub event_key: String,
    pub channel_id: String,
    pub message_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub time_limit_seconds: Option<u32>,
}

impl LivePanelRecord {
    fn from_entity(row: entity::live_panel::Model) -> Self {
        Self {
            guild_id: row.guild_id,
            game_id: row.game_id,
            event_key: row.event_key,
            channel_id: row.channel_id,
            message_id: row.message_id,
            started_at: row.started_at,
            time_limit_seconds: row.time_limit_seconds.map(|v| v.max(0) as u32),
        }
    }
}

/// Repository providing database operations for live panel records.
pub struct LivePanelRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> LivePanelRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records the guild's live panel, replacing any previous one.
    pub async fn upsert(&self, record: &LivePanelRecord) -> Result<(), DbErr> {
        let existing = entity::prelude::LivePanel::find_by_id(record.guild_id.clone())
            .one(self.db)
            .await?;

        let active = entity::live_panel::ActiveModel {
            guild_id: ActiveValue::Set(record.guild_id.clone()),
            game_id: ActiveValue::Set(record.game_id.clone()),
            event_key: ActiveValue::Set(record.event_key.clone()),
            channel_id: ActiveValue::Set(record.channel_id.clone()),
            message_id: ActiveValue::Set(record.message_id.clone()),
            started_at: ActiveValue::Set(record.started_at),
            time_limit_seconds: ActiveValue::Set(record.time_limit_seconds.map(|v| v as i32)),
            updated_at: ActiveValue::Set(Utc::now()),
        };

        if existing.is_some() {
            active.update(self.db).await?;
        } else {
            active.insert(self.db).await?;
        }

        Ok(())
    }

    pub async fn get_by_guild(&self, guild_id: &str) -> Result<Option<LivePanelRecord>, DbErr> {
        let row = entity::prelude::LivePanel::find_by_id(guild_id.to_string())
            .one(self.db)
            .await?;
        Ok(row.map(LivePanelRecord::from_entity))
    }

    /// Every recorded live panel, across all guilds. Used at startup to sweep
    /// messages whose refresh timers died with the previous process.
    pub async fn all(&self) -> Result<Vec<LivePanelRecord>, DbErr> {
        let rows = entity::prelude::LivePanel::find().all(self.db).await?;
        Ok(rows.into_iter().map(LivePanelRecord::from_entity).collect())
    }

    /// Removes the guild's live panel record. Returns whether one existed.
    pub async fn delete_by_guild(&self, guild_id: &str) -> Result<bool, DbErr> {
        let Some(row) = entity::prelude::LivePanel::find_by_id(guild_id.to_string())
            .one(self.db)
            .await?
        else {
            return Ok(false);
        };

        row.delete(self.db).await?;
        Ok(true)
    }
}
