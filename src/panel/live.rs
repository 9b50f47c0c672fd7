//! Live stats panels: an auto-refreshing leaderboard message per guild.
//!
//! Each guild gets at most one live panel. A tokio task edits the message
//! every five seconds until the event ends or the edit fails (message
//! deleted, channel gone). The registry row in the database lets a restarted
//! bot sweep up messages whose refresh task died with the old process.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, CreateEmbed, CreateMessage, EditMessage, Http, MessageId};
use tokio::task::AbortHandle;

use crate::{
    data::live_panel::{LivePanelRecord, LivePanelRepository},
    error::AppError,
    panel::{catalog::EventKey, view},
    state::AppContext,
};

const REFRESH_SECS: u64 = 5;
const MAX_EDIT_FAILURES: u32 = 5;

/// Identity of a running live panel.
#[derive(Clone, Debug)]
pub struct LivePanelHandle {
    pub game_id: String,
    pub event_key: EventKey,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub started_at: Option<DateTime<Utc>>,
    pub time_limit_seconds: Option<u32>,
}

struct Entry {
    handle: LivePanelHandle,
    abort: AbortHandle,
}

/// In-memory registry of live panels, one per guild.
#[derive(Default)]
pub struct LivePanelRuntime {
    panels: Mutex<HashMap<String, Entry>>,
}

impl LivePanelRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.panels.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, guild_id: &str) -> Option<LivePanelHandle> {
        self.lock().get(guild_id).map(|e| e.handle.clone())
    }

    /// Registers a panel, aborting any refresh task it replaces.
    fn insert(&self, guild_id: &str, handle: LivePanelHandle, abort: AbortHandle) {
        if let Some(old) = self.lock().insert(guild_id.to_string(), Entry { handle, abort }) {
            old.abort.abort();
        }
    }

    /// Deregisters the guild's panel if it is tracking the given game,
    /// aborting its refresh task.
    pub fn take_if_matches(&self, guild_id: &str, game_id: &str) -> Option<LivePanelHandle> {
        let mut panels = self.lock();
        if panels.get(guild_id)?.handle.game_id != game_id {
            return None;
        }
        let entry = panels.remove(guild_id)?;
        entry.abort.abort();
        Some(entry.handle)
    }

    /// Drops the entry from inside its own refresh task after a failed edit.
    /// The task is already finished, so nothing is aborted.
    fn forget_message(&self, guild_id: &str, message_id: MessageId) {
        let mut panels = self.lock();
        if panels
            .get(guild_id)
            .is_some_and(|e| e.handle.message_id == message_id)
        {
            panels.remove(guild_id);
        }
    }
}

/// Result of asking for a live panel.
#[derive(Clone, Debug)]
pub enum LiveStart {
    /// The guild already has a panel for this game and event.
    AlreadyRunning { url: String },
    Created { url: String },
}

fn message_url(guild_id: &str, channel_id: ChannelId, message_id: MessageId) -> String {
    format!("https://discord.com/channels/{guild_id}/{channel_id}/{message_id}")
}

fn build_embed(
    app: &AppContext,
    event_key: EventKey,
    game_id: &str,
    started_at: Option<DateTime<Utc>>,
    time_limit_seconds: Option<u32>,
) -> CreateEmbed {
    match event_key {
        EventKey::Deathmatch => {
            let snap = app.deathmatch.snapshot(game_id, 10);
            view::deathmatch_live_embed(snap.as_ref(), started_at, time_limit_seconds, Utc::now())
        }
        _ => {
            let snap = app.killstreak.snapshot(game_id, 10);
            view::killstreak_live_embed(snap.as_ref())
        }
    }
}

/// Starts a live panel in the given channel, or points at the existing one
/// when the guild already has a panel for this game.
#[allow(clippy::too_many_arguments)]
pub async fn start_or_reuse(
    app: &Arc<AppContext>,
    http: &Arc<Http>,
    guild_id: &str,
    channel_id: ChannelId,
    game_id: &str,
    event_key: EventKey,
    started_at: Option<DateTime<Utc>>,
    time_limit_seconds: Option<u32>,
) -> Result<LiveStart, AppError> {
    if let Some(existing) = app.live_panels.get(guild_id) {
        if existing.game_id == game_id && existing.event_key == event_key {
            return Ok(LiveStart::AlreadyRunning {
                url: message_url(guild_id, existing.channel_id, existing.message_id),
            });
        }
        // A different game replaces the panel outright.
        stop_and_delete_if_matches(app, http, guild_id, &existing.game_id).await;
    }

    let first = build_embed(app, event_key, game_id, started_at, time_limit_seconds);
    let message = channel_id
        .send_message(http, CreateMessage::new().embed(first))
        .await?;

    let handle = LivePanelHandle {
        game_id: game_id.to_string(),
        event_key,
        channel_id,
        message_id: message.id,
        started_at,
        time_limit_seconds,
    };

    let task_app = Arc::clone(app);
    let task_http = Arc::clone(http);
    let task_handle = handle.clone();
    let task_guild = guild_id.to_string();
    let refresh = tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(REFRESH_SECS));
        interval.tick().await;
        let mut failures = 0u32;
        loop {
            interval.tick().await;
            let embed = build_embed(
                &task_app,
                task_handle.event_key,
                &task_handle.game_id,
                task_handle.started_at,
                task_handle.time_limit_seconds,
            );
            let edit = task_handle
                .channel_id
                .edit_message(
                    &task_http,
                    task_handle.message_id,
                    EditMessage::new().embed(embed),
                )
                .await;
            match edit {
                Ok(_) => failures = 0,
                Err(_) if failures + 1 < MAX_EDIT_FAILURES => failures += 1,
                Err(_) => {
                    task_app
                        .live_panels
                        .forget_message(&task_guild, task_handle.message_id);
                    break;
                }
            }
        }
    });

    app.live_panels
        .insert(guild_id, handle.clone(), refresh.abort_handle());

    LivePanelRepository::new(&app.db)
        .upsert(&LivePanelRecord {
            guild_id: guild_id.to_string(),
            game_id: handle.game_id.clone(),
            event_key: handle.event_key.as_str().to_string(),
            channel_id: handle.channel_id.to_string(),
            message_id: handle.message_id.to_string(),
            started_at: handle.started_at,
            time_limit_seconds: handle.time_limit_seconds,
        })
        .await?;

    Ok(LiveStart::Created {
        url: message_url(guild_id, channel_id, message.id),
    })
}

/// Stops and deletes the guild's live panel if it is tracking the given game.
pub async fn stop_and_delete_if_matches(app: &AppContext, http: &Http, guild_id: &str, game_id: &str) {
    let Some(handle) = app.live_panels.take_if_matches(guild_id, game_id) else {
        return;
    };

    if let Err(err) = handle.channel_id.delete_message(http, handle.message_id).await {
        tracing::warn!("Failed to delete live stats message: {err}");
    }

    if let Err(err) = LivePanelRepository::new(&app.db)
        .delete_by_guild(guild_id)
        .await
    {
        tracing::warn!("Failed to clear live panel record: {err}");
    }
}

/// Deletes live panel messages recorded by a previous process. Their refresh
/// tasks are gone, so the messages would otherwise sit frozen forever.
pub async fn sweep_stale_panels(app: &AppContext, http: &Http) -> Result<(), AppError> {
    let repo = LivePanelRepository::new(&app.db);

    for record in repo.all().await? {
        if app.live_panels.get(&record.guild_id).is_some() {
            continue;
        }

        let channel_id = match record.channel_id.parse::<u64>().ok().filter(|&v| v != 0) {
            Some(id) => ChannelId::new(id),
            None => {
                repo.delete_by_guild(&record.guild_id).await?;
                continue;
            }
        };

        if let Some(message_id) = record.message_id.parse::<u64>().ok().filter(|&v| v != 0) {
            if let Err(err) = channel_id.delete_message(http, MessageId::new(message_id)).await {
                tracing::warn!(
                    guild_id = %record.guild_id,
                    "Failed to delete stale live stats message: {err}"
                );
            }
        }

        repo.delete_by_guild(&record.guild_id).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::JoinSet;

    fn handle(game_id: &str, key: EventKey) -> LivePanelHandle {
        LivePanelHandle {
            game_id: game_id.to_string(),
            event_key: key,
            channel_id: ChannelId::new(10),
            message_id: MessageId::new(20),
            started_at: None,
            time_limit_seconds: None,
        }
    }

    async fn parked_abort_handle(set: &mut JoinSet<()>) -> AbortHandle {
        set.spawn(async {
            std::future::pending::<()>().await;
        })
    }

    #[tokio::test]
    async fn take_if_matches_requires_same_game() {
        let runtime = LivePanelRuntime::new();
        let mut set = JoinSet::new();
        let abort = parked_abort_handle(&mut set).await;
        runtime.insert("g1", handle("game-1", EventKey::Killstreak), abort);

        assert!(runtime.take_if_matches("g1", "game-2").is_none());
        assert!(runtime.get("g1").is_some());

        let taken = runtime.take_if_matches("g1", "game-1").unwrap();
        assert_eq!(taken.game_id, "game-1");
        assert!(runtime.get("g1").is_none());
    }

    #[tokio::test]
    async fn insert_replaces_and_aborts_previous_task() {
        let runtime = LivePanelRuntime::new();
        let mut set = JoinSet::new();

        let first = parked_abort_handle(&mut set).await;
        runtime.insert("g1", handle("game-1", EventKey::Killstreak), first);

        let second = parked_abort_handle(&mut set).await;
        runtime.insert("g1", handle("game-2", EventKey::Deathmatch), second);

        // The replaced task finishes as aborted.
        let joined = set.join_next().await.unwrap();
        assert!(joined.unwrap_err().is_cancelled());
        assert_eq!(runtime.get("g1").unwrap().game_id, "game-2");
    }

    #[tokio::test]
    async fn forget_message_only_drops_matching_message() {
        let runtime = LivePanelRuntime::new();
        let mut set = JoinSet::new();
        let abort = parked_abort_handle(&mut set).await;
        runtime.insert("g1", handle("game-1", EventKey::Killstreak), abort);

        runtime.forget_message("g1", MessageId::new(999));
        assert!(runtime.get("g1").is_some());

        runtime.forget_message("g1", MessageId::new(20));
        assert!(runtime.get("g1").is_none());
    }
}
