//! Active lobby bookkeeping.
//!
//! One lobby may be active per guild at a time. The registry is owned by
//! `AppContext` and handed to whoever needs it instead of living in module
//! globals.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, GuildId, UserId};

use crate::game::client::GameInfo;

/// A private event lobby the bot created and currently occupies.
#[derive(Clone, Debug)]
pub struct Lobby {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub created_by: UserId,
    pub event_key: String,
    pub game: GameInfo,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Registry {
    by_guild: HashMap<GuildId, Arc<Lobby>>,
    by_game: HashMap<String, Arc<Lobby>>,
}

/// Registry of active lobbies, one per guild.
#[derive(Default)]
pub struct LobbyRegistry {
    inner: Mutex<Registry>,
}

impl LobbyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a lobby as the guild's active one, evicting any previous
    /// entry for that guild.
    pub fn set_active(&self, lobby: Lobby) -> Arc<Lobby> {
        let lobby = Arc::new(lobby);
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(prev) = inner.by_guild.insert(lobby.guild_id, Arc::clone(&lobby)) {
            inner.by_game.remove(&prev.game.id);
        }
        inner.by_game.insert(lobby.game.id.clone(), Arc::clone(&lobby));

        lobby
    }

    pub fn active_for_guild(&self, guild_id: GuildId) -> Option<Arc<Lobby>> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.by_guild.get(&guild_id).cloned()
    }

    pub fn active_for_game(&self, game_id: &str) -> Option<Arc<Lobby>> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.by_game.get(game_id).cloned()
    }

    /// Clears the guild's active lobby. Returns the removed entry, if any.
    pub fn clear_for_guild(&self, guild_id: GuildId) -> Option<Arc<Lobby>> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let removed = inner.by_guild.remove(&guild_id);
        if let Some(lobby) = &removed {
            inner.by_game.remove(&lobby.game.id);
        }
        removed
    }

    /// Clears whichever guild currently owns the given game id.
    pub fn clear_for_game(&self, game_id: &str) -> Option<Arc<Lobby>> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let removed = inner.by_game.remove(game_id);
        if let Some(lobby) = &removed {
            inner.by_guild.remove(&lobby.guild_id);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby(guild: u64, game_id: &str) -> Lobby {
        Lobby {
            guild_id: GuildId::new(guild),
            channel_id: ChannelId::new(10),
            created_by: UserId::new(20),
            event_key: "killstreak".to_string(),
            game: GameInfo {
                id: game_id.to_string(),
                code: "abc123".to_string(),
                region: "uscentral".to_string(),
                map: "cluckgrounds".to_string(),
                is_private: true,
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn one_active_lobby_per_guild() {
        let registry = LobbyRegistry::new();

        registry.set_active(lobby(1, "game-a"));
        registry.set_active(lobby(1, "game-b"));

        let active = registry.active_for_guild(GuildId::new(1)).unwrap();
        assert_eq!(active.game.id, "game-b");

        // The evicted lobby is no longer reachable by game id.
        assert!(registry.active_for_game("game-a").is_none());
        assert!(registry.active_for_game("game-b").is_some());
    }

    #[test]
    fn clear_for_guild_removes_both_indexes() {
        let registry = LobbyRegistry::new();
        registry.set_active(lobby(1, "game-a"));

        let removed = registry.clear_for_guild(GuildId::new(1)).unwrap();
        assert_eq!(removed.game.id, "game-a");
        assert!(registry.active_for_guild(GuildId::new(1)).is_none());
        assert!(registry.active_for_game("game-a").is_none());
    }

    #[test]
    fn clear_for_game_removes_guild_entry() {
        let registry = LobbyRegistry::new();
        registry.set_active(lobby(2, "game-x"));

        registry.clear_for_game("game-x");
        assert!(registry.active_for_guild(GuildId::new(2)).is_none());
    }
}
