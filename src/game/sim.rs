//! In-process game client used for development runs and tests.
//!
//! `SimClient` implements the full [`GameClient`] surface against local state.
//! Test hooks (`sim_join`, `sim_kill`, `sim_kill_raw`) inject the external
//! events a real lobby would produce.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex,
};

use rand::{distr::Alphanumeric, Rng};
use serde_json::{json, Value};
use serenity::async_trait;
use tokio::sync::broadcast;

use crate::game::{
    client::{GameClient, GameError, GameInfo, GameMode},
    event::{GameEvent, KillPayload},
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
struct SimState {
    game: Option<GameInfo>,
    players: Vec<String>,
    joined: bool,
    locked: bool,
    chat_log: Vec<String>,
}

/// Deterministic in-process implementation of [`GameClient`].
pub struct SimClient {
    bot_name: String,
    state: Mutex<SimState>,
    events: broadcast::Sender<GameEvent>,
    next_game: AtomicU64,
}

impl SimClient {
    pub fn new(bot_name: &str) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            bot_name: bot_name.to_string(),
            state: Mutex::new(SimState::default()),
            events,
            next_game: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: GameEvent) {
        // Nobody listening is fine; trackers subscribe on arm.
        let _ = self.events.send(event);
    }

    /// Chat lines sent so far, oldest first.
    pub fn chat_log(&self) -> Vec<String> {
        self.lock().chat_log.clone()
    }

    /// Simulates an external player joining the current game.
    pub fn sim_join(&self, name: &str) {
        {
            let mut state = self.lock();
            if state.game.is_none() {
                return;
            }
            if !state.players.iter().any(|p| p.eq_ignore_ascii_case(name)) {
                state.players.push(name.to_string());
            }
        }
        self.emit(GameEvent::PlayerJoin(name.to_string()));
    }

    /// Simulates an external player leaving the current game.
    pub fn sim_leave(&self, name: &str) {
        {
            let mut state = self.lock();
            state.players.retain(|p| !p.eq_ignore_ascii_case(name));
        }
        self.emit(GameEvent::PlayerLeave(name.to_string()));
    }

    /// Simulates a kill feed entry with a plain object payload.
    pub fn sim_kill(&self, killer: &str, victim: &str) {
        self.sim_kill_raw(json!({ "killer": killer, "victim": victim }));
    }

    /// Simulates a kill feed entry with an arbitrary payload shape.
    pub fn sim_kill_raw(&self, payload: Value) {
        self.emit(GameEvent::Kill(KillPayload::Object(payload)));
    }
}

#[async_trait]
impl GameClient for SimClient {
    fn bot_name(&self) -> &str {
        &self.bot_name
    }

    async fn create_private_game(
        &self,
        _mode: GameMode,
        region: &str,
        map: &str,
    ) -> Result<GameInfo, GameError> {
        let seq = self.next_game.fetch_add(1, Ordering::Relaxed);
        let code: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect::<String>()
            .to_lowercase();

        let info = GameInfo {
            id: format!("sim-{seq}"),
            code,
            region: region.to_string(),
            map: map.to_string(),
            is_private: true,
        };

        let mut state = self.lock();
        *state = SimState {
            game: Some(info.clone()),
            ..SimState::default()
        };

        Ok(info)
    }

    async fn join(&self) -> Result<(), GameError> {
        let mut state = self.lock();
        if state.game.is_none() {
            return Err(GameError::NotInGame);
        }
        if !state.joined {
            state.joined = true;
            let name = self.bot_name.clone();
            state.players.push(name);
        }
        Ok(())
    }

    async fn leave(&self) -> Result<(), GameError> {
        let mut state = self.lock();
        *state = SimState::default();
        Ok(())
    }

    async fn send_chat(&self, line: &str) -> Result<(), GameError> {
        let mut state = self.lock();
        if state.game.is_none() {
            return Err(GameError::NotInGame);
        }
        state.chat_log.push(line.to_string());
        Ok(())
    }

    async fn set_locked(&self, locked: bool) -> Result<bool, GameError> {
        let mut state = self.lock();
        if state.game.is_none() {
            return Err(GameError::NotInGame);
        }
        state.locked = locked;
        Ok(state.locked)
    }

    async fn kick_player(&self, name: &str) -> Result<(), GameError> {
        let found = {
            let mut state = self.lock();
            if state.game.is_none() {
                return Err(GameError::NotInGame);
            }
            let before = state.players.len();
            state.players.retain(|p| !p.eq_ignore_ascii_case(name));
            state.players.len() != before
        };

        if !found {
            return Err(GameError::UnknownPlayer(name.to_string()));
        }

        self.emit(GameEvent::PlayerLeave(name.to_string()));
        Ok(())
    }

    fn current_game(&self) -> Option<GameInfo> {
        self.lock().game.clone()
    }

    fn players(&self) -> Vec<String> {
        self.lock().players.clone()
    }

    fn can_chat(&self) -> bool {
        // Private lobbies always allow chat.
        self.lock().game.as_ref().is_some_and(|g| g.is_private)
    }

    fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_join_and_chat() {
        let sim = SimClient::new("EventBot");

        let info = sim
            .create_private_game(GameMode::Ffa, "uscentral", "castle")
            .await
            .unwrap();
        assert!(info.is_private);
        assert!(info.link().starts_with("https://shellshock.io/#"));

        sim.join().await.unwrap();
        assert_eq!(sim.players(), vec!["EventBot".to_string()]);

        sim.send_chat("hello").await.unwrap();
        assert_eq!(sim.chat_log(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn chat_fails_outside_a_game() {
        let sim = SimClient::new("EventBot");
        assert!(matches!(
            sim.send_chat("hi").await,
            Err(GameError::NotInGame)
        ));
        assert!(!sim.can_chat());
    }

    #[tokio::test]
    async fn kick_unknown_player_errors() {
        let sim = SimClient::new("EventBot");
        sim.create_private_game(GameMode::Ffa, "uscentral", "castle")
            .await
            .unwrap();

        assert!(matches!(
            sim.kick_player("Ghost").await,
            Err(GameError::UnknownPlayer(_))
        ));
    }

    #[tokio::test]
    async fn join_and_kill_events_reach_subscribers() {
        let sim = SimClient::new("EventBot");
        sim.create_private_game(GameMode::Ffa, "uscentral", "castle")
            .await
            .unwrap();

        let mut rx = sim.subscribe();
        sim.sim_join("Alice");
        sim.sim_kill("Alice", "Bob");

        match rx.recv().await.unwrap() {
            GameEvent::PlayerJoin(name) => assert_eq!(name, "Alice"),
            other => panic!("unexpected event: {other:?}"),
        }
        match rx.recv().await.unwrap() {
            GameEvent::Kill(payload) => {
                let kill = payload.extract().unwrap();
                assert_eq!(kill.killer, "Alice");
                assert_eq!(kill.victim.as_deref(), Some("Bob"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
