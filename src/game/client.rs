//! The game client abstraction.
//!
//! Everything the bot does inside the shooter goes through the [`GameClient`]
//! trait: lobby creation, joining, chat, lock/kick moderation and the event
//! stream. Callers never probe for optional capabilities; an implementation
//! that cannot perform an operation returns [`GameError::Unsupported`] and the
//! caller surfaces that to staff.

use serenity::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::game::event::GameEvent;

/// Errors surfaced by game client operations.
#[derive(Error, Debug)]
pub enum GameError {
    /// The client is not currently inside a game.
    #[error("not connected to a game")]
    NotInGame,

    /// The operation referenced a game the client does not know about.
    #[error("unknown game id: {0}")]
    UnknownGame(String),

    /// The named player is not in the current game.
    #[error("player not found in game: {0}")]
    UnknownPlayer(String),

    /// The client implementation does not support this operation.
    #[error("game client does not support {0}")]
    Unsupported(&'static str),

    /// Transport-level failure talking to the game server.
    #[error("game transport error: {0}")]
    Transport(String),
}

/// Lobby game mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameMode {
    Ffa,
    Teams,
    Kotc,
}

/// Identity of a game the client created or joined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameInfo {
    pub id: String,
    /// Share code players type or click to join.
    pub code: String,
    pub region: String,
    pub map: String,
    pub is_private: bool,
}

impl GameInfo {
    /// Join link for the lobby, empty when no share code is known.
    pub fn link(&self) -> String {
        if self.code.is_empty() {
            String::new()
        } else {
            format!("https://shellshock.io/#{}", self.code)
        }
    }
}

/// Versioned interface between the Discord side and the game side.
///
/// Implementations must be cheap to share behind an `Arc` and deliver events
/// through a broadcast channel so multiple trackers can observe the same game.
#[async_trait]
pub trait GameClient: Send + Sync {
    /// In-game display name the client plays under.
    fn bot_name(&self) -> &str;

    /// Creates a private lobby and moves the client into it.
    async fn create_private_game(
        &self,
        mode: GameMode,
        region: &str,
        map: &str,
    ) -> Result<GameInfo, GameError>;

    /// Spawns into the current game so the client occupies a player slot.
    async fn join(&self) -> Result<(), GameError>;

    /// Leaves the current game, if any.
    async fn leave(&self) -> Result<(), GameError>;

    /// Sends a chat line into the current game.
    async fn send_chat(&self, line: &str) -> Result<(), GameError>;

    /// Locks or unlocks the current lobby. Returns the resulting lock state.
    async fn set_locked(&self, locked: bool) -> Result<bool, GameError>;

    /// Removes a player from the current game by display name.
    async fn kick_player(&self, name: &str) -> Result<(), GameError>;

    /// The game the client currently sits in.
    fn current_game(&self) -> Option<GameInfo>;

    /// Display names of everyone in the current game, including the client.
    fn players(&self) -> Vec<String>;

    /// Whether chat lines will actually be delivered.
    ///
    /// Private lobbies always allow chat; public ones depend on account
    /// verification, so announcement paths check this before speaking.
    fn can_chat(&self) -> bool;

    /// Subscribes to the game event stream.
    fn subscribe(&self) -> broadcast::Receiver<GameEvent>;
}
