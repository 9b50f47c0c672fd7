//! Lobby session helpers: creating and occupying a fresh event lobby, and
//! greeting the first player who walks in.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::game::client::{GameClient, GameError, GameInfo, GameMode};
use crate::tracker::state::norm;

/// How long the greeter waits for a first player before giving up.
const GREET_DEADLINE_SECS: u64 = 30;
/// Roster poll cadence while waiting.
const GREET_POLL_MS: u64 = 400;

/// Creates a private FFA lobby, joins it, and returns its identity.
pub async fn create_event_game(
    client: &Arc<dyn GameClient>,
    region: &str,
    map: &str,
) -> Result<GameInfo, GameError> {
    let info = client.create_private_game(GameMode::Ffa, region, map).await?;
    client.join().await?;
    Ok(info)
}

/// Says hello once per game when the first real player arrives.
///
/// Lobbies are created empty, so the greeting is sent from a short-lived poll
/// task instead of the join event stream; some transports only deliver kill
/// events reliably.
#[derive(Default)]
pub struct Greeter {
    greeted: Mutex<HashSet<String>>,
}

impl Greeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watches the given game and sends `message` when the first player who
    /// is not the bot shows up. At most one greeting per game id.
    pub fn watch(self: &Arc<Self>, client: Arc<dyn GameClient>, game_id: &str, message: &str) {
        {
            let mut greeted = self.greeted.lock().unwrap_or_else(|e| e.into_inner());
            if !greeted.insert(game_id.to_string()) {
                return;
            }
        }

        let game_id = game_id.to_string();
        let message = message.to_string();

        tokio::spawn(async move {
            let deadline = tokio::time::Instant::now() + Duration::from_secs(GREET_DEADLINE_SECS);
            let bot = norm(client.bot_name());

            loop {
                if tokio::time::Instant::now() >= deadline {
                    return;
                }
                if client.current_game().map(|g| g.id) != Some(game_id.clone()) {
                    return;
                }

                let has_player = client.players().iter().any(|p| norm(p) != bot);
                if has_player {
                    if let Err(err) = client.send_chat(&message).await {
                        tracing::warn!("Failed to send lobby greeting: {err}");
                    }
                    return;
                }

                tokio::time::sleep(Duration::from_millis(GREET_POLL_MS)).await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::sim::SimClient;

    #[tokio::test]
    async fn greets_first_player_once() {
        let sim = Arc::new(SimClient::new("EventBot"));
        let client: Arc<dyn GameClient> = sim.clone();

        let info = create_event_game(&client, "uscentral", "cluckgrounds")
            .await
            .unwrap();
        assert_eq!(sim.players(), vec!["EventBot".to_string()]);

        let greeter = Arc::new(Greeter::new());
        greeter.watch(client.clone(), &info.id, "hi");
        // Second watch on the same game is a no-op.
        greeter.watch(client.clone(), &info.id, "hi");

        sim.sim_join("Alice");

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(sim.chat_log(), vec!["hi".to_string()]);
    }

    #[tokio::test]
    async fn does_not_greet_the_bot_itself() {
        let sim = Arc::new(SimClient::new("EventBot"));
        let client: Arc<dyn GameClient> = sim.clone();

        let info = create_event_game(&client, "uscentral", "cluckgrounds")
            .await
            .unwrap();

        let greeter = Arc::new(Greeter::new());
        greeter.watch(client.clone(), &info.id, "hi");

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert!(sim.chat_log().is_empty());
    }
}
