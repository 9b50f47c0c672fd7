//! Killstreak mode: consecutive kills without dying.
//!
//! A kill extends the killer's streak and resets the victim's. Dying to
//! yourself resets your own streak. Streak milestones are announced in game
//! chat every five kills, and reaching the configured target wins the event
//! exactly once per game.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Duration, Utc};
use tokio::{sync::broadcast, sync::mpsc::UnboundedSender, task::AbortHandle};

use crate::{
    game::{
        client::GameClient,
        event::{GameEvent, KillEvent},
    },
    tracker::state::{norm, Scoreboard, StandingRow},
};

/// Two game events for the same kill arrive within this window.
const DEDUPE_WINDOW_MS: i64 = 300;
/// Streak milestones are announced at every multiple of this.
const ANNOUNCE_STEP: u32 = 5;
/// Roster presence is reconciled this often while armed.
const PRESENCE_SYNC_SECS: u64 = 2;

/// Report delivered when a player reaches the streak target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KillstreakWin {
    pub game_id: String,
    pub winner: String,
    pub target: u32,
    pub standings: Vec<StandingRow>,
}

/// What a recorded kill amounted to.
#[derive(Debug, PartialEq, Eq)]
pub enum KillOutcome {
    /// Dropped: bot kill, duplicate, or the game is already over.
    Ignored,
    /// Self-kill; the player's streak went back to zero.
    StreakReset { player: String },
    /// Counted without hitting a milestone.
    Counted { player: String, streak: u32 },
    /// Counted and hit an announce milestone.
    Announce { player: String, streak: u32 },
    /// Counted and reached the win target.
    Win(KillstreakWin),
}

struct WinConfig {
    target: u32,
    fired: bool,
    notify: UnboundedSender<KillstreakWin>,
}

/// Snapshot of a killstreak game for live display.
#[derive(Clone, Debug)]
pub struct KillstreakSnapshot {
    pub game_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub present_count: usize,
    pub rows: Vec<StandingRow>,
}

/// Tracker for all killstreak games, keyed by game id.
#[derive(Default)]
pub struct KillstreakTracker {
    games: Mutex<HashMap<String, Scoreboard>>,
    wins: Mutex<HashMap<String, WinConfig>>,
    armed: Mutex<HashMap<String, Vec<AbortHandle>>>,
}

impl KillstreakTracker {
    pub fn new() -> Self {
        Self {
            games: Mutex::new(HashMap::new()),
            wins: Mutex::new(HashMap::new()),
            armed: Mutex::new(HashMap::new()),
        }
    }

    fn games_lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Scoreboard>> {
        self.games.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn wins_lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, WinConfig>> {
        self.wins.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn ensure_game(&self, game_id: &str, now: DateTime<Utc>) {
        let mut games = self.games_lock();
        games
            .entry(game_id.to_string())
            .or_insert_with(|| Scoreboard::new(game_id, now));
    }

    /// Sets the win target and notification channel for a game.
    ///
    /// Returns `false` (and configures nothing) for a zero target.
    pub fn configure_win(
        &self,
        game_id: &str,
        target: u32,
        notify: UnboundedSender<KillstreakWin>,
    ) -> bool {
        if target == 0 || game_id.trim().is_empty() {
            return false;
        }

        self.wins_lock().insert(
            game_id.to_string(),
            WinConfig {
                target,
                fired: false,
                notify,
            },
        );
        true
    }

    /// Marks the match as started and zeroes any carried-over stats.
    pub fn begin_match(&self, game_id: &str, now: DateTime<Utc>) {
        let mut games = self.games_lock();
        let board = games
            .entry(game_id.to_string())
            .or_insert_with(|| Scoreboard::new(game_id, now));
        board.reset_stats(now);
        board.started_at = Some(now);
    }

    /// Records one attributed kill and reports what it amounted to.
    ///
    /// The win notification, when one fires, is sent on the configured channel
    /// before this returns; the `fired` flag guarantees at most one per game.
    pub fn record_kill(
        &self,
        game_id: &str,
        kill: &KillEvent,
        bot_name: &str,
        now: DateTime<Utc>,
    ) -> KillOutcome {
        let killer = kill.killer.trim().to_string();
        if killer.is_empty() || norm(&killer) == norm(bot_name) {
            return KillOutcome::Ignored;
        }

        let victim_raw = kill.victim.as_deref().map(str::trim).filter(|v| !v.is_empty());

        let mut games = self.games_lock();
        let board = games
            .entry(game_id.to_string())
            .or_insert_with(|| Scoreboard::new(game_id, now));

        if board.over {
            return KillOutcome::Ignored;
        }

        if board.is_duplicate_kill(
            &killer,
            victim_raw,
            now,
            Duration::milliseconds(DEDUPE_WINDOW_MS),
        ) {
            return KillOutcome::Ignored;
        }

        // Self-kill resets the streak instead of extending it.
        if victim_raw.is_some_and(|v| norm(v) == norm(&killer)) {
            let rec = board.player_mut(&killer, now);
            rec.streak = 0;
            board.updated_at = now;
            return KillOutcome::StreakReset { player: killer };
        }

        let streak = {
            let rec = board.player_mut(&killer, now);
            rec.kills += 1;
            rec.streak += 1;
            rec.best_streak = rec.best_streak.max(rec.streak);
            if rec.first_kill_at.is_none() {
                rec.first_kill_at = Some(now);
            }
            rec.last_kill_at = Some(now);
            rec.last_seen_at = now;
            rec.streak
        };

        if let Some(victim) = victim_raw.filter(|v| norm(v) != norm(bot_name)) {
            let rec = board.player_mut(victim, now);
            rec.streak = 0;
            rec.deaths += 1;
            rec.last_seen_at = now;
        }

        board.updated_at = now;

        let mut wins = self.wins_lock();
        if let Some(cfg) = wins.get_mut(game_id) {
            if !cfg.fired && streak >= cfg.target {
                cfg.fired = true;
                board.over = true;

                let win = KillstreakWin {
                    game_id: game_id.to_string(),
                    winner: killer,
                    target: cfg.target,
                    standings: final_standings(board),
                };
                // Receiver gone just means nobody is wired up for this game.
                let _ = cfg.notify.send(win.clone());
                return KillOutcome::Win(win);
            }
        }

        if streak % ANNOUNCE_STEP == 0 {
            KillOutcome::Announce {
                player: killer,
                streak,
            }
        } else {
            KillOutcome::Counted {
                player: killer,
                streak,
            }
        }
    }

    pub fn handle_join(&self, game_id: &str, name: &str, bot_name: &str, now: DateTime<Utc>) {
        if name.trim().is_empty() || norm(name) == norm(bot_name) {
            return;
        }
        let mut games = self.games_lock();
        let board = games
            .entry(game_id.to_string())
            .or_insert_with(|| Scoreboard::new(game_id, now));
        let rec = board.player_mut(name, now);
        rec.present = true;
        rec.last_seen_at = now;
        board.updated_at = now;
    }

    pub fn handle_leave(&self, game_id: &str, name: &str, now: DateTime<Utc>) {
        let mut games = self.games_lock();
        if let Some(board) = games.get_mut(game_id) {
            board.mark_absent(name, now);
        }
    }

    pub fn sync_presence(&self, game_id: &str, roster: &[String], bot_name: &str, now: DateTime<Utc>) {
        let filtered: Vec<String> = roster
            .iter()
            .filter(|n| !n.trim().is_empty() && norm(n) != norm(bot_name))
            .cloned()
            .collect();

        let mut games = self.games_lock();
        let board = games
            .entry(game_id.to_string())
            .or_insert_with(|| Scoreboard::new(game_id, now));
        board.sync_presence(&filtered, now);
    }

    /// Leaderboard snapshot for live display, best current streaks first.
    pub fn snapshot(&self, game_id: &str, limit: usize) -> Option<KillstreakSnapshot> {
        let games = self.games_lock();
        let board = games.get(game_id)?;

        let mut rows: Vec<StandingRow> = board.players().map(StandingRow::from).collect();
        rows.sort_by(|a, b| {
            b.streak
                .cmp(&a.streak)
                .then(b.kills.cmp(&a.kills))
                .then_with(|| norm(&a.name).cmp(&norm(&b.name)))
        });
        rows.truncate(limit);

        Some(KillstreakSnapshot {
            game_id: board.game_id.clone(),
            started_at: board.started_at,
            updated_at: board.updated_at,
            present_count: board.players().filter(|p| p.present).count(),
            rows,
        })
    }

    pub fn is_over(&self, game_id: &str) -> bool {
        self.games_lock().get(game_id).is_some_and(|b| b.over)
    }

    pub fn last_update(&self, game_id: &str) -> Option<DateTime<Utc>> {
        self.games_lock().get(game_id).map(|b| b.updated_at)
    }

    /// Zeroes the game's stats and re-arms the win guard. Returns `false` for
    /// a game this tracker has never seen.
    pub fn reset(&self, game_id: &str, now: DateTime<Utc>) -> bool {
        let mut games = self.games_lock();
        let Some(board) = games.get_mut(game_id) else {
            return false;
        };
        board.reset_stats(now);

        if let Some(cfg) = self.wins_lock().get_mut(game_id) {
            cfg.fired = false;
        }
        true
    }

    /// Drops all state for a game after the event closes.
    pub fn clear_game(&self, game_id: &str) {
        self.unarm(game_id);
        self.games_lock().remove(game_id);
        self.wins_lock().remove(game_id);
    }

    /// Subscribes to the client's event stream and tracks kills for `game_id`
    /// until the win fires or the client moves to another game.
    ///
    /// Re-arming the same game replaces the previous listener.
    pub fn arm(self: &Arc<Self>, client: Arc<dyn GameClient>, game_id: &str) {
        self.unarm(game_id);
        self.ensure_game(game_id, Utc::now());

        let mut handles = Vec::with_capacity(2);

        let listener = {
            let tracker = Arc::clone(self);
            let client = Arc::clone(&client);
            let game_id = game_id.to_string();

            tokio::spawn(async move {
                let mut rx = client.subscribe();
                loop {
                    let event = match rx.recv().await {
                        Ok(event) => event,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!("Killstreak listener lagged, skipped {} events", skipped);
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    };

                    if client.current_game().map(|g| g.id).as_deref() != Some(&game_id) {
                        continue;
                    }

                    match event {
                        GameEvent::Kill(payload) => {
                            let Some(kill) = payload.extract() else {
                                continue;
                            };
                            match tracker.record_kill(&game_id, &kill, client.bot_name(), Utc::now())
                            {
                                KillOutcome::Announce { player, streak } => {
                                    if client.can_chat() {
                                        let line = format!("{} has a {} kill streak", player, streak);
                                        if let Err(e) = client.send_chat(&line).await {
                                            tracing::warn!("Failed to announce streak: {}", e);
                                        }
                                    }
                                }
                                KillOutcome::Win(win) => {
                                    if client.can_chat() {
                                        let line = format!(
                                            "/p {} has reached {} kill streak! GGs to everyone!",
                                            win.winner, win.target
                                        );
                                        if let Err(e) = client.send_chat(&line).await {
                                            tracing::warn!("Failed to announce win: {}", e);
                                        }
                                    }
                                    break;
                                }
                                _ => {}
                            }
                        }
                        GameEvent::PlayerJoin(name) => {
                            tracker.handle_join(&game_id, &name, client.bot_name(), Utc::now());
                        }
                        GameEvent::PlayerLeave(name) => {
                            tracker.handle_leave(&game_id, &name, Utc::now());
                        }
                    }
                }
            })
        };
        handles.push(listener.abort_handle());

        let sync = {
            let tracker = Arc::clone(self);
            let game_id = game_id.to_string();

            tokio::spawn(async move {
                let mut tick =
                    tokio::time::interval(std::time::Duration::from_secs(PRESENCE_SYNC_SECS));
                loop {
                    tick.tick().await;
                    if client.current_game().map(|g| g.id).as_deref() != Some(&game_id) {
                        break;
                    }
                    tracker.sync_presence(
                        &game_id,
                        &client.players(),
                        client.bot_name(),
                        Utc::now(),
                    );
                }
            })
        };
        handles.push(sync.abort_handle());

        self.armed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(game_id.to_string(), handles);
    }

    /// Aborts the listener tasks for a game, if armed.
    pub fn unarm(&self, game_id: &str) {
        let handles = self
            .armed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(game_id);
        if let Some(handles) = handles {
            for handle in handles {
                handle.abort();
            }
        }
    }
}

/// Final standings: best streak first, then kills, then name.
fn final_standings(board: &Scoreboard) -> Vec<StandingRow> {
    let mut rows: Vec<StandingRow> = board.players().map(StandingRow::from).collect();
    rows.sort_by(|a, b| {
        b.best_streak
            .cmp(&a.best_streak)
            .then(b.kills.cmp(&a.kills))
            .then_with(|| norm(&a.name).cmp(&norm(&b.name)))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    const BOT: &str = "EventBot";

    fn ts(ms: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000 + ms).unwrap()
    }

    fn kill(killer: &str, victim: Option<&str>) -> KillEvent {
        KillEvent {
            killer: killer.to_string(),
            victim: victim.map(str::to_string),
        }
    }

    #[test]
    fn kill_extends_killer_and_resets_victim() {
        let tracker = KillstreakTracker::new();

        tracker.record_kill("g1", &kill("Alice", Some("Bob")), BOT, ts(0));
        tracker.record_kill("g1", &kill("Bob", Some("Carol")), BOT, ts(400));
        let outcome = tracker.record_kill("g1", &kill("Alice", Some("Bob")), BOT, ts(800));

        assert_eq!(
            outcome,
            KillOutcome::Counted {
                player: "Alice".to_string(),
                streak: 2
            }
        );

        let snap = tracker.snapshot("g1", 10).unwrap();
        let bob = snap.rows.iter().find(|r| r.name == "Bob").unwrap();
        assert_eq!(bob.streak, 0);
        assert_eq!(bob.kills, 1);
    }

    #[test]
    fn self_kill_resets_own_streak() {
        let tracker = KillstreakTracker::new();

        tracker.record_kill("g1", &kill("Alice", Some("Bob")), BOT, ts(0));
        let outcome = tracker.record_kill("g1", &kill("Alice", Some("alice")), BOT, ts(400));

        assert_eq!(
            outcome,
            KillOutcome::StreakReset {
                player: "Alice".to_string()
            }
        );
        let snap = tracker.snapshot("g1", 10).unwrap();
        let alice = snap.rows.iter().find(|r| r.name == "Alice").unwrap();
        assert_eq!(alice.streak, 0);
        // Kills and best streak survive the reset.
        assert_eq!(alice.kills, 1);
        assert_eq!(alice.best_streak, 1);
    }

    #[test]
    fn bot_kills_are_ignored() {
        let tracker = KillstreakTracker::new();
        let outcome = tracker.record_kill("g1", &kill(BOT, Some("Alice")), BOT, ts(0));
        assert_eq!(outcome, KillOutcome::Ignored);
    }

    #[test]
    fn duplicate_kill_within_window_is_ignored() {
        let tracker = KillstreakTracker::new();

        tracker.record_kill("g1", &kill("Alice", Some("Bob")), BOT, ts(0));
        let dup = tracker.record_kill("g1", &kill("Alice", Some("Bob")), BOT, ts(299));
        assert_eq!(dup, KillOutcome::Ignored);

        let again = tracker.record_kill("g1", &kill("Alice", Some("Bob")), BOT, ts(301));
        assert_eq!(
            again,
            KillOutcome::Counted {
                player: "Alice".to_string(),
                streak: 2
            }
        );
    }

    #[test]
    fn announces_every_fifth_streak() {
        let tracker = KillstreakTracker::new();

        let mut t = 0;
        for _ in 0..4 {
            tracker.record_kill("g1", &kill("Alice", Some("Bob")), BOT, ts(t));
            t += 400;
        }
        let fifth = tracker.record_kill("g1", &kill("Alice", Some("Bob")), BOT, ts(t));

        assert_eq!(
            fifth,
            KillOutcome::Announce {
                player: "Alice".to_string(),
                streak: 5
            }
        );
    }

    #[test]
    fn win_fires_exactly_once() {
        let tracker = KillstreakTracker::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(tracker.configure_win("g1", 3, tx));

        let mut t = 0;
        for _ in 0..2 {
            tracker.record_kill("g1", &kill("Alice", Some("Bob")), BOT, ts(t));
            t += 400;
        }
        let outcome = tracker.record_kill("g1", &kill("Alice", Some("Bob")), BOT, ts(t));

        let KillOutcome::Win(win) = outcome else {
            panic!("expected win, got {outcome:?}");
        };
        assert_eq!(win.winner, "Alice");
        assert_eq!(win.target, 3);

        let delivered = rx.try_recv().unwrap();
        assert_eq!(delivered.winner, "Alice");
        assert!(rx.try_recv().is_err());

        // The game is over; further kills are dropped.
        t += 400;
        let after = tracker.record_kill("g1", &kill("Carol", Some("Dave")), BOT, ts(t));
        assert_eq!(after, KillOutcome::Ignored);
        assert!(tracker.is_over("g1"));
    }

    #[test]
    fn zero_target_is_rejected() {
        let tracker = KillstreakTracker::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(!tracker.configure_win("g1", 0, tx));
    }

    #[test]
    fn reset_rearms_the_win_guard() {
        let tracker = KillstreakTracker::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tracker.configure_win("g1", 2, tx);

        tracker.record_kill("g1", &kill("Alice", Some("Bob")), BOT, ts(0));
        tracker.record_kill("g1", &kill("Alice", Some("Bob")), BOT, ts(400));
        assert!(tracker.is_over("g1"));
        rx.try_recv().unwrap();

        assert!(tracker.reset("g1", ts(1_000)));
        assert!(!tracker.is_over("g1"));

        tracker.record_kill("g1", &kill("Alice", Some("Bob")), BOT, ts(1_400));
        let outcome = tracker.record_kill("g1", &kill("Alice", Some("Bob")), BOT, ts(1_800));
        assert!(matches!(outcome, KillOutcome::Win(_)));
        rx.try_recv().unwrap();
    }

    #[test]
    fn reset_unknown_game_returns_false() {
        let tracker = KillstreakTracker::new();
        assert!(!tracker.reset("nope", ts(0)));
    }

    #[test]
    fn games_are_tracked_independently() {
        let tracker = KillstreakTracker::new();

        tracker.record_kill("g1", &kill("Alice", Some("Bob")), BOT, ts(0));
        tracker.record_kill("g2", &kill("Alice", Some("Bob")), BOT, ts(100));

        let s1 = tracker.snapshot("g1", 10).unwrap();
        let s2 = tracker.snapshot("g2", 10).unwrap();
        assert_eq!(s1.rows.iter().find(|r| r.name == "Alice").unwrap().kills, 1);
        assert_eq!(s2.rows.iter().find(|r| r.name == "Alice").unwrap().kills, 1);
    }
}
