//! Deathmatch mode: total kills against a target and a match clock.
//!
//! The match starts with an in-game countdown. The first player to reach the
//! kill target wins immediately; otherwise the highest kill count when the
//! clock runs out wins, with earliest-last-kill then name as tie breaks.
//! Self-kills are ignored entirely (no reset, unlike killstreak).

use std::{
    collections::{HashMap, HashSet},
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
const DEDUPE_WINDOW_MS: i64 = 250;
/// Cadence of countdown chat lines.
const COUNTDOWN_STEP_MS: u64 = 900;
/// Roster presence is reconciled this often while armed.
const PRESENCE_SYNC_SECS: u64 = 2;

pub const DEFAULT_TARGET: u32 = 30;
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 600;

/// Why a deathmatch ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WinReason {
    TargetReached,
    TimeExpired,
}

/// Report delivered when a deathmatch ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeathmatchWin {
    pub game_id: String,
    pub reason: WinReason,
    /// `None` when the clock ran out with nobody on the board.
    pub winner: Option<String>,
    pub winner_kills: u32,
    pub target: u32,
    pub time_limit_seconds: u32,
    pub standings: Vec<StandingRow>,
}

/// What a recorded kill amounted to.
#[derive(Debug, PartialEq, Eq)]
pub enum KillOutcome {
    /// Dropped: bot kill, self-kill, duplicate, match not running or over.
    Ignored,
    Counted { player: String, kills: u32 },
    Win(DeathmatchWin),
}

/// Outcome of a start request.
#[derive(Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// Countdown is underway; the clock starts when it finishes.
    Starting { target: u32, time_limit_seconds: u32 },
    AlreadyStarted,
    AlreadyStarting,
}

struct WinConfig {
    target: u32,
    time_limit_seconds: u32,
    fired: bool,
    notify: UnboundedSender<DeathmatchWin>,
}

/// Snapshot of a deathmatch game for live display.
#[derive(Clone, Debug)]
pub struct DeathmatchSnapshot {
    pub game_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub present_count: usize,
    pub rows: Vec<StandingRow>,
}

/// Tracker for all deathmatch games, keyed by game id.
#[derive(Default)]
pub struct DeathmatchTracker {
    games: Mutex<HashMap<String, Scoreboard>>,
    wins: Mutex<HashMap<String, WinConfig>>,
    starting: Mutex<HashSet<String>>,
    armed: Mutex<HashMap<String, Vec<AbortHandle>>>,
}

impl DeathmatchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn games_lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Scoreboard>> {
        self.games.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn wins_lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, WinConfig>> {
        self.wins.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn starting_lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.starting.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn ensure_game(&self, game_id: &str, now: DateTime<Utc>) {
        let mut games = self.games_lock();
        games
            .entry(game_id.to_string())
            .or_insert_with(|| Scoreboard::new(game_id, now));
    }

    /// Sets the kill target, time limit and notification channel for a game.
    ///
    /// Zero values fall back to the mode defaults. Returns `false` for an
    /// empty game id.
    pub fn configure_win(
        &self,
        game_id: &str,
        target: u32,
        time_limit_seconds: u32,
        notify: UnboundedSender<DeathmatchWin>,
    ) -> bool {
        if game_id.trim().is_empty() {
            return false;
        }

        self.wins_lock().insert(
            game_id.to_string(),
            WinConfig {
                target: if target > 0 { target } else { DEFAULT_TARGET },
                time_limit_seconds: if time_limit_seconds > 0 {
                    time_limit_seconds
                } else {
                    DEFAULT_TIME_LIMIT_SECS
                },
                fired: false,
                notify,
            },
        );
        true
    }

    /// Stamps the match clock and zeroes carried-over stats.
    ///
    /// Called after the countdown finishes; kills only count from here.
    pub fn begin_match(&self, game_id: &str, time_limit_seconds: u32, now: DateTime<Utc>) {
        let mut games = self.games_lock();
        let board = games
            .entry(game_id.to_string())
            .or_insert_with(|| Scoreboard::new(game_id, now));
        board.reset_stats(now);
        board.started_at = Some(now);
        board.ends_at = Some(now + Duration::seconds(i64::from(time_limit_seconds)));

        if let Some(cfg) = self.wins_lock().get_mut(game_id) {
            cfg.fired = false;
        }
    }

    pub fn is_running(&self, game_id: &str) -> bool {
        self.games_lock()
            .get(game_id)
            .is_some_and(|b| b.started_at.is_some() && !b.over)
    }

    pub fn is_over(&self, game_id: &str) -> bool {
        self.games_lock().get(game_id).is_some_and(|b| b.over)
    }

    pub fn last_update(&self, game_id: &str) -> Option<DateTime<Utc>> {
        self.games_lock().get(game_id).map(|b| b.updated_at)
    }

    pub fn ends_at(&self, game_id: &str) -> Option<DateTime<Utc>> {
        self.games_lock().get(game_id).and_then(|b| b.ends_at)
    }

    /// Records one attributed kill and reports what it amounted to.
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
        let Some(board) = games.get_mut(game_id) else {
            return KillOutcome::Ignored;
        };

        if board.over || board.started_at.is_none() {
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

        // Self-kills don't count.
        if victim_raw.is_some_and(|v| norm(v) == norm(&killer)) {
            return KillOutcome::Ignored;
        }

        let kills = {
            let rec = board.player_mut(&killer, now);
            rec.kills += 1;
            if rec.first_kill_at.is_none() {
                rec.first_kill_at = Some(now);
            }
            rec.last_kill_at = Some(now);
            rec.last_seen_at = now;
            rec.kills
        };

        if let Some(victim) = victim_raw.filter(|v| norm(v) != norm(bot_name)) {
            let rec = board.player_mut(victim, now);
            rec.deaths += 1;
            rec.last_seen_at = now;
        }

        board.updated_at = now;

        let mut wins = self.wins_lock();
        if let Some(cfg) = wins.get_mut(game_id) {
            if !cfg.fired && kills >= cfg.target {
                let win = end_game(board, cfg, WinReason::TargetReached);
                return KillOutcome::Win(win);
            }
        }

        KillOutcome::Counted {
            player: killer,
            kills,
        }
    }

    /// Ends the match on the clock if it is running and due.
    ///
    /// Returns the win report the first time it fires, `None` on every other
    /// call; the `fired` flag makes expiry and target wins mutually exclusive.
    pub fn expire(&self, game_id: &str, now: DateTime<Utc>) -> Option<DeathmatchWin> {
        let mut games = self.games_lock();
        let board = games.get_mut(game_id)?;

        if board.over || board.started_at.is_none() {
            return None;
        }
        if board.ends_at.is_some_and(|end| now < end) {
            return None;
        }

        let mut wins = self.wins_lock();
        let cfg = wins.get_mut(game_id)?;
        if cfg.fired {
            return None;
        }

        Some(end_game(board, cfg, WinReason::TimeExpired))
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

    /// Leaderboard snapshot for live display, most kills first.
    pub fn snapshot(&self, game_id: &str, limit: usize) -> Option<DeathmatchSnapshot> {
        let games = self.games_lock();
        let board = games.get(game_id)?;

        let mut rows: Vec<StandingRow> = board.players().map(StandingRow::from).collect();
        sort_standings(&mut rows);
        rows.truncate(limit);

        Some(DeathmatchSnapshot {
            game_id: board.game_id.clone(),
            started_at: board.started_at,
            ends_at: board.ends_at,
            updated_at: board.updated_at,
            present_count: board.players().filter(|p| p.present).count(),
            rows,
        })
    }

    /// Clears the match clock and stats so the lobby can be started again.
    /// Returns `false` for a game this tracker has never seen.
    pub fn reset(&self, game_id: &str, now: DateTime<Utc>) -> bool {
        let mut games = self.games_lock();
        let Some(board) = games.get_mut(game_id) else {
            return false;
        };
        board.reset_stats(now);
        board.started_at = None;
        board.ends_at = None;

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
        self.starting_lock().remove(game_id);
    }

    /// Runs the start countdown in game chat, then stamps the clock, arms the
    /// kill listener and announces the rules.
    ///
    /// Target and time limit come from the win configuration, falling back to
    /// mode defaults when none was set.
    pub async fn start(
        self: &Arc<Self>,
        client: Arc<dyn GameClient>,
        game_id: &str,
        countdown_from: u32,
    ) -> StartOutcome {
        self.ensure_game(game_id, Utc::now());

        if self.is_running(game_id) {
            return StartOutcome::AlreadyStarted;
        }
        if !self.starting_lock().insert(game_id.to_string()) {
            return StartOutcome::AlreadyStarting;
        }

        let (target, time_limit_seconds) = {
            let wins = self.wins_lock();
            match wins.get(game_id) {
                Some(cfg) => (cfg.target, cfg.time_limit_seconds),
                None => (DEFAULT_TARGET, DEFAULT_TIME_LIMIT_SECS),
            }
        };

        let count = countdown_from.max(1);
        let step = std::time::Duration::from_millis(COUNTDOWN_STEP_MS);

        self.sync_presence(game_id, &client.players(), client.bot_name(), Utc::now());

        // Countdown (no /p prefix so it shows as plain lobby chat).
        chat_best_effort(&client, "Deathmatch Starting In...").await;
        tokio::time::sleep(step).await;

        for i in (1..=count).rev() {
            chat_best_effort(&client, &i.to_string()).await;
            tokio::time::sleep(step).await;
        }

        chat_best_effort(&client, "GO!").await;

        self.begin_match(game_id, time_limit_seconds, Utc::now());
        self.arm(Arc::clone(&client), game_id, time_limit_seconds);
        self.starting_lock().remove(game_id);

        // Small delay so the next message doesn't get swallowed.
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;

        let mins = time_limit_seconds.div_ceil(60);
        chat_best_effort(&client, &format!("First to {} kills wins!", target)).await;
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        chat_best_effort(
            &client,
            &format!(" Or most kills at time end wins! | {}m left", mins),
        )
        .await;

        StartOutcome::Starting {
            target,
            time_limit_seconds,
        }
    }

    /// Subscribes to the client's event stream and runs the match clock.
    fn arm(self: &Arc<Self>, client: Arc<dyn GameClient>, game_id: &str, time_limit_seconds: u32) {
        self.unarm(game_id);

        let mut handles = Vec::with_capacity(3);

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
                            tracing::warn!("Deathmatch listener lagged, skipped {} events", skipped);
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
                            if let KillOutcome::Win(win) =
                                tracker.record_kill(&game_id, &kill, client.bot_name(), Utc::now())
                            {
                                announce_win(&client, &win).await;
                                break;
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

        let timer = {
            let tracker = Arc::clone(self);
            let client = Arc::clone(&client);
            let game_id = game_id.to_string();

            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_secs(u64::from(time_limit_seconds)))
                    .await;
                if let Some(win) = tracker.expire(&game_id, Utc::now()) {
                    announce_win(&client, &win).await;
                }
            })
        };
        handles.push(timer.abort_handle());

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

    /// Aborts the listener and timer tasks for a game, if armed.
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

async fn chat_best_effort(client: &Arc<dyn GameClient>, line: &str) {
    if !client.can_chat() {
        return;
    }
    if let Err(e) = client.send_chat(line).await {
        tracing::warn!("Failed to send game chat: {}", e);
    }
}

async fn announce_win(client: &Arc<dyn GameClient>, win: &DeathmatchWin) {
    let winner = win.winner.as_deref().unwrap_or("Unknown");
    let line = match win.reason {
        WinReason::TargetReached => format!(
            "/p DEATHMATCH OVER! {} wins by reaching {} kills! (kills: {})",
            winner, win.target, win.winner_kills
        ),
        WinReason::TimeExpired => format!(
            "/p DEATHMATCH OVER! {} wins with {} kills!",
            winner, win.winner_kills
        ),
    };
    chat_best_effort(client, &line).await;
}

/// Deathmatch ordering: kills desc, earliest last kill, then name.
fn sort_standings(rows: &mut [StandingRow]) {
    rows.sort_by(|a, b| {
        b.kills.cmp(&a.kills).then_with(|| {
            let a_last = a.last_kill_at.map(|t| t.timestamp_millis()).unwrap_or(0);
            let b_last = b.last_kill_at.map(|t| t.timestamp_millis()).unwrap_or(0);
            a_last
                .cmp(&b_last)
                .then_with(|| norm(&a.name).cmp(&norm(&b.name)))
        })
    });
}

/// Marks the game over and delivers the win report. Caller holds both locks.
fn end_game(board: &mut Scoreboard, cfg: &mut WinConfig, reason: WinReason) -> DeathmatchWin {
    cfg.fired = true;
    board.over = true;

    let mut rows: Vec<StandingRow> = board.players().map(StandingRow::from).collect();
    sort_standings(&mut rows);

    let winner = rows.first().filter(|r| !r.name.is_empty());
    let win = DeathmatchWin {
        game_id: board.game_id.clone(),
        reason,
        winner: winner.map(|r| r.name.clone()),
        winner_kills: winner.map(|r| r.kills).unwrap_or(0),
        target: cfg.target,
        time_limit_seconds: cfg.time_limit_seconds,
        standings: rows,
    };

    let _ = cfg.notify.send(win.clone());
    win
}
