//! Per-game scoreboard shared by the mode trackers.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};

/// Age after which dedupe entries are pruned.
const RECENT_KILL_MAX_AGE_MS: i64 = 5_000;

/// Lowercased, trimmed key for player name lookups.
pub fn norm(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One player's standing within a game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerRecord {
    pub name: String,
    pub kills: u32,
    pub deaths: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub present: bool,
    pub first_kill_at: Option<DateTime<Utc>>,
    pub last_kill_at: Option<DateTime<Utc>>,
    pub last_seen_at: DateTime<Utc>,
}

impl PlayerRecord {
    fn new(name: &str, now: DateTime<Utc>) -> Self {
        Self {
            name: name.trim().to_string(),
            kills: 0,
            deaths: 0,
            streak: 0,
            best_streak: 0,
            present: true,
            first_kill_at: None,
            last_kill_at: None,
            last_seen_at: now,
        }
    }
}

/// A row in a leaderboard or final-standings snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StandingRow {
    pub name: String,
    pub kills: u32,
    pub deaths: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub last_kill_at: Option<DateTime<Utc>>,
    pub present: bool,
}

impl From<&PlayerRecord> for StandingRow {
    fn from(rec: &PlayerRecord) -> Self {
        Self {
            name: rec.name.clone(),
            kills: rec.kills,
            deaths: rec.deaths,
            streak: rec.streak,
            best_streak: rec.best_streak,
            last_kill_at: rec.last_kill_at,
            present: rec.present,
        }
    }
}

/// Scoreboard for one game.
#[derive(Debug)]
pub struct Scoreboard {
    pub game_id: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// Set once a win has fired; further kills are ignored.
    pub over: bool,
    players: HashMap<String, PlayerRecord>,
    recent_kills: HashMap<String, DateTime<Utc>>,
}

impl Scoreboard {
    pub fn new(game_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            game_id: game_id.to_string(),
            created_at: now,
            started_at: None,
            ends_at: None,
            updated_at: now,
            over: false,
            players: HashMap::new(),
            recent_kills: HashMap::new(),
        }
    }

    pub fn player(&self, name: &str) -> Option<&PlayerRecord> {
        self.players.get(&norm(name))
    }

    pub fn player_mut(&mut self, name: &str, now: DateTime<Utc>) -> &mut PlayerRecord {
        self.players
            .entry(norm(name))
            .or_insert_with(|| PlayerRecord::new(name, now))
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.values()
    }

    pub fn mark_absent(&mut self, name: &str, now: DateTime<Utc>) {
        if let Some(rec) = self.players.get_mut(&norm(name)) {
            rec.present = false;
        }
        self.updated_at = now;
    }

    /// Reconciles presence flags against the full current roster.
    ///
    /// Names in `roster` are marked present (and created if unseen); tracked
    /// players missing from it are marked absent but keep their stats.
    pub fn sync_presence(&mut self, roster: &[String], now: DateTime<Utc>) {
        let present: HashSet<String> = roster.iter().map(|n| norm(n)).collect();

        for name in roster {
            if name.trim().is_empty() {
                continue;
            }
            let rec = self.player_mut(name, now);
            rec.present = true;
            rec.last_seen_at = now;
        }

        for (key, rec) in self.players.iter_mut() {
            if !present.contains(key) {
                rec.present = false;
            }
        }

        self.updated_at = now;
    }

    /// Duplicate-kill suppression.
    ///
    /// The same killer/victim pair reported again within `window` is a
    /// duplicate (multiple game events fire for one kill). Entries older than
    /// five seconds are pruned on every call.
    pub fn is_duplicate_kill(
        &mut self,
        killer: &str,
        victim: Option<&str>,
        now: DateTime<Utc>,
        window: Duration,
    ) -> bool {
        let key = match victim {
            Some(v) if !v.trim().is_empty() => format!("{}|{}", norm(killer), norm(v)),
            _ => format!("{}|_", norm(killer)),
        };

        if let Some(last) = self.recent_kills.get(&key) {
            if now.signed_duration_since(*last) < window {
                return true;
            }
        }

        self.recent_kills.insert(key, now);
        self.recent_kills.retain(|_, t| {
            now.signed_duration_since(*t) <= Duration::milliseconds(RECENT_KILL_MAX_AGE_MS)
        });

        false
    }

    /// Zeroes match stats for all players while keeping the roster.
    pub fn reset_stats(&mut self, now: DateTime<Utc>) {
        for rec in self.players.values_mut() {
            rec.kills = 0;
            rec.deaths = 0;
            rec.streak = 0;
            rec.best_streak = 0;
            rec.first_kill_at = None;
            rec.last_kill_at = None;
            rec.last_seen_at = now;
        }
        self.over = false;
        self.recent_kills.clear();
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(ms: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000 + ms).unwrap()
    }

    #[test]
    fn duplicate_within_window_is_suppressed() {
        let mut board = Scoreboard::new("g1", ts(0));
        let window = Duration::milliseconds(300);

        assert!(!board.is_duplicate_kill("Alice", Some("Bob"), ts(0), window));
        assert!(board.is_duplicate_kill("Alice", Some("Bob"), ts(299), window));
        // A different pair is never suppressed by Alice|Bob.
        assert!(!board.is_duplicate_kill("Alice", Some("Carol"), ts(100), window));
    }

    #[test]
    fn duplicate_outside_window_counts_again() {
        let mut board = Scoreboard::new("g1", ts(0));
        let window = Duration::milliseconds(300);

        assert!(!board.is_duplicate_kill("Alice", Some("Bob"), ts(0), window));
        assert!(!board.is_duplicate_kill("Alice", Some("Bob"), ts(301), window));
    }

    #[test]
    fn missing_victim_uses_killer_only_key() {
        let mut board = Scoreboard::new("g1", ts(0));
        let window = Duration::milliseconds(250);

        assert!(!board.is_duplicate_kill("Alice", None, ts(0), window));
        assert!(board.is_duplicate_kill("Alice", None, ts(100), window));
    }

    #[test]
    fn old_entries_are_pruned() {
        let mut board = Scoreboard::new("g1", ts(0));
        let window = Duration::milliseconds(300);

        board.is_duplicate_kill("Alice", Some("Bob"), ts(0), window);
        // Six seconds later the entry has aged out entirely.
        assert!(!board.is_duplicate_kill("Alice", Some("Bob"), ts(6_000), window));
    }

    #[test]
    fn sync_presence_marks_absentees_but_keeps_stats() {
        let mut board = Scoreboard::new("g1", ts(0));
        board.player_mut("Alice", ts(0)).kills = 3;
        board.player_mut("Bob", ts(0));

        board.sync_presence(&["Bob".to_string(), "Carol".to_string()], ts(100));

        let alice = board.player("Alice").unwrap();
        assert!(!alice.present);
        assert_eq!(alice.kills, 3);
        assert!(board.player("Bob").unwrap().present);
        assert!(board.player("Carol").is_some());
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let mut board = Scoreboard::new("g1", ts(0));
        board.player_mut("  Alice ", ts(0)).kills = 1;

        let rec = board.player("ALICE").unwrap();
        assert_eq!(rec.name, "Alice");
        assert_eq!(rec.kills, 1);
    }
}
