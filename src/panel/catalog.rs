//! The mini-event catalog and the fixed choice lists staff pick from.

use serde::{Deserialize, Serialize};

pub const DEFAULT_REGION: &str = "uscentral";
pub const DEFAULT_MAP: &str = "cluckgrounds";

pub const ALLOWED_REGIONS: [&str; 2] = ["uscentral", "germany"];
pub const ALLOWED_MAPS: [&str; 4] = ["castle", "blue", "growler", "cluckgrounds"];

/// The mini events staff can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKey {
    Killstreak,
    Deathmatch,
    BattleRoyale,
    HideSeek,
}

impl EventKey {
    pub const ALL: [EventKey; 4] = [
        EventKey::Killstreak,
        EventKey::Deathmatch,
        EventKey::BattleRoyale,
        EventKey::HideSeek,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKey::Killstreak => "killstreak",
            EventKey::Deathmatch => "deathmatch",
            EventKey::BattleRoyale => "battle_royale",
            EventKey::HideSeek => "hide_seek",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "killstreak" => Some(EventKey::Killstreak),
            "deathmatch" => Some(EventKey::Deathmatch),
            "battle_royale" => Some(EventKey::BattleRoyale),
            "hide_seek" => Some(EventKey::HideSeek),
            _ => None,
        }
    }

    pub fn spec(self) -> &'static MiniEvent {
        mini_event(self)
    }
}

/// Static description of one mini event.
pub struct MiniEvent {
    pub key: EventKey,
    pub label: &'static str,
    pub base_rules: &'static [&'static str],
    pub default_target: Option<u32>,
    pub default_time_limit_seconds: Option<u32>,
    /// Whether the bot can create and host the lobby itself.
    pub can_auto_create: bool,
}

impl MiniEvent {
    /// Default how-to-win line, parameterized by the configured target and
    /// time limit. "X" stands in for an unset target.
    pub fn base_how_to_win(&self, target: Option<u32>, time_limit_seconds: Option<u32>) -> String {
        let t = target.map_or_else(|| "X".to_string(), |n| n.to_string());
        match self.key {
            EventKey::Killstreak => {
                format!("Reach {t} kills in a row (no deaths) to win.")
            }
            EventKey::Deathmatch => {
                let time = fmt_time(time_limit_seconds)
                    .map(|s| format!(" ({s})"))
                    .unwrap_or_default();
                format!(
                    "First to {t} kills wins. If time runs out{time}, the player with the most kills wins."
                )
            }
            EventKey::BattleRoyale => "Be the last player standing.".to_string(),
            EventKey::HideSeek => "Last one alive wins.".to_string(),
        }
    }
}

const KILLSTREAK: MiniEvent = MiniEvent {
    key: EventKey::Killstreak,
    label: "Killstreak",
    base_rules: &[
        "Any guns allowed unless staff restricts it.",
        "Staff may add weapon limits, maps, or other restrictions.",
    ],
    default_target: Some(10),
    default_time_limit_seconds: None,
    can_auto_create: true,
};

const DEATHMATCH: MiniEvent = MiniEvent {
    key: EventKey::Deathmatch,
    label: "Deathmatch",
    base_rules: &["Any guns allowed unless staff restricts it."],
    default_target: Some(30),
    default_time_limit_seconds: Some(600),
    can_auto_create: true,
};

const BATTLE_ROYALE: MiniEvent = MiniEvent {
    key: EventKey::BattleRoyale,
    label: "Battle Royale",
    base_rules: &[
        "Active zones will push toward the middle for a final fight.",
        "Any guns allowed unless staff restricts it.",
    ],
    default_target: None,
    default_time_limit_seconds: None,
    can_auto_create: false,
};

const HIDE_SEEK: MiniEvent = MiniEvent {
    key: EventKey::HideSeek,
    label: "Hide & Seek",
    base_rules: &[
        "All players hide.",
        "A staff member will be the seeker (or staff decides).",
        "Last survivor wins.",
    ],
    default_target: None,
    default_time_limit_seconds: None,
    can_auto_create: false,
};

pub fn mini_event(key: EventKey) -> &'static MiniEvent {
    match key {
        EventKey::Killstreak => &KILLSTREAK,
        EventKey::Deathmatch => &DEATHMATCH,
        EventKey::BattleRoyale => &BATTLE_ROYALE,
        EventKey::HideSeek => &HIDE_SEEK,
    }
}

/// Clamps a region choice to the allowed set.
pub fn normalize_region(raw: &str) -> &'static str {
    ALLOWED_REGIONS
        .iter()
        .find(|r| **r == raw.trim())
        .copied()
        .unwrap_or(DEFAULT_REGION)
}

/// Clamps a map choice to the allowed set.
pub fn normalize_map(raw: &str) -> &'static str {
    ALLOWED_MAPS
        .iter()
        .find(|m| **m == raw.trim())
        .copied()
        .unwrap_or(DEFAULT_MAP)
}

/// Human duration like "10m", "90s" or "2m 30s". None for zero/unset.
pub fn fmt_time(seconds: Option<u32>) -> Option<String> {
    let secs = seconds?;
    if secs == 0 {
        return None;
    }
    let m = secs / 60;
    let r = secs % 60;
    Some(if m == 0 {
        format!("{r}s")
    } else if r == 0 {
        format!("{m}m")
    } else {
        format!("{m}m {r}s")
    })
}

/// mm:ss clock rendering for countdowns.
pub fn fmt_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// First positive integer embedded in free text, used to recover a target
/// number from an edited how-to-win line.
pub fn parse_first_int(text: &str) -> Option<u32> {
    let mut digits = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            if digits.len() < 6 {
                digits.push(ch);
            }
        } else if !digits.is_empty() {
            break;
        }
    }
    let value: u32 = digits.parse().ok()?;
    (value > 0).then_some(value)
}
