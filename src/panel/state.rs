//! Panel state: the JSON blob persisted per panel message.
//!
//! The serialized field names stay camelCase so blobs written before a
//! deploy keep loading. `hydrate` runs after every deserialize and clamps
//! free-form fields back onto the allowed sets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::panel::catalog::{
    normalize_map, normalize_region, EventKey, DEFAULT_MAP, DEFAULT_REGION,
};

/// Who a panel message is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelType {
    Staff,
    Public,
}

impl PanelType {
    pub fn as_str(self) -> &'static str {
        match self {
            PanelType::Staff => "staff",
            PanelType::Public => "public",
        }
    }
}

/// Lifecycle of a panel message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelStatus {
    Setup,
    Running,
    Ended,
}

impl PanelStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PanelStatus::Setup => "setup",
            PanelStatus::Running => "running",
            PanelStatus::Ended => "ended",
        }
    }
}

/// Staff-editable event settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelSettings {
    pub game_link: String,
    pub game_id: String,
    pub target_number: Option<u32>,
    pub time_limit_seconds: Option<u32>,
    pub how_to_win_override: String,
    pub rules_override: String,
    pub region: String,
    pub map: String,
    /// Last lock state staff set through the control panel. None until
    /// toggled; the live lobby is still the source of truth.
    pub control_lobby_locked: Option<bool>,
    pub ended_reason: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            game_link: String::new(),
            game_id: String::new(),
            target_number: None,
            time_limit_seconds: None,
            how_to_win_override: String::new(),
            rules_override: String::new(),
            region: DEFAULT_REGION.to_string(),
            map: DEFAULT_MAP.to_string(),
            control_lobby_locked: None,
            ended_reason: None,
            ended_at: None,
        }
    }
}

/// An event key that may have been written by an older or newer build;
/// unknown values load as None instead of failing the whole blob.
fn de_event_key<'de, D>(deserializer: D) -> Result<Option<EventKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(EventKey::parse))
}

/// Full state of one panel message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelState {
    pub guild_id: String,
    pub channel_id: String,
    pub message_id: String,
    pub panel_type: PanelType,
    pub status: PanelStatus,
    #[serde(default, deserialize_with = "de_event_key")]
    pub selected_event_key: Option<EventKey>,
    #[serde(default)]
    pub settings: PanelSettings,
    #[serde(default)]
    pub announced_channel_id: Option<String>,
    #[serde(default)]
    pub announced_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_by: Option<String>,
}

impl PanelState {
    /// Fresh staff panel in setup status.
    pub fn new(guild_id: &str, channel_id: &str, message_id: &str) -> Self {
        let now = Utc::now();
        Self {
            guild_id: guild_id.to_string(),
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
            panel_type: PanelType::Staff,
            status: PanelStatus::Setup,
            selected_event_key: None,
            settings: PanelSettings::default(),
            announced_channel_id: None,
            announced_message_id: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            started_by: None,
        }
    }

    /// Clamps free-form fields onto the allowed sets after a load.
    pub fn hydrate(mut self) -> Self {
        self.settings.region = normalize_region(&self.settings.region).to_string();
        self.settings.map = normalize_map(&self.settings.map).to_string();
        self
    }

    /// Fills unset target/time-limit from the selected event's defaults.
    pub fn normalize_for_event(&mut self) {
        let Some(spec) = self.selected_event_key.map(|k| k.spec()) else {
            return;
        };
        if self.settings.target_number.is_none() {
            self.settings.target_number = spec.default_target;
        }
        if self.settings.time_limit_seconds.is_none() {
            self.settings.time_limit_seconds = spec.default_time_limit_seconds;
        }
    }

    /// Public announcement copy of a staff panel. The message id is filled in
    /// once the announcement message exists.
    pub fn clone_for_public(&self, channel_id: &str) -> Self {
        let mut public = self.clone();
        public.channel_id = channel_id.to_string();
        public.message_id = "pending".to_string();
        public.panel_type = PanelType::Public;
        public.status = PanelStatus::Running;
        public.announced_channel_id = None;
        public.announced_message_id = None;
        public.updated_at = Utc::now();
        public
    }

    /// Marks the panel ended with the given reason.
    pub fn mark_ended(&mut self, reason: &str) {
        let now = Utc::now();
        self.status = PanelStatus::Ended;
        self.settings.ended_reason = Some(reason.to_string());
        self.settings.ended_at = Some(now);
        self.updated_at = now;
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// How-to-win text: the staff override when set, else the event default.
    pub fn how_to_win_text(&self) -> String {
        let override_text = self.settings.how_to_win_override.trim();
        if !override_text.is_empty() {
            return override_text.to_string();
        }
        match self.selected_event_key {
            Some(key) => key.spec().base_how_to_win(
                self.settings.target_number,
                self.settings.time_limit_seconds,
            ),
            None => String::new(),
        }
    }

    /// Rules text: the staff override when set, else the event's base rules
    /// as bullets with a time-limit line appended when one is configured.
    pub fn rules_text(&self) -> String {
        let override_text = self.settings.rules_override.trim();
        if !override_text.is_empty() {
            return override_text.to_string();
        }
        let Some(spec) = self.selected_event_key.map(|k| k.spec()) else {
            return String::new();
        };

        let mut rules: Vec<String> = spec.base_rules.iter().map(|r| r.to_string()).collect();
        if let Some(time) = crate::panel::catalog::fmt_time(self.settings.time_limit_seconds) {
            rules.push(format!("Time limit: {time}"));
        }

        rules
            .iter()
            .map(|r| format!("• {r}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Reminder lines shown on every event panel.
pub fn reminders_text() -> String {
    [
        "• Players with Must Screenshare and/or Hacker Tagged must screenshare their gameplay",
        "↳ Failure to comply will result in not participating.",
        "• Event Hostess and Owners cannot win their own event",
        "↳ If an owner is participating in an event hosted by an Event Hostess, that is allowed.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hydrate_clamps_region_and_map() {
        let mut state = PanelState::new("g1", "c1", "m1");
        state.settings.region = "australia".to_string();
        state.settings.map = "volcano".to_string();

        let state = state.hydrate();
        assert_eq!(state.settings.region, DEFAULT_REGION);
        assert_eq!(state.settings.map, DEFAULT_MAP);
    }

    #[test]
    fn unknown_event_key_loads_as_none() {
        let raw = serde_json::json!({
            "guildId": "g1",
            "channelId": "c1",
            "messageId": "m1",
            "panelType": "staff",
            "status": "setup",
            "selectedEventKey": "capture_the_flag",
            "createdAt": "2026-08-01T00:00:00Z",
            "updatedAt": "2026-08-01T00:00:00Z"
        });

        let state: PanelState = serde_json::from_value(raw).unwrap();
        assert_eq!(state.selected_event_key, None);
        assert_eq!(state.settings, PanelSettings::default());
    }

    #[test]
    fn normalize_for_event_fills_defaults_without_clobbering() {
        let mut state = PanelState::new("g1", "c1", "m1");
        state.selected_event_key = Some(EventKey::Deathmatch);
        state.settings.target_number = Some(50);

        state.normalize_for_event();
        assert_eq!(state.settings.target_number, Some(50));
        assert_eq!(state.settings.time_limit_seconds, Some(600));
    }

    #[test]
    fn clone_for_public_resets_identity() {
        let mut staff = PanelState::new("g1", "c1", "m1");
        staff.selected_event_key = Some(EventKey::Killstreak);
        staff.announced_channel_id = Some("c9".to_string());

        let public = staff.clone_for_public("c2");
        assert_eq!(public.panel_type, PanelType::Public);
        assert_eq!(public.status, PanelStatus::Running);
        assert_eq!(public.channel_id, "c2");
        assert_eq!(public.message_id, "pending");
        assert_eq!(public.announced_channel_id, None);
        // Staff panel is untouched.
        assert_eq!(staff.status, PanelStatus::Setup);
    }

    #[test]
    fn rules_text_appends_time_limit_bullet() {
        let mut state = PanelState::new("g1", "c1", "m1");
        state.selected_event_key = Some(EventKey::Deathmatch);
        state.settings.time_limit_seconds = Some(600);

        assert_eq!(
            state.rules_text(),
            "• Any guns allowed unless staff restricts it.\n• Time limit: 10m"
        );
    }

    #[test]
    fn overrides_win_over_defaults() {
        let mut state = PanelState::new("g1", "c1", "m1");
        state.selected_event_key = Some(EventKey::Killstreak);
        state.settings.how_to_win_override = "First to tag the hostess".to_string();
        state.settings.rules_override = "No snipers".to_string();

        assert_eq!(state.how_to_win_text(), "First to tag the hostess");
        assert_eq!(state.rules_text(), "No snipers");
    }

    #[test]
    fn state_json_round_trips_with_camel_case() {
        let mut state = PanelState::new("g1", "c1", "m1");
        state.selected_event_key = Some(EventKey::BattleRoyale);
        state.settings.target_number = Some(5);

        let raw = serde_json::to_value(&state).unwrap();
        assert_eq!(raw["selectedEventKey"], "battle_royale");
        assert_eq!(raw["settings"]["targetNumber"], 5);

        let back: PanelState = serde_json::from_value(raw).unwrap();
        assert_eq!(back, state);
    }
}
