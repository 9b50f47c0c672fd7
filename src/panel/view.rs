//! Discord embed, component and modal builders for the event panels.
//!
//! Everything in here is a pure function from panel state (or a tracker
//! snapshot) to serenity builders; the interaction handlers decide when to
//! render and where to send.

use chrono::{DateTime, Utc};
use serenity::all::{
    ButtonStyle, CreateActionRow, CreateButton, CreateEmbed, CreateInputText, CreateModal,
    CreateSelectMenu, CreateSelectMenuKind, CreateSelectMenuOption, InputTextStyle,
};

use crate::{
    panel::{
        catalog::{fmt_time, EventKey, ALLOWED_MAPS, ALLOWED_REGIONS},
        state::{reminders_text, PanelState, PanelStatus, PanelType},
    },
    tracker::{
        deathmatch::DeathmatchSnapshot, killstreak::KillstreakSnapshot, state::norm, StandingRow,
    },
};

/// Inline spacer so Map/Server render as a two-column row.
const SPACER: &str = "\u{200B}";

fn event_fields(embed: CreateEmbed, state: &PanelState) -> CreateEmbed {
    embed
        .field("Map", state.settings.map.as_str(), true)
        .field("Server", state.settings.region.as_str(), true)
        .field(SPACER, SPACER, true)
        .field("How to Win", state.how_to_win_text(), false)
        .field("Rules", state.rules_text(), false)
        .field("Reminders", reminders_text(), false)
}

/// Staff panel while still in setup.
pub fn setup_embed(state: &PanelState) -> CreateEmbed {
    let Some(key) = state.selected_event_key else {
        return CreateEmbed::new()
            .title("Mini Event Panel")
            .description("Select a mini event below.");
    };

    let embed = CreateEmbed::new().title(format!("{} Event", key.spec().label));
    event_fields(embed, state)
}

/// Public announcement panel.
pub fn public_embed(state: &PanelState) -> CreateEmbed {
    let embed = match state.selected_event_key {
        Some(key) => CreateEmbed::new().title(format!("{} Event", key.spec().label)),
        None => CreateEmbed::new().title("Mini Event Panel"),
    };
    let embed = event_fields(embed, state);

    if state.status == PanelStatus::Ended {
        let reason = state
            .settings
            .ended_reason
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or("ended");
        embed.field("Status", format!("Closed ({reason})"), false)
    } else {
        embed
    }
}

/// Staff panel once the event has been announced or closed.
pub fn staff_locked_embed(state: &PanelState) -> CreateEmbed {
    let embed = match state.selected_event_key {
        Some(key) => CreateEmbed::new().title(format!("{} Event", key.spec().label)),
        None => CreateEmbed::new().title("Mini Event Panel"),
    };

    let embed = if state.status == PanelStatus::Ended {
        let reason = state
            .settings
            .ended_reason
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or("ended");
        embed.field("Status", format!("Event closed ({reason})."), false)
    } else {
        let location = match &state.announced_channel_id {
            Some(id) => format!("<#{id}>"),
            None => "the announcement channel".to_string(),
        };
        embed.field("Announcement", format!("Event posted in {location}."), false)
    };

    if state.selected_event_key.is_some() {
        event_fields(embed, state)
    } else {
        embed
    }
}

/// Embed for a panel message in whatever state it is in.
pub fn panel_embed(state: &PanelState) -> CreateEmbed {
    match (state.panel_type, state.status) {
        (PanelType::Staff, PanelStatus::Setup) => setup_embed(state),
        (PanelType::Staff, _) => staff_locked_embed(state),
        (PanelType::Public, _) => public_embed(state),
    }
}

fn map_select_row(state: &PanelState) -> CreateActionRow {
    let options = ALLOWED_MAPS
        .iter()
        .map(|m| CreateSelectMenuOption::new(*m, *m).default_selection(state.settings.map == *m))
        .collect();

    let menu = CreateSelectMenu::new("evp:map", CreateSelectMenuKind::String { options })
        .placeholder("Select map")
        .min_values(1)
        .max_values(1)
        .disabled(state.selected_event_key.is_none());

    CreateActionRow::SelectMenu(menu)
}

fn region_select_row(state: &PanelState) -> CreateActionRow {
    let options = ALLOWED_REGIONS
        .iter()
        .map(|r| CreateSelectMenuOption::new(*r, *r).default_selection(state.settings.region == *r))
        .collect();

    let menu = CreateSelectMenu::new("evp:region", CreateSelectMenuKind::String { options })
        .placeholder("Select server")
        .min_values(1)
        .max_values(1)
        .disabled(state.selected_event_key.is_none());

    CreateActionRow::SelectMenu(menu)
}

/// Component rows for a panel message.
///
/// Public panels only carry buttons while running; locked staff panels carry
/// none at all.
pub fn panel_components(state: &PanelState) -> Vec<CreateActionRow> {
    if state.panel_type == PanelType::Public {
        if state.status != PanelStatus::Running {
            return Vec::new();
        }

        let mut buttons = vec![CreateButton::new("evp:join")
            .label("Join Event")
            .style(ButtonStyle::Success)];

        let has_game = !state.settings.game_id.trim().is_empty();
        let tracked = matches!(
            state.selected_event_key,
            Some(EventKey::Killstreak) | Some(EventKey::Deathmatch)
        );

        if tracked && has_game {
            buttons.push(
                CreateButton::new("evp:livestats")
                    .label("Live Stats")
                    .style(ButtonStyle::Secondary),
            );

            if state.selected_event_key == Some(EventKey::Deathmatch) {
                let started = state.started_at.is_some();
                buttons.push(
                    CreateButton::new("evp:startgame")
                        .label(if started { "Game Started" } else { "Start Game" })
                        .style(ButtonStyle::Danger)
                        .disabled(started),
                );
            }
        }

        return vec![CreateActionRow::Buttons(buttons)];
    }

    if state.status != PanelStatus::Setup {
        return Vec::new();
    }

    let pick_row = CreateActionRow::Buttons(
        EventKey::ALL
            .iter()
            .map(|key| {
                CreateButton::new(format!("evp:pick:{}", key.as_str()))
                    .label(key.spec().label)
                    .style(ButtonStyle::Primary)
            })
            .collect(),
    );

    let has_event = state.selected_event_key.is_some();
    let control_row = CreateActionRow::Buttons(vec![
        CreateButton::new("evp:edit")
            .label("Edit Rules")
            .style(ButtonStyle::Secondary)
            .disabled(!has_event),
        CreateButton::new("evp:start")
            .label("Start Event")
            .style(ButtonStyle::Danger)
            .disabled(!has_event),
        CreateButton::new("evp:join")
            .label("Join Event")
            .style(ButtonStyle::Success)
            .disabled(true),
    ]);

    vec![
        pick_row,
        map_select_row(state),
        region_select_row(state),
        control_row,
    ]
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Settings modal for the selected event. The panel message id rides in the
/// custom id so the submit handler can find the state again.
pub fn edit_modal(state: &PanelState, key: EventKey) -> CreateModal {
    let link = CreateInputText::new(
        InputTextStyle::Short,
        "Game Link (optional, bot can create)",
        "gameLink",
    )
    .required(false)
    .placeholder("Leave blank to auto-create")
    .value(truncate(&state.settings.game_link, 200));

    let target = CreateInputText::new(
        InputTextStyle::Short,
        "Target Number (optional)",
        "targetNumber",
    )
    .required(false)
    .placeholder("Example: 10")
    .value(
        state
            .settings
            .target_number
            .map(|n| n.to_string())
            .unwrap_or_default(),
    );

    let time_limit = CreateInputText::new(
        InputTextStyle::Short,
        "Time Limit in Seconds (optional)",
        "timeLimitSeconds",
    )
    .required(false)
    .placeholder("Example: 600")
    .value(
        state
            .settings
            .time_limit_seconds
            .map(|n| n.to_string())
            .unwrap_or_default(),
    );

    let how_to_win = CreateInputText::new(
        InputTextStyle::Paragraph,
        "How to Win (optional override)",
        "howToWinOverride",
    )
    .required(false)
    .placeholder("Leave blank to use the default for this event.")
    .value(truncate(&state.settings.how_to_win_override, 1000));

    let rules = CreateInputText::new(
        InputTextStyle::Paragraph,
        "Rules (optional override)",
        "rulesOverride",
    )
    .required(false)
    .placeholder("Leave blank to use the default rules for this event.")
    .value(truncate(&state.settings.rules_override, 1000));

    CreateModal::new(
        format!("evp:modal:{}", state.message_id),
        format!("{} Settings", key.spec().label),
    )
    .components(vec![
        CreateActionRow::InputText(link),
        CreateActionRow::InputText(target),
        CreateActionRow::InputText(time_limit),
        CreateActionRow::InputText(how_to_win),
        CreateActionRow::InputText(rules),
    ])
}

/// K/D with a divide-by-zero guard: no deaths reads as infinite once the
/// player has a kill.
pub fn safe_kd(kills: u32, deaths: u32) -> String {
    if deaths == 0 {
        if kills > 0 {
            "∞".to_string()
        } else {
            "0.00".to_string()
        }
    } else {
        format!("{:.2}", f64::from(kills) / f64::from(deaths))
    }
}

fn present_players_value(rows: &[StandingRow]) -> String {
    let lines: Vec<String> = rows
        .iter()
        .filter(|r| r.present)
        .map(|r| format!("• {}", r.name))
        .collect();
    if lines.is_empty() {
        "—".to_string()
    } else {
        lines.join("\n")
    }
}

/// Live standings for a killstreak game.
pub fn killstreak_live_embed(snapshot: Option<&KillstreakSnapshot>) -> CreateEmbed {
    let embed = CreateEmbed::new().title("Killstreak Live Stats");

    let Some(snap) = snapshot else {
        return embed.field("Players", "—", false).field("Streaks", "—", false);
    };

    let streak_lines: Vec<String> = snap
        .rows
        .iter()
        .filter(|r| r.kills > 0 || r.streak > 0)
        .enumerate()
        .map(|(i, r)| {
            format!(
                "**{:02}. {}**  | streak: **{}** | best: {} | kills: {}",
                i + 1,
                r.name,
                r.streak,
                r.best_streak,
                r.kills
            )
        })
        .collect();
    let streaks = if streak_lines.is_empty() {
        "—".to_string()
    } else {
        streak_lines.join("\n")
    };

    embed
        .field("Players", present_players_value(&snap.rows), false)
        .field("Streaks", streaks, false)
}

fn deathmatch_ends_at(
    snapshot: Option<&DeathmatchSnapshot>,
    started_at: Option<DateTime<Utc>>,
    time_limit_seconds: Option<u32>,
) -> Option<DateTime<Utc>> {
    if let Some(ends_at) = snapshot.and_then(|s| s.ends_at) {
        return Some(ends_at);
    }
    let start = snapshot.and_then(|s| s.started_at).or(started_at)?;
    let limit = time_limit_seconds.filter(|l| *l > 0)?;
    Some(start + chrono::Duration::seconds(i64::from(limit)))
}

/// Live standings for a deathmatch game, with a Discord-rendered countdown
/// when the clock is known.
pub fn deathmatch_live_embed(
    snapshot: Option<&DeathmatchSnapshot>,
    started_at: Option<DateTime<Utc>>,
    time_limit_seconds: Option<u32>,
    now: DateTime<Utc>,
) -> CreateEmbed {
    let mut embed = CreateEmbed::new().title("Deathmatch Live Stats");

    if let Some(ends_at) = deathmatch_ends_at(snapshot, started_at, time_limit_seconds) {
        let unix = ends_at.timestamp();
        let value = if ends_at <= now {
            format!("**Ended:** <t:{unix}:R>\n**Ended at:** <t:{unix}:T>")
        } else {
            format!("**Remaining:** <t:{unix}:R>\n**Ends at:** <t:{unix}:T>")
        };
        embed = embed
            .field("Time Remaining", value, true)
            .field(SPACER, SPACER, true)
            .field(SPACER, SPACER, true);
    }

    let Some(snap) = snapshot else {
        return embed
            .field("Players", "—", false)
            .field("Leaderboard", "—", false);
    };

    let mut rows: Vec<&StandingRow> = snap.rows.iter().filter(|r| !r.name.is_empty()).collect();
    rows.sort_by(|a, b| {
        b.kills
            .cmp(&a.kills)
            .then_with(|| a.deaths.cmp(&b.deaths))
            .then_with(|| norm(&a.name).cmp(&norm(&b.name)))
    });

    let lines: Vec<String> = rows
        .iter()
        .take(10)
        .enumerate()
        .map(|(i, r)| {
            format!(
                "**{:02}. {}** | kills: **{}** | deaths: {} | K/D: {}",
                i + 1,
                r.name,
                r.kills,
                r.deaths,
                safe_kd(r.kills, r.deaths)
            )
        })
        .collect();
    let leaderboard = if lines.is_empty() {
        "—".to_string()
    } else {
        lines.join("\n")
    };

    embed
        .field("Players", present_players_value(&snap.rows), false)
        .field("Leaderboard", leaderboard, false)
}

/// Final results for a finished killstreak event.
pub fn killstreak_final_embed(
    winner_name: &str,
    target: u32,
    standings: &[StandingRow],
) -> CreateEmbed {
    let mut sorted: Vec<&StandingRow> = standings.iter().filter(|r| !r.name.is_empty()).collect();
    sorted.sort_by(|a, b| {
        b.best_streak
            .cmp(&a.best_streak)
            .then_with(|| b.kills.cmp(&a.kills))
            .then_with(|| norm(&a.name).cmp(&norm(&b.name)))
    });

    let winner_key = norm(winner_name);
    let winner = sorted
        .iter()
        .find(|r| !winner_key.is_empty() && norm(&r.name) == winner_key)
        .copied();

    let title = if target > 0 {
        format!("Killstreak Results (First to {target})")
    } else {
        "Killstreak Results".to_string()
    };

    let mut lines = Vec::new();
    match winner {
        Some(row) => lines.push(format!(
            "🏆 **{}** | **WINNER** | best: **{}** | kills: **{}**",
            row.name, row.best_streak, row.kills
        )),
        None => {
            let name = if winner_name.trim().is_empty() {
                "Unknown"
            } else {
                winner_name
            };
            lines.push(format!("🏆 **{name}** | **WINNER** | best: **0** | kills: **0**"));
        }
    }

    let mut place = 2;
    for row in &sorted {
        if !winner_key.is_empty() && norm(&row.name) == winner_key {
            continue;
        }
        lines.push(format!(
            "{place}. {} | best: {} | kills: {}",
            row.name, row.best_streak, row.kills
        ));
        place += 1;
    }

    if sorted.is_empty() {
        lines.push("2. — | best: 0 | kills: 0".to_string());
    }

    CreateEmbed::new().title(title).description(lines.join("\n"))
}

/// Why a deathmatch ended, for the results embed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeathmatchEndReason {
    TargetReached,
    TimeExpired,
}

/// Final results for a finished deathmatch event.
pub fn deathmatch_final_embed(
    winner_name: &str,
    target: u32,
    time_limit_seconds: u32,
    reason: DeathmatchEndReason,
    standings: &[StandingRow],
) -> CreateEmbed {
    let mut sorted: Vec<&StandingRow> = standings.iter().filter(|r| !r.name.is_empty()).collect();
    sorted.sort_by(|a, b| {
        b.kills
            .cmp(&a.kills)
            .then_with(|| a.deaths.cmp(&b.deaths))
            .then_with(|| norm(&a.name).cmp(&norm(&b.name)))
    });

    let winner_key = norm(winner_name);
    let winner = sorted
        .iter()
        .find(|r| !winner_key.is_empty() && norm(&r.name) == winner_key)
        .copied();

    let mut title_parts = Vec::new();
    if target > 0 {
        title_parts.push(format!("First to {target}"));
    }
    if let Some(time) = fmt_time(Some(time_limit_seconds)) {
        title_parts.push(time);
    }
    let title = if title_parts.is_empty() {
        "Deathmatch Results".to_string()
    } else {
        format!("Deathmatch Results ({})", title_parts.join(" • "))
    };

    let by_line = if reason == DeathmatchEndReason::TargetReached {
        format!(" (reached **{target}** kills first)")
    } else {
        String::new()
    };

    let mut lines = Vec::new();
    let (winner_label, winner_kills, winner_deaths) = match winner {
        Some(row) => (row.name.clone(), row.kills, row.deaths),
        None => {
            let name = if winner_name.trim().is_empty() {
                "Unknown".to_string()
            } else {
                winner_name.to_string()
            };
            (name, 0, 0)
        }
    };
    lines.push(format!(
        "🏆 **{}** | **WINNER** | kills: **{}** | deaths: **{}** | K/D: **{}**{}",
        winner_label,
        winner_kills,
        winner_deaths,
        safe_kd(winner_kills, winner_deaths),
        by_line
    ));

    let mut place = 2;
    for row in &sorted {
        if !winner_key.is_empty() && norm(&row.name) == winner_key {
            continue;
        }
        lines.push(format!(
            "{place}. {} | kills: {} | deaths: {} | K/D: {}",
            row.name,
            row.kills,
            row.deaths,
            safe_kd(row.kills, row.deaths)
        ));
        place += 1;
    }

    if sorted.is_empty() {
        lines.push("2. — | kills: 0 | deaths: 0 | K/D: 0.00".to_string());
    }

    CreateEmbed::new().title(title).description(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, kills: u32, deaths: u32, streak: u32, best: u32) -> StandingRow {
        StandingRow {
            name: name.to_string(),
            kills,
            deaths,
            streak,
            best_streak: best,
            last_kill_at: None,
            present: true,
        }
    }

    #[test]
    fn safe_kd_guards_zero_deaths() {
        assert_eq!(safe_kd(5, 0), "∞");
        assert_eq!(safe_kd(0, 0), "0.00");
        assert_eq!(safe_kd(7, 2), "3.50");
    }

    #[test]
    fn setup_embed_without_event_prompts_selection() {
        let state = PanelState::new("g1", "c1", "m1");
        let embed = setup_embed(&state);
        let json = serde_json::to_value(embed).unwrap();
        assert_eq!(json["title"], "Mini Event Panel");
        assert_eq!(json["description"], "Select a mini event below.");
    }

    #[test]
    fn public_ended_embed_shows_close_reason() {
        let mut state = PanelState::new("g1", "c1", "m1");
        state.selected_event_key = Some(EventKey::Killstreak);
        state.panel_type = PanelType::Public;
        state.mark_ended("completed");

        let json = serde_json::to_value(public_embed(&state)).unwrap();
        let fields = json["fields"].as_array().unwrap();
        let status = fields.last().unwrap();
        assert_eq!(status["name"], "Status");
        assert_eq!(status["value"], "Closed (completed)");
    }

    #[test]
    fn public_components_gate_on_running_status() {
        let mut state = PanelState::new("g1", "c1", "m1");
        state.selected_event_key = Some(EventKey::Deathmatch);
        state.settings.game_id = "game-1".to_string();
        let mut public = state.clone_for_public("c2");

        // Running: join + live stats + start game.
        assert_eq!(panel_components(&public).len(), 1);

        public.mark_ended("completed");
        assert!(panel_components(&public).is_empty());
    }

    #[test]
    fn staff_setup_components_have_four_rows() {
        let mut state = PanelState::new("g1", "c1", "m1");
        assert_eq!(panel_components(&state).len(), 4);

        state.status = PanelStatus::Running;
        assert!(panel_components(&state).is_empty());
    }

    #[test]
    fn killstreak_final_orders_by_best_streak() {
        let standings = vec![
            row("Alice", 12, 3, 0, 4),
            row("Bob", 9, 1, 0, 10),
            row("Carol", 2, 5, 0, 2),
        ];

        let json =
            serde_json::to_value(killstreak_final_embed("Bob", 10, &standings)).unwrap();
        assert_eq!(json["title"], "Killstreak Results (First to 10)");

        let desc = json["description"].as_str().unwrap();
        let lines: Vec<&str> = desc.lines().collect();
        assert_eq!(
            lines[0],
            "🏆 **Bob** | **WINNER** | best: **10** | kills: **9**"
        );
        assert_eq!(lines[1], "2. Alice | best: 4 | kills: 12");
        assert_eq!(lines[2], "3. Carol | best: 2 | kills: 2");
    }

    #[test]
    fn killstreak_final_pads_empty_standings() {
        let json = serde_json::to_value(killstreak_final_embed("", 10, &[])).unwrap();
        let desc = json["description"].as_str().unwrap();
        assert!(desc.contains("🏆 **Unknown**"));
        assert!(desc.contains("2. — | best: 0 | kills: 0"));
    }

    #[test]
    fn deathmatch_final_notes_target_reason() {
        let standings = vec![row("Alice", 30, 4, 0, 0), row("Bob", 12, 9, 0, 0)];

        let json = serde_json::to_value(deathmatch_final_embed(
            "Alice",
            30,
            600,
            DeathmatchEndReason::TargetReached,
            &standings,
        ))
        .unwrap();

        assert_eq!(json["title"], "Deathmatch Results (First to 30 • 10m)");
        let desc = json["description"].as_str().unwrap();
        assert!(desc.starts_with(
            "🏆 **Alice** | **WINNER** | kills: **30** | deaths: **4** | K/D: **7.50** (reached **30** kills first)"
        ));
        assert!(desc.contains("2. Bob | kills: 12 | deaths: 9 | K/D: 1.33"));
    }

    #[test]
    fn deathmatch_live_embed_counts_down() {
        let now = Utc::now();
        let embed = deathmatch_live_embed(None, Some(now), Some(600), now);
        let json = serde_json::to_value(embed).unwrap();
        let fields = json["fields"].as_array().unwrap();
        assert_eq!(fields[0]["name"], "Time Remaining");
        assert!(fields[0]["value"]
            .as_str()
            .unwrap()
            .starts_with("**Remaining:**"));
    }
}
