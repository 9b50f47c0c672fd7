//! The event control panel: staff tooling for whichever event is currently
//! playing in the guild.
//!
//! The panel message carries no event identity of its own. Every action
//! resolves the active event from the database at click time, so a panel
//! posted before a restart keeps working. Only the remake draft (mode plus
//! map/server selections) lives in memory, keyed by the panel message id.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::Utc;
use serenity::all::{
    ActionRowComponent, ButtonStyle, ChannelId, ComponentInteraction,
    ComponentInteractionDataKind, Context, CreateActionRow, CreateButton, CreateEmbed,
    CreateInputText, CreateInteractionResponse, CreateInteractionResponseMessage, CreateMessage,
    CreateModal, CreateSelectMenu, CreateSelectMenuKind, CreateSelectMenuOption, EditMessage,
    Http, InputTextStyle, Message, MessageId, ModalInteraction, UserId,
};

use crate::{
    data::panel_state::EventPanelRepository,
    error::AppError,
    panel::{
        catalog::{fmt_clock, fmt_time, normalize_map, normalize_region, EventKey, ALLOWED_MAPS, ALLOWED_REGIONS},
        event_panel::{
            self, active_event_bundle, auto_create_game, linked_staff_states,
            update_panel_message, wire_win_detection, EventBundle,
        },
        live,
        state::{PanelState, PanelStatus},
    },
    state::AppContext,
};

/// What the control panel is currently showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlMode {
    Main,
    Remake,
}

/// Per-panel draft state. Everything durable lives in the database.
#[derive(Clone, Debug)]
pub struct ControlSession {
    pub guild_id: String,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub mode: ControlMode,
    pub selected_map: String,
    pub selected_region: String,
}

/// Registry of control panel sessions, keyed by panel message id.
#[derive(Default)]
pub struct ControlSessions {
    sessions: Mutex<HashMap<String, ControlSession>>,
}

impl ControlSessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ControlSession>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, message_id: &str) -> Option<ControlSession> {
        self.lock().get(message_id).cloned()
    }

    pub fn insert(&self, session: ControlSession) {
        self.lock()
            .insert(session.message_id.to_string(), session);
    }

    /// Applies `f` to the session and returns the updated copy.
    pub fn update(
        &self,
        message_id: &str,
        f: impl FnOnce(&mut ControlSession),
    ) -> Option<ControlSession> {
        let mut sessions = self.lock();
        let session = sessions.get_mut(message_id)?;
        f(session);
        Some(session.clone())
    }

    pub fn remove(&self, message_id: &str) {
        self.lock().remove(message_id);
    }
}

/// Live numbers shown on the panel, best-effort from the in-memory runtime.
struct ControlRuntime {
    player_count: usize,
    locked: Option<bool>,
    timer_text: String,
}

fn control_runtime(app: &AppContext, public: &PanelState) -> ControlRuntime {
    let game_id = public.settings.game_id.trim();
    let key = public.selected_event_key;
    let now = Utc::now();

    let snapshot_count = match key {
        Some(EventKey::Deathmatch) => app
            .deathmatch
            .snapshot(game_id, 25)
            .map(|s| s.present_count),
        _ => app.killstreak.snapshot(game_id, 25).map(|s| s.present_count),
    };

    let in_lobby = app
        .game
        .current_game()
        .is_some_and(|g| g.id == game_id);

    let player_count = snapshot_count.unwrap_or_else(|| {
        if in_lobby {
            app.game.players().len().saturating_sub(1)
        } else {
            0
        }
    });

    let timer_text = if key == Some(EventKey::Deathmatch) {
        match public.started_at {
            None => "Waiting".to_string(),
            Some(started) => {
                let ends_at = app
                    .deathmatch
                    .ends_at(game_id)
                    .or_else(|| {
                        public
                            .settings
                            .time_limit_seconds
                            .map(|limit| started + chrono::Duration::seconds(limit as i64))
                    });
                match ends_at {
                    Some(ends) if ends > now => {
                        let left = (ends - now).num_seconds().max(0) as u32;
                        format!("Running • {} left", fmt_clock(left))
                    }
                    Some(_) => "Ended".to_string(),
                    None => {
                        let elapsed = (now - started).num_seconds().max(0) as u32;
                        format!("Running • {}", fmt_clock(elapsed))
                    }
                }
            }
        }
    } else {
        match public.started_at {
            Some(started) => {
                let elapsed = (now - started).num_seconds().max(0) as u32;
                format!("Running • {}", fmt_clock(elapsed))
            }
            None => "Running".to_string(),
        }
    };

    ControlRuntime {
        player_count,
        locked: public.settings.control_lobby_locked,
        timer_text,
    }
}

fn control_embed(
    app: &AppContext,
    session: &ControlSession,
    bundle: Option<&EventBundle>,
) -> CreateEmbed {
    let embed = CreateEmbed::new().title("Event Control");

    let Some(bundle) = bundle else {
        return embed.description("There is no event playing.").field(
            "Status",
            "Idle",
            true,
        );
    };

    let public = &bundle.public_state;
    let runtime = control_runtime(app, public);

    let event_label = public
        .selected_event_key
        .map(|k| k.spec().label)
        .unwrap_or("—");
    let status = match public.status {
        PanelStatus::Running => "In Progress",
        PanelStatus::Ended => "Ended",
        PanelStatus::Setup => "Idle",
    };
    let lobby = match runtime.locked {
        Some(true) => "Locked",
        Some(false) => "Unlocked",
        None => "Unknown",
    };
    let time_limit = fmt_time(public.settings.time_limit_seconds).unwrap_or_else(|| "—".to_string());
    let target = public
        .settings
        .target_number
        .map(|n| n.to_string())
        .unwrap_or_else(|| "—".to_string());

    let mut embed = embed
        .description("Staff controls for the active event.")
        .field("Event", event_label, true)
        .field("Status", status, true)
        .field("Lobby", lobby, true)
        .field("Map", public.settings.map.clone(), true)
        .field("Server", public.settings.region.clone(), true)
        .field("Timer", runtime.timer_text, true)
        .field("Target", target, true)
        .field("Time Limit", time_limit, true)
        .field("Players", runtime.player_count.to_string(), true);

    if session.mode == ControlMode::Remake {
        embed = embed.field(
            "Remake Draft",
            format!(
                "Map: {}\nServer: {}",
                session.selected_map, session.selected_region
            ),
            false,
        );
    }

    embed
}

fn remake_map_row(session: &ControlSession) -> CreateActionRow {
    let options = ALLOWED_MAPS
        .iter()
        .map(|m| CreateSelectMenuOption::new(*m, *m).default_selection(session.selected_map == *m))
        .collect();

    CreateActionRow::SelectMenu(
        CreateSelectMenu::new("evc:remake:map", CreateSelectMenuKind::String { options })
            .placeholder("Select map")
            .min_values(1)
            .max_values(1),
    )
}

fn remake_region_row(session: &ControlSession) -> CreateActionRow {
    let options = ALLOWED_REGIONS
        .iter()
        .map(|r| {
            CreateSelectMenuOption::new(*r, *r).default_selection(session.selected_region == *r)
        })
        .collect();

    CreateActionRow::SelectMenu(
        CreateSelectMenu::new("evc:remake:region", CreateSelectMenuKind::String { options })
            .placeholder("Select server")
            .min_values(1)
            .max_values(1),
    )
}

fn control_components(
    session: &ControlSession,
    bundle: Option<&EventBundle>,
) -> Vec<CreateActionRow> {
    let Some(bundle) = bundle else {
        return vec![CreateActionRow::Buttons(vec![CreateButton::new(
            "evc:refresh",
        )
        .label("Refresh")
        .style(ButtonStyle::Secondary)])];
    };

    if session.mode == ControlMode::Remake {
        return vec![
            remake_map_row(session),
            remake_region_row(session),
            CreateActionRow::Buttons(vec![
                CreateButton::new("evc:remake:confirm")
                    .label("Confirm Remake")
                    .style(ButtonStyle::Primary),
                CreateButton::new("evc:remake:cancel")
                    .label("Cancel")
                    .style(ButtonStyle::Secondary),
                CreateButton::new("evc:refresh")
                    .label("Refresh")
                    .style(ButtonStyle::Secondary),
            ]),
        ];
    }

    let locked = bundle.public_state.settings.control_lobby_locked == Some(true);
    vec![
        CreateActionRow::Buttons(vec![
            CreateButton::new("evc:refresh")
                .label("Refresh")
                .style(ButtonStyle::Secondary),
            CreateButton::new("evc:reset")
                .label("Reset Event")
                .style(ButtonStyle::Danger),
            CreateButton::new("evc:remake")
                .label("Remake Event")
                .style(ButtonStyle::Primary),
        ]),
        CreateActionRow::Buttons(vec![
            CreateButton::new("evc:kick")
                .label("Kick Player")
                .style(ButtonStyle::Secondary),
            CreateButton::new("evc:chat")
                .label("Send Message")
                .style(ButtonStyle::Secondary),
            CreateButton::new("evc:locktoggle")
                .label(if locked { "Unlock Lobby" } else { "Lock Lobby" })
                .style(ButtonStyle::Secondary),
        ]),
    ]
}

/// Edits the control panel message to reflect the current event and session.
async fn render_control_panel(
    app: &Arc<AppContext>,
    http: &Http,
    session: &ControlSession,
) -> Result<(), AppError> {
    let bundle = active_event_bundle(app, &session.guild_id).await?;

    session
        .channel_id
        .edit_message(
            http,
            session.message_id,
            EditMessage::new()
                .embed(control_embed(app, session, bundle.as_ref()))
                .components(control_components(session, bundle.as_ref())),
        )
        .await?;
    Ok(())
}

/// Posts a fresh control panel for the `-controlevent` command.
pub async fn send_control_panel(
    app: &Arc<AppContext>,
    ctx: &Context,
    message: &Message,
) -> Result<(), AppError> {
    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };

    let bundle = active_event_bundle(app, &guild_id.to_string()).await?;

    let mut session = ControlSession {
        guild_id: guild_id.to_string(),
        channel_id: message.channel_id,
        message_id: MessageId::new(1),
        mode: ControlMode::Main,
        selected_map: bundle
            .as_ref()
            .map(|b| b.public_state.settings.map.clone())
            .unwrap_or_default(),
        selected_region: bundle
            .as_ref()
            .map(|b| b.public_state.settings.region.clone())
            .unwrap_or_default(),
    };

    let sent = message
        .channel_id
        .send_message(
            &ctx.http,
            CreateMessage::new()
                .embed(control_embed(app, &session, bundle.as_ref()))
                .components(control_components(&session, bundle.as_ref())),
        )
        .await;

    let panel_message = match sent {
        Ok(m) => m,
        Err(err) => {
            tracing::warn!("Failed to post control panel: {err}");
            message
                .reply(&ctx.http, "Couldn't create the control panel.")
                .await?;
            return Ok(());
        }
    };

    session.message_id = panel_message.id;
    app.control_sessions.insert(session);
    Ok(())
}

async fn reply_ephemeral(
    ctx: &Context,
    interaction: &ComponentInteraction,
    content: impl Into<String>,
) -> Result<(), AppError> {
    interaction
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

async fn defer_ephemeral(
    ctx: &Context,
    interaction: &ComponentInteraction,
) -> Result<(), AppError> {
    interaction
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(
                CreateInteractionResponseMessage::new().ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

async fn edit_reply(
    ctx: &Context,
    interaction: &ComponentInteraction,
    content: impl Into<String>,
) -> Result<(), AppError> {
    interaction
        .edit_response(
            &ctx.http,
            serenity::all::EditInteractionResponse::new().content(content),
        )
        .await?;
    Ok(())
}

/// Routes `evc:` component interactions.
pub async fn handle_component(
    app: &Arc<AppContext>,
    ctx: &Context,
    interaction: &ComponentInteraction,
) -> Result<(), AppError> {
    let staff_ok = match (interaction.guild_id, interaction.member.as_ref()) {
        (Some(guild_id), Some(member)) => {
            event_panel::can_use_control_panel(app, guild_id, member)
        }
        _ => false,
    };
    if !staff_ok {
        return reply_ephemeral(ctx, interaction, "Staff-only controls.").await;
    }

    let message_key = interaction.message.id.to_string();
    let Some(session) = app.control_sessions.get(&message_key) else {
        return reply_ephemeral(ctx, interaction, "Control panel expired. Run -controlevent again.")
            .await;
    };

    let custom_id = interaction.data.custom_id.as_str();

    if custom_id == "evc:refresh" {
        interaction
            .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
            .await?;
        return render_control_panel(app, &ctx.http, &session).await;
    }

    if let ComponentInteractionDataKind::StringSelect { values } = &interaction.data.kind {
        let chosen = values.first().map(String::as_str).unwrap_or("");
        let updated = match custom_id {
            "evc:remake:map" => app.control_sessions.update(&message_key, |s| {
                s.selected_map = normalize_map(chosen).to_string();
                s.mode = ControlMode::Remake;
            }),
            "evc:remake:region" => app.control_sessions.update(&message_key, |s| {
                s.selected_region = normalize_region(chosen).to_string();
                s.mode = ControlMode::Remake;
            }),
            _ => None,
        };

        let Some(updated) = updated else {
            return reply_ephemeral(ctx, interaction, "Unknown control action.").await;
        };
        interaction
            .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
            .await?;
        return render_control_panel(app, &ctx.http, &updated).await;
    }

    let bundle = active_event_bundle(app, &session.guild_id).await?;
    let Some(bundle) = bundle else {
        reply_ephemeral(ctx, interaction, "There is no event playing.").await?;
        return render_control_panel(app, &ctx.http, &session).await;
    };

    match custom_id {
        "evc:remake" => {
            let updated = app
                .control_sessions
                .update(&message_key, |s| {
                    s.mode = ControlMode::Remake;
                    s.selected_map = bundle.public_state.settings.map.clone();
                    s.selected_region = bundle.public_state.settings.region.clone();
                })
                .unwrap_or(session);
            interaction
                .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
                .await?;
            render_control_panel(app, &ctx.http, &updated).await
        }
        "evc:remake:cancel" => {
            let updated = app
                .control_sessions
                .update(&message_key, |s| s.mode = ControlMode::Main)
                .unwrap_or(session);
            interaction
                .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
                .await?;
            render_control_panel(app, &ctx.http, &updated).await
        }
        "evc:remake:confirm" => {
            defer_ephemeral(ctx, interaction).await?;

            let map = normalize_map(&session.selected_map).to_string();
            let region = normalize_region(&session.selected_region).to_string();
            let result = remake_running_event(
                app,
                &ctx.http,
                &bundle.public_state.message_id,
                &region,
                &map,
                interaction.user.id,
            )
            .await;

            let updated = app
                .control_sessions
                .update(&message_key, |s| s.mode = ControlMode::Main)
                .unwrap_or(session);
            if let Err(err) = render_control_panel(app, &ctx.http, &updated).await {
                tracing::warn!("Failed to refresh control panel: {err}");
            }

            match result {
                Ok(()) => edit_reply(ctx, interaction, "Event remade with a fresh lobby.").await,
                Err(err) => edit_reply(ctx, interaction, format!("Remake failed: {err}")).await,
            }
        }
        "evc:reset" => {
            defer_ephemeral(ctx, interaction).await?;

            let result = reset_running_event(
                app,
                &ctx.http,
                &bundle.public_state.message_id,
                interaction.user.id,
            )
            .await;

            if let Err(err) = render_control_panel(app, &ctx.http, &session).await {
                tracing::warn!("Failed to refresh control panel: {err}");
            }

            match result {
                Ok(ResetOutcome::Reset) => edit_reply(ctx, interaction, "Event reset.").await,
                Ok(ResetOutcome::RemadeFallback) => {
                    edit_reply(
                        ctx,
                        interaction,
                        "Reset isn't supported by this gamemode runtime, so the event was remade instead.",
                    )
                    .await
                }
                Err(err) => edit_reply(ctx, interaction, format!("Reset failed: {err}")).await,
            }
        }
        "evc:kick" => {
            let input = CreateInputText::new(InputTextStyle::Short, "Player Name", "playerName")
                .required(true)
                .placeholder("Exact player name");
            let modal = CreateModal::new(
                format!("evc:modal:kick:{}", session.message_id),
                "Kick or Boot Player",
            )
            .components(vec![CreateActionRow::InputText(input)]);
            interaction
                .create_response(&ctx.http, CreateInteractionResponse::Modal(modal))
                .await?;
            Ok(())
        }
        "evc:chat" => {
            let input =
                CreateInputText::new(InputTextStyle::Paragraph, "Message", "chatMessage")
                    .required(true)
                    .max_length(180)
                    .placeholder("Message to send in game chat");
            let modal = CreateModal::new(
                format!("evc:modal:chat:{}", session.message_id),
                "Send In-Game Message",
            )
            .components(vec![CreateActionRow::InputText(input)]);
            interaction
                .create_response(&ctx.http, CreateInteractionResponse::Modal(modal))
                .await?;
            Ok(())
        }
        "evc:locktoggle" => {
            defer_ephemeral(ctx, interaction).await?;

            let game_id = bundle.public_state.settings.game_id.trim().to_string();
            let current = bundle
                .public_state
                .settings
                .control_lobby_locked
                .unwrap_or(false);
            let desired = !current;

            let in_lobby = app.game.current_game().is_some_and(|g| g.id == game_id);
            let locked = if in_lobby {
                app.game.set_locked(desired).await
            } else {
                Err(crate::game::client::GameError::NotInGame)
            };

            match locked {
                Ok(locked) => {
                    persist_lock_state(app, &ctx.http, &bundle.public_state.message_id, locked)
                        .await?;
                    if let Err(err) = render_control_panel(app, &ctx.http, &session).await {
                        tracing::warn!("Failed to refresh control panel: {err}");
                    }
                    edit_reply(
                        ctx,
                        interaction,
                        if locked { "Lobby locked." } else { "Lobby unlocked." },
                    )
                    .await
                }
                Err(err) => {
                    tracing::warn!("Lock toggle failed: {err}");
                    edit_reply(
                        ctx,
                        interaction,
                        "Couldn't change lobby lock state. The gamemode runtime doesn't expose a lock/unlock hook yet.",
                    )
                    .await
                }
            }
        }
        _ => reply_ephemeral(ctx, interaction, "Unknown control action.").await,
    }
}

async fn persist_lock_state(
    app: &Arc<AppContext>,
    http: &Http,
    public_message_id: &str,
    locked: bool,
) -> Result<(), AppError> {
    let repo = EventPanelRepository::new(&app.db);
    let Some(mut public) = repo.get_by_message_id(public_message_id).await? else {
        return Ok(());
    };

    public.settings.control_lobby_locked = Some(locked);
    public.touch();
    repo.save(&public).await?;

    for mut staff in linked_staff_states(app, &public).await? {
        staff.settings.control_lobby_locked = Some(locked);
        staff.touch();
        repo.save(&staff).await?;
    }

    if let Err(err) = update_panel_message(http, &public).await {
        tracing::warn!("Failed to refresh public panel: {err}");
    }
    Ok(())
}

/// How a reset request was actually carried out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetOutcome {
    Reset,
    /// The tracker had nothing to reset, so a fresh lobby was made instead.
    RemadeFallback,
}

/// Tears down the running event's lobby and starts a fresh one with the
/// given map and server, keeping the same panels.
pub async fn remake_running_event(
    app: &Arc<AppContext>,
    http: &Arc<Http>,
    public_message_id: &str,
    region: &str,
    map: &str,
    actor: UserId,
) -> Result<(), AppError> {
    let repo = EventPanelRepository::new(&app.db);
    let Some(mut public) = repo.get_by_message_id(public_message_id).await? else {
        return Err(AppError::NotFound("event is no longer tracked".to_string()));
    };
    let Some(key) = public.selected_event_key else {
        return Err(AppError::InvalidInput("no event selected".to_string()));
    };

    let old_game_id = public.settings.game_id.trim().to_string();

    public.settings.region = normalize_region(region).to_string();
    public.settings.map = normalize_map(map).to_string();

    let info = auto_create_game(app, key, &public, actor).await?;

    public.settings.game_id = info.id.clone();
    public.settings.game_link = info.link();
    public.settings.control_lobby_locked = None;
    if key == EventKey::Deathmatch {
        public.started_at = None;
        public.started_by = None;
    } else {
        public.started_at = Some(Utc::now());
        public.started_by = Some(actor.to_string());
    }
    public.touch();
    repo.save(&public).await?;

    for mut staff in linked_staff_states(app, &public).await? {
        staff.settings.region = public.settings.region.clone();
        staff.settings.map = public.settings.map.clone();
        staff.settings.game_id = public.settings.game_id.clone();
        staff.settings.game_link = public.settings.game_link.clone();
        staff.settings.control_lobby_locked = None;
        staff.started_at = public.started_at;
        staff.started_by = public.started_by.clone();
        staff.touch();
        repo.save(&staff).await?;
        if let Err(err) = update_panel_message(http, &staff).await {
            tracing::warn!("Failed to refresh staff panel: {err}");
        }
    }

    if let Err(err) = update_panel_message(http, &public).await {
        tracing::warn!("Failed to refresh public panel: {err}");
    }

    if !old_game_id.is_empty() && old_game_id != public.settings.game_id {
        live::stop_and_delete_if_matches(app, http, &public.guild_id, &old_game_id).await;
        app.killstreak.unarm(&old_game_id);
        app.deathmatch.unarm(&old_game_id);
        app.killstreak.clear_game(&old_game_id);
        app.deathmatch.clear_game(&old_game_id);
    }

    wire_win_detection(app, http, &mut public).await
}

/// Resets the running event's scoreboard in place when the tracker supports
/// it, falling back to a remake with the same map and server.
pub async fn reset_running_event(
    app: &Arc<AppContext>,
    http: &Arc<Http>,
    public_message_id: &str,
    actor: UserId,
) -> Result<ResetOutcome, AppError> {
    let repo = EventPanelRepository::new(&app.db);
    let Some(mut public) = repo.get_by_message_id(public_message_id).await? else {
        return Err(AppError::NotFound("event is no longer tracked".to_string()));
    };
    let Some(key) = public.selected_event_key else {
        return Err(AppError::InvalidInput("no event selected".to_string()));
    };

    let game_id = public.settings.game_id.trim().to_string();
    let now = Utc::now();

    let reset_ok = match key {
        EventKey::Killstreak => app.killstreak.reset(&game_id, now),
        EventKey::Deathmatch => app.deathmatch.reset(&game_id, now),
        EventKey::BattleRoyale | EventKey::HideSeek => false,
    };

    if !reset_ok {
        let region = public.settings.region.clone();
        let map = public.settings.map.clone();
        remake_running_event(app, http, public_message_id, &region, &map, actor).await?;
        return Ok(ResetOutcome::RemadeFallback);
    }

    if key == EventKey::Deathmatch {
        public.started_at = None;
        public.started_by = None;
    } else {
        public.started_at = Some(now);
    }
    public.settings.control_lobby_locked = None;
    public.touch();
    repo.save(&public).await?;

    for mut staff in linked_staff_states(app, &public).await? {
        staff.started_at = public.started_at;
        staff.started_by = public.started_by.clone();
        staff.settings.control_lobby_locked = None;
        staff.touch();
        repo.save(&staff).await?;
        if let Err(err) = update_panel_message(http, &staff).await {
            tracing::warn!("Failed to refresh staff panel: {err}");
        }
    }

    if let Err(err) = update_panel_message(http, &public).await {
        tracing::warn!("Failed to refresh public panel: {err}");
    }

    wire_win_detection(app, http, &mut public).await?;
    Ok(ResetOutcome::Reset)
}

fn modal_value(interaction: &ModalInteraction, id: &str) -> String {
    for row in &interaction.data.components {
        for component in &row.components {
            if let ActionRowComponent::InputText(input) = component {
                if input.custom_id == id {
                    return input.value.clone().unwrap_or_default();
                }
            }
        }
    }
    String::new()
}

/// Handles the kick and chat modals (`evc:modal:kick:*`, `evc:modal:chat:*`).
pub async fn handle_modal(
    app: &Arc<AppContext>,
    ctx: &Context,
    interaction: &ModalInteraction,
) -> Result<(), AppError> {
    let reply = |content: String| {
        interaction.create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
    };

    let staff_ok = match (interaction.guild_id, interaction.member.as_ref()) {
        (Some(guild_id), Some(member)) => {
            event_panel::can_use_control_panel(app, guild_id, member)
        }
        _ => false,
    };
    if !staff_ok {
        reply("Staff-only modal.".to_string()).await?;
        return Ok(());
    }

    let Some(guild_id) = interaction.guild_id else {
        reply("Staff-only modal.".to_string()).await?;
        return Ok(());
    };

    let custom_id = interaction.data.custom_id.clone();
    let action = if custom_id.starts_with("evc:modal:kick:") {
        "kick"
    } else if custom_id.starts_with("evc:modal:chat:") {
        "chat"
    } else {
        reply("Unknown control modal action.".to_string()).await?;
        return Ok(());
    };

    let Some(bundle) = active_event_bundle(app, &guild_id.to_string()).await? else {
        reply("There is no event playing.".to_string()).await?;
        return Ok(());
    };
    let game_id = bundle.public_state.settings.game_id.trim().to_string();
    let in_lobby = app.game.current_game().is_some_and(|g| g.id == game_id);

    match action {
        "chat" => {
            let message = modal_value(interaction, "chatMessage").trim().to_string();
            if message.is_empty() {
                reply("Message cannot be empty.".to_string()).await?;
                return Ok(());
            }

            let sent = if in_lobby {
                app.game.send_chat(&message).await
            } else {
                Err(crate::game::client::GameError::NotInGame)
            };

            match sent {
                Ok(()) => reply("Message sent in-game.".to_string()).await?,
                Err(err) => {
                    tracing::warn!("In-game chat failed: {err}");
                    reply(
                        "Couldn't send the in-game message. The gamemode runtime doesn't expose a chat hook yet."
                            .to_string(),
                    )
                    .await?;
                }
            }
        }
        _ => {
            let player_name = modal_value(interaction, "playerName").trim().to_string();
            if player_name.is_empty() {
                reply("Player name is required.".to_string()).await?;
                return Ok(());
            }

            let kicked = if in_lobby {
                app.game.kick_player(&player_name).await
            } else {
                Err(crate::game::client::GameError::NotInGame)
            };

            match kicked {
                Ok(()) => {
                    reply(format!(
                        "Player kick/boot command sent for \"{player_name}\"."
                    ))
                    .await?;
                }
                Err(err) => {
                    tracing::warn!("Player kick failed: {err}");
                    reply(
                        "Couldn't kick that player. The gamemode runtime doesn't expose a kick/boot hook yet."
                            .to_string(),
                    )
                    .await?;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(message_id: u64) -> ControlSession {
        ControlSession {
            guild_id: "g1".to_string(),
            channel_id: ChannelId::new(10),
            message_id: MessageId::new(message_id),
            mode: ControlMode::Main,
            selected_map: "cluckgrounds".to_string(),
            selected_region: "uscentral".to_string(),
        }
    }

    #[test]
    fn sessions_update_in_place() {
        let sessions = ControlSessions::new();
        sessions.insert(session(100));

        let updated = sessions
            .update("100", |s| {
                s.mode = ControlMode::Remake;
                s.selected_map = "castle".to_string();
            })
            .unwrap();
        assert_eq!(updated.mode, ControlMode::Remake);
        assert_eq!(sessions.get("100").unwrap().selected_map, "castle");

        assert!(sessions.update("999", |_| {}).is_none());
    }

    #[test]
    fn sessions_remove_forgets_the_panel() {
        let sessions = ControlSessions::new();
        sessions.insert(session(100));
        sessions.remove("100");
        assert!(sessions.get("100").is_none());
    }

    #[test]
    fn no_event_components_only_offer_refresh() {
        let rows = control_components(&session(100), None);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn remake_mode_shows_draft_field() {
        let mut s = session(100);
        s.mode = ControlMode::Remake;
        s.selected_map = "blue".to_string();

        let mut public = PanelState::new("g1", "c1", "m1");
        public.selected_event_key = Some(EventKey::Killstreak);
        public.panel_type = crate::panel::state::PanelType::Public;
        public.status = PanelStatus::Running;
        let bundle = EventBundle {
            public_state: public,
            staff_state: None,
        };

        let rows = control_components(&s, Some(&bundle));
        // Two selects plus the confirm row.
        assert_eq!(rows.len(), 3);
    }
}
