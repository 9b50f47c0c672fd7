//! The staff setup panel and the public announcement panel.
//!
//! Staff post a setup panel with `-eventpanel`, pick an event, tune it
//! through a modal and start it. Starting clones the panel into the
//! configured announcement channel, locks the staff panel and wires win
//! detection so the event closes itself when someone wins.

use std::sync::Arc;

use chrono::Utc;
use serenity::all::{
    ActionRowComponent, ChannelId, ComponentInteraction, ComponentInteractionDataKind, Context,
    CreateInteractionResponse, CreateInteractionResponseFollowup, CreateInteractionResponseMessage,
    CreateMessage, EditInteractionResponse, EditMessage, GuildId, Http, Member, Message, MessageId,
    ModalInteraction, Permissions, UserId,
};
use tokio::sync::mpsc;

use crate::{
    data::{panel_channel::PanelChannelRepository, panel_state::EventPanelRepository},
    error::AppError,
    game::{client::GameInfo, lobby::Lobby, session},
    panel::{
        catalog::{normalize_map, normalize_region, parse_first_int, EventKey},
        live,
        state::{PanelState, PanelStatus, PanelType},
        view,
    },
    state::AppContext,
    tracker::deathmatch::{StartOutcome, WinReason},
};

/// A running event's public panel plus the staff panel that announced it.
#[derive(Clone, Debug)]
pub struct EventBundle {
    pub public_state: PanelState,
    pub staff_state: Option<PanelState>,
}

fn parse_channel(id: &str) -> Option<ChannelId> {
    id.parse::<u64>().ok().filter(|&v| v != 0).map(ChannelId::new)
}

fn parse_message(id: &str) -> Option<MessageId> {
    id.parse::<u64>().ok().filter(|&v| v != 0).map(MessageId::new)
}

fn member_permissions(member: &Member) -> Permissions {
    member.permissions.unwrap_or(Permissions::empty())
}

fn member_role_ids(member: &Member) -> Vec<String> {
    member.roles.iter().map(|r| r.to_string()).collect()
}

/// Staff gate for the setup panel.
pub fn can_use_event_panel(app: &AppContext, guild_id: GuildId, member: &Member) -> bool {
    app.staff.can_run_staff_command(
        &guild_id.to_string(),
        "eventpanel",
        member_permissions(member),
        &member_role_ids(member),
    )
}

/// Staff gate for the control panel: an explicit controlevent grant or the
/// broader eventpanel grant both count.
pub fn can_use_control_panel(app: &AppContext, guild_id: GuildId, member: &Member) -> bool {
    let guild = guild_id.to_string();
    let perms = member_permissions(member);
    let roles = member_role_ids(member);
    app.staff
        .can_run_staff_command(&guild, "controlevent", perms, &roles)
        || app
            .staff
            .can_run_staff_command(&guild, "eventpanel", perms, &roles)
}

/// Who may spawn the shared auto-refreshing live panel: event staff, or
/// members with moderator-grade permissions.
pub fn can_spawn_live_panel(app: &AppContext, guild_id: GuildId, member: &Member) -> bool {
    if can_use_event_panel(app, guild_id, member) {
        return true;
    }
    let perms = member_permissions(member);
    perms.administrator() || perms.manage_guild() || perms.manage_messages()
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

async fn followup_ephemeral(
    ctx: &Context,
    interaction: &ComponentInteraction,
    content: impl Into<String>,
) -> Result<(), AppError> {
    interaction
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new()
                .content(content)
                .ephemeral(true),
        )
        .await?;
    Ok(())
}

async fn acknowledge(ctx: &Context, interaction: &ComponentInteraction) -> Result<(), AppError> {
    interaction
        .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
        .await?;
    Ok(())
}

/// Re-renders a panel message from its stored state.
pub async fn update_panel_message(http: &Http, state: &PanelState) -> Result<(), AppError> {
    let (Some(channel), Some(message)) = (
        parse_channel(&state.channel_id),
        parse_message(&state.message_id),
    ) else {
        return Ok(());
    };

    channel
        .edit_message(
            http,
            message,
            EditMessage::new()
                .embed(view::panel_embed(state))
                .components(view::panel_components(state)),
        )
        .await?;
    Ok(())
}

/// Staff panels that announced the given public panel.
pub(crate) async fn linked_staff_states(
    app: &AppContext,
    public: &PanelState,
) -> Result<Vec<PanelState>, AppError> {
    let states = EventPanelRepository::new(&app.db)
        .get_by_guild(&public.guild_id)
        .await?;
    Ok(states
        .into_iter()
        .filter(|st| {
            st.panel_type == PanelType::Staff
                && st.announced_message_id.as_deref() == Some(public.message_id.as_str())
        })
        .collect())
}

/// Posts a fresh setup panel for the `-eventpanel` command, in the bound
/// eventpanel channel when one is configured.
pub async fn post_setup_panel(
    app: &Arc<AppContext>,
    ctx: &Context,
    message: &Message,
) -> Result<(), AppError> {
    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };
    let guild = guild_id.to_string();

    let configured = PanelChannelRepository::new(&app.db)
        .get(&guild, "eventpanel")
        .await?;
    let target = configured
        .as_deref()
        .and_then(parse_channel)
        .unwrap_or(message.channel_id);

    let mut state = PanelState::new(&guild, &target.to_string(), "pending");

    let panel_message = target
        .send_message(
            &ctx.http,
            CreateMessage::new()
                .embed(view::panel_embed(&state))
                .components(view::panel_components(&state)),
        )
        .await?;

    state.message_id = panel_message.id.to_string();
    state.touch();
    EventPanelRepository::new(&app.db).save(&state).await?;

    let note = if target == message.channel_id {
        "Setup panel posted.".to_string()
    } else {
        format!("Setup panel posted in <#{target}>.")
    };
    message.reply(&ctx.http, note).await?;
    Ok(())
}

/// Creates and occupies a fresh lobby for an event, registering it and
/// arranging the first-player greeting.
pub async fn auto_create_game(
    app: &Arc<AppContext>,
    key: EventKey,
    state: &PanelState,
    created_by: UserId,
) -> Result<GameInfo, AppError> {
    if !key.spec().can_auto_create {
        return Err(AppError::InvalidInput(
            "Auto-create is not implemented for this event yet.".to_string(),
        ));
    }

    let info =
        session::create_event_game(&app.game, &state.settings.region, &state.settings.map).await?;

    if let (Some(guild_id), Some(channel_id)) = (
        state.guild_id.parse::<u64>().ok().filter(|&v| v != 0).map(GuildId::new),
        parse_channel(&state.channel_id),
    ) {
        app.lobbies.set_active(Lobby {
            guild_id,
            channel_id,
            created_by,
            event_key: key.as_str().to_string(),
            game: info.clone(),
            created_at: Utc::now(),
        });
    }

    app.greeter
        .watch(Arc::clone(&app.game), &info.id, &app.config.greeting_message);

    Ok(info)
}

/// Configures win detection for a freshly started (or remade) event and
/// spawns the listener that closes the event and posts final results.
pub async fn wire_win_detection(
    app: &Arc<AppContext>,
    http: &Arc<Http>,
    public_state: &mut PanelState,
) -> Result<(), AppError> {
    let Some(key) = public_state.selected_event_key else {
        return Ok(());
    };
    let game_id = public_state.settings.game_id.trim().to_string();
    if game_id.is_empty() {
        return Ok(());
    }

    let repo = EventPanelRepository::new(&app.db);

    match key {
        EventKey::Killstreak => {
            // The target may have been edited into the how-to-win text.
            let target = parse_first_int(&public_state.how_to_win_text())
                .or(public_state.settings.target_number)
                .unwrap_or(10);

            public_state.settings.target_number = Some(target);
            public_state.touch();
            repo.save(public_state).await?;

            for mut staff in linked_staff_states(app, public_state).await? {
                staff.settings.target_number = Some(target);
                staff.touch();
                repo.save(&staff).await?;
                if let Err(err) = update_panel_message(http, &staff).await {
                    tracing::warn!("Failed to refresh staff panel: {err}");
                }
            }

            let (tx, mut rx) = mpsc::unbounded_channel();
            app.killstreak.ensure_game(&game_id, Utc::now());
            app.killstreak.configure_win(&game_id, target, tx);
            app.killstreak.begin_match(&game_id, Utc::now());
            app.killstreak.arm(Arc::clone(&app.game), &game_id);

            let task_app = Arc::clone(app);
            let task_http = Arc::clone(http);
            let public_message_id = public_state.message_id.clone();
            let announce_channel = parse_channel(&public_state.channel_id);
            tokio::spawn(async move {
                let Some(win) = rx.recv().await else {
                    return;
                };
                if let Err(err) =
                    close_running_event(&task_app, &task_http, &public_message_id, "completed")
                        .await
                {
                    tracing::error!("Failed to close killstreak event: {err}");
                }

                let embed = view::killstreak_final_embed(&win.winner, win.target, &win.standings);
                if let Some(channel) = announce_channel {
                    if let Err(err) = channel
                        .send_message(&task_http, CreateMessage::new().embed(embed))
                        .await
                    {
                        tracing::error!("Failed to post killstreak results: {err}");
                    }
                }
            });
        }
        EventKey::Deathmatch => {
            let target = public_state.settings.target_number.unwrap_or(30);
            let time_limit = public_state.settings.time_limit_seconds.unwrap_or(600);

            let (tx, mut rx) = mpsc::unbounded_channel();
            app.deathmatch.ensure_game(&game_id, Utc::now());
            app.deathmatch
                .configure_win(&game_id, target, time_limit, tx);

            let task_app = Arc::clone(app);
            let task_http = Arc::clone(http);
            let public_message_id = public_state.message_id.clone();
            let announce_channel = parse_channel(&public_state.channel_id);
            tokio::spawn(async move {
                let Some(win) = rx.recv().await else {
                    return;
                };
                if let Err(err) =
                    close_running_event(&task_app, &task_http, &public_message_id, "completed")
                        .await
                {
                    tracing::error!("Failed to close deathmatch event: {err}");
                }

                let reason = match win.reason {
                    WinReason::TargetReached => view::DeathmatchEndReason::TargetReached,
                    WinReason::TimeExpired => view::DeathmatchEndReason::TimeExpired,
                };
                let embed = view::deathmatch_final_embed(
                    win.winner.as_deref().unwrap_or(""),
                    win.target,
                    win.time_limit_seconds,
                    reason,
                    &win.standings,
                );
                if let Some(channel) = announce_channel {
                    if let Err(err) = channel
                        .send_message(&task_http, CreateMessage::new().embed(embed))
                        .await
                    {
                        tracing::error!("Failed to post deathmatch results: {err}");
                    }
                }
            });
        }
        // Manual events have no automated win detection.
        EventKey::BattleRoyale | EventKey::HideSeek => {}
    }

    Ok(())
}

/// Ends a running event: stops its live panel, marks the public panel and
/// every linked staff panel ended, and re-renders both.
pub async fn close_running_event(
    app: &Arc<AppContext>,
    http: &Arc<Http>,
    public_message_id: &str,
    reason: &str,
) -> Result<(), AppError> {
    let repo = EventPanelRepository::new(&app.db);
    let Some(mut public) = repo.get_by_message_id(public_message_id).await? else {
        return Ok(());
    };

    let game_id = public.settings.game_id.trim().to_string();
    if !game_id.is_empty() {
        live::stop_and_delete_if_matches(app, http, &public.guild_id, &game_id).await;
        app.killstreak.unarm(&game_id);
        app.deathmatch.unarm(&game_id);
        app.lobbies.clear_for_game(&game_id);
    }

    public.mark_ended(reason);
    repo.save(&public).await?;

    for mut staff in linked_staff_states(app, &public).await? {
        staff.mark_ended(reason);
        repo.save(&staff).await?;
        if let Err(err) = update_panel_message(http, &staff).await {
            tracing::warn!("Failed to refresh staff panel: {err}");
        }
    }

    if let Err(err) = update_panel_message(http, &public).await {
        tracing::warn!("Failed to refresh public panel: {err}");
    }

    Ok(())
}

/// Whether a stored running public state still corresponds to a live game,
/// rather than a stale row left behind by a crash or restart.
pub fn is_public_state_live(app: &AppContext, state: &PanelState) -> bool {
    if state.status != PanelStatus::Running {
        return false;
    }
    let Some(key) = state.selected_event_key else {
        return false;
    };
    let game_id = state.settings.game_id.trim();
    if game_id.is_empty() {
        return false;
    }

    // A deathmatch well past its clock is dead no matter what else says.
    if key == EventKey::Deathmatch {
        if let (Some(started), Some(limit)) = (state.started_at, state.settings.time_limit_seconds)
        {
            let deadline = started + chrono::Duration::seconds(i64::from(limit) + 120);
            if Utc::now() > deadline {
                return false;
            }
        }
    }

    // Strongest signal: the bot still occupies the lobby.
    if let Some(guild_id) = state
        .guild_id
        .parse::<u64>()
        .ok()
        .filter(|&v| v != 0)
        .map(GuildId::new)
    {
        if app
            .lobbies
            .active_for_guild(guild_id)
            .is_some_and(|lobby| lobby.game.id == game_id)
        {
            return true;
        }
    }

    match key {
        EventKey::Killstreak => app.killstreak.snapshot(game_id, 1).is_some(),
        EventKey::Deathmatch => app.deathmatch.snapshot(game_id, 1).is_some(),
        // Manual events have no tracker; fall back to row freshness.
        EventKey::BattleRoyale | EventKey::HideSeek => {
            Utc::now().signed_duration_since(state.updated_at) < chrono::Duration::hours(6)
        }
    }
}

/// The guild's newest genuinely live event, with its announcing staff panel.
pub async fn active_event_bundle(
    app: &AppContext,
    guild_id: &str,
) -> Result<Option<EventBundle>, AppError> {
    let states = EventPanelRepository::new(&app.db)
        .get_by_guild(guild_id)
        .await?;

    for public in states.iter().filter(|st| {
        st.panel_type == PanelType::Public
            && st.status == PanelStatus::Running
            && st.selected_event_key.is_some()
            && !st.settings.game_id.trim().is_empty()
    }) {
        if !is_public_state_live(app, public) {
            continue;
        }

        let staff_state = states
            .iter()
            .find(|st| {
                st.panel_type == PanelType::Staff
                    && st.announced_message_id.as_deref() == Some(public.message_id.as_str())
            })
            .cloned();

        return Ok(Some(EventBundle {
            public_state: public.clone(),
            staff_state,
        }));
    }

    Ok(None)
}

/// Routes `evp:` component interactions (buttons and select menus).
pub async fn handle_component(
    app: &Arc<AppContext>,
    ctx: &Context,
    interaction: &ComponentInteraction,
) -> Result<(), AppError> {
    let custom_id = interaction.data.custom_id.clone();

    if let ComponentInteractionDataKind::StringSelect { values } = &interaction.data.kind {
        let chosen = values.first().map(String::as_str).unwrap_or("").to_string();
        return handle_select(app, ctx, interaction, &custom_id, &chosen).await;
    }

    handle_button(app, ctx, interaction, &custom_id).await
}

async fn handle_select(
    app: &Arc<AppContext>,
    ctx: &Context,
    interaction: &ComponentInteraction,
    custom_id: &str,
    chosen: &str,
) -> Result<(), AppError> {
    if custom_id != "evp:map" && custom_id != "evp:region" {
        return Ok(());
    }

    let repo = EventPanelRepository::new(&app.db);
    let Some(mut state) = repo
        .get_by_message_id(&interaction.message.id.to_string())
        .await?
    else {
        return reply_ephemeral(ctx, interaction, "Panel state missing. Repost with -eventpanel.")
            .await;
    };

    let staff_ok = match (interaction.guild_id, interaction.member.as_ref()) {
        (Some(guild_id), Some(member)) => can_use_event_panel(app, guild_id, member),
        _ => false,
    };
    if !staff_ok {
        return reply_ephemeral(ctx, interaction, "Staff-only controls.").await;
    }

    if state.panel_type != PanelType::Staff || state.status != PanelStatus::Setup {
        return reply_ephemeral(ctx, interaction, "This panel can’t be edited right now.").await;
    }

    if custom_id == "evp:map" {
        if normalize_map(chosen) != chosen {
            return reply_ephemeral(ctx, interaction, "Invalid map.").await;
        }
        state.settings.map = chosen.to_string();
    } else {
        if normalize_region(chosen) != chosen {
            return reply_ephemeral(ctx, interaction, "Invalid server.").await;
        }
        state.settings.region = chosen.to_string();
    }

    state.touch();
    repo.save(&state).await?;

    acknowledge(ctx, interaction).await?;
    update_panel_message(&ctx.http, &state).await
}

async fn handle_button(
    app: &Arc<AppContext>,
    ctx: &Context,
    interaction: &ComponentInteraction,
    custom_id: &str,
) -> Result<(), AppError> {
    let repo = EventPanelRepository::new(&app.db);
    let Some(mut state) = repo
        .get_by_message_id(&interaction.message.id.to_string())
        .await?
    else {
        return reply_ephemeral(ctx, interaction, "Panel state missing. Repost with -eventpanel.")
            .await;
    };

    // Join is open to everyone.
    if custom_id == "evp:join" {
        if state.status != PanelStatus::Running || state.panel_type != PanelType::Public {
            return reply_ephemeral(ctx, interaction, "This panel is not accepting joins.").await;
        }
        let link = state.settings.game_link.trim();
        if link.is_empty() {
            return reply_ephemeral(ctx, interaction, "No link is set for this event yet.").await;
        }
        return reply_ephemeral(ctx, interaction, link).await;
    }

    if custom_id == "evp:livestats" {
        return handle_livestats(app, ctx, interaction, &state).await;
    }

    // Everything below is staff-only.
    let staff_ok = match (interaction.guild_id, interaction.member.as_ref()) {
        (Some(guild_id), Some(member)) => can_use_event_panel(app, guild_id, member),
        _ => false,
    };
    if !staff_ok {
        return reply_ephemeral(ctx, interaction, "Staff-only controls.").await;
    }

    if custom_id == "evp:startgame" {
        return handle_start_game(app, ctx, interaction, &mut state).await;
    }

    if state.panel_type != PanelType::Staff {
        return reply_ephemeral(
            ctx,
            interaction,
            "Use the staff setup panel to control this event.",
        )
        .await;
    }
    if state.status != PanelStatus::Setup {
        return reply_ephemeral(ctx, interaction, "This setup panel is already locked.").await;
    }

    if let Some(raw_key) = custom_id.strip_prefix("evp:pick:") {
        let Some(key) = EventKey::parse(raw_key) else {
            return reply_ephemeral(ctx, interaction, "Unknown event type.").await;
        };

        state.selected_event_key = Some(key);
        state.status = PanelStatus::Setup;
        state.settings.how_to_win_override.clear();
        state.settings.rules_override.clear();
        state.normalize_for_event();
        state.touch();
        repo.save(&state).await?;

        acknowledge(ctx, interaction).await?;
        return update_panel_message(&ctx.http, &state).await;
    }

    if custom_id == "evp:edit" {
        let Some(key) = state.selected_event_key else {
            return reply_ephemeral(ctx, interaction, "Pick an event first.").await;
        };
        interaction
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Modal(view::edit_modal(&state, key)),
            )
            .await?;
        return Ok(());
    }

    if custom_id == "evp:start" {
        return handle_start_event(app, ctx, interaction, &mut state).await;
    }

    reply_ephemeral(ctx, interaction, "Unknown panel action.").await
}

async fn handle_livestats(
    app: &Arc<AppContext>,
    ctx: &Context,
    interaction: &ComponentInteraction,
    state: &PanelState,
) -> Result<(), AppError> {
    if state.status != PanelStatus::Running || state.panel_type != PanelType::Public {
        return reply_ephemeral(
            ctx,
            interaction,
            "Live stats are only available on the announcement panel.",
        )
        .await;
    }

    let key = state.selected_event_key;
    if !matches!(key, Some(EventKey::Killstreak) | Some(EventKey::Deathmatch)) {
        return reply_ephemeral(
            ctx,
            interaction,
            "Live stats aren’t supported for this event yet.",
        )
        .await;
    }
    let key = key.unwrap_or(EventKey::Killstreak);

    let game_id = state.settings.game_id.trim().to_string();
    if game_id.is_empty() {
        return reply_ephemeral(ctx, interaction, "No gameId is set for this event yet.").await;
    }

    let can_spawn = match (interaction.guild_id, interaction.member.as_ref()) {
        (Some(guild_id), Some(member)) => can_spawn_live_panel(app, guild_id, member),
        _ => false,
    };

    if can_spawn {
        let guild = interaction
            .guild_id
            .map(|g| g.to_string())
            .unwrap_or_default();
        let started = live::start_or_reuse(
            app,
            &ctx.http,
            &guild,
            interaction.channel_id,
            &game_id,
            key,
            state.started_at,
            state.settings.time_limit_seconds,
        )
        .await;

        let content = match started {
            Ok(live::LiveStart::AlreadyRunning { url }) => {
                format!("Live stats panel already running:\n{url}")
            }
            Ok(live::LiveStart::Created { url }) => {
                format!("Live stats panel created:\n{url}")
            }
            Err(err) => {
                tracing::warn!("Failed to create live panel: {err}");
                "Couldn't create a live panel in this channel.".to_string()
            }
        };
        return reply_ephemeral(ctx, interaction, content).await;
    }

    // Non-staff get a one-shot snapshot instead of the shared panel.
    let embed = match key {
        EventKey::Deathmatch => {
            let snap = app.deathmatch.snapshot(&game_id, 10);
            view::deathmatch_live_embed(
                snap.as_ref(),
                state.started_at,
                state.settings.time_limit_seconds,
                Utc::now(),
            )
        }
        _ => {
            let snap = app.killstreak.snapshot(&game_id, 10);
            view::killstreak_live_embed(snap.as_ref())
        }
    };

    interaction
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

async fn handle_start_game(
    app: &Arc<AppContext>,
    ctx: &Context,
    interaction: &ComponentInteraction,
    state: &mut PanelState,
) -> Result<(), AppError> {
    if state.status != PanelStatus::Running
        || state.panel_type != PanelType::Public
        || state.selected_event_key != Some(EventKey::Deathmatch)
    {
        return reply_ephemeral(
            ctx,
            interaction,
            "Start Game is only for the public Deathmatch panel.",
        )
        .await;
    }

    if state.started_at.is_some() {
        return reply_ephemeral(ctx, interaction, "This game already started.").await;
    }

    let game_id = state.settings.game_id.trim().to_string();
    if game_id.is_empty() {
        return reply_ephemeral(ctx, interaction, "No gameId is set for this event yet.").await;
    }

    interaction
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(
                CreateInteractionResponseMessage::new().ephemeral(true),
            ),
        )
        .await?;

    let outcome = app
        .deathmatch
        .start(Arc::clone(&app.game), &game_id, 5)
        .await;

    let content = match outcome {
        StartOutcome::AlreadyStarted => "Game already started.".to_string(),
        StartOutcome::AlreadyStarting => "Countdown is already running.".to_string(),
        StartOutcome::Starting { .. } => {
            state.started_at = Some(Utc::now());
            state.started_by = Some(interaction.user.id.to_string());
            state.touch();

            let repo = EventPanelRepository::new(&app.db);
            repo.save(state).await?;

            for mut staff in linked_staff_states(app, state).await? {
                staff.started_at = state.started_at;
                staff.started_by = state.started_by.clone();
                staff.touch();
                repo.save(&staff).await?;
            }

            if let Err(err) = update_panel_message(&ctx.http, state).await {
                tracing::warn!("Failed to refresh public panel: {err}");
            }
            "Deathmatch started. Countdown sent in-game.".to_string()
        }
    };

    interaction
        .edit_response(&ctx.http, EditInteractionResponse::new().content(content))
        .await?;
    Ok(())
}

async fn handle_start_event(
    app: &Arc<AppContext>,
    ctx: &Context,
    interaction: &ComponentInteraction,
    state: &mut PanelState,
) -> Result<(), AppError> {
    acknowledge(ctx, interaction).await?;

    let Some(key) = state.selected_event_key else {
        return followup_ephemeral(ctx, interaction, "Pick an event first.").await;
    };

    if state.settings.game_link.trim().is_empty() {
        if !key.spec().can_auto_create {
            return followup_ephemeral(
                ctx,
                interaction,
                "No game link set. Auto-create is not implemented for this event yet.",
            )
            .await;
        }

        match auto_create_game(app, key, state, interaction.user.id).await {
            Ok(info) => {
                state.settings.game_id = info.id.clone();
                state.settings.game_link = info.link();
            }
            Err(err) => {
                return followup_ephemeral(ctx, interaction, format!("Auto-create failed: {err}"))
                    .await;
            }
        }
    }

    if state.settings.game_link.trim().is_empty() {
        return followup_ephemeral(
            ctx,
            interaction,
            "Still no game link available. Set one in Edit Rules.",
        )
        .await;
    }

    let guild = state.guild_id.clone();
    let announce_id = PanelChannelRepository::new(&app.db)
        .get(&guild, "eventannounce")
        .await?;
    let Some(announce_channel) = announce_id.as_deref().and_then(parse_channel) else {
        return followup_ephemeral(
            ctx,
            interaction,
            "No announcement channel set. Use `-setpanel eventannounce #channel` first.",
        )
        .await;
    };

    // Deathmatch waits for an explicit Start Game; everything else starts now.
    if key == EventKey::Deathmatch {
        state.started_at = None;
        state.started_by = None;
    } else {
        state.started_at = Some(Utc::now());
        state.started_by = Some(interaction.user.id.to_string());
    }

    let mut public_state = state.clone_for_public(&announce_channel.to_string());
    let public_message = announce_channel
        .send_message(
            &ctx.http,
            CreateMessage::new()
                .embed(view::panel_embed(&public_state))
                .components(view::panel_components(&public_state)),
        )
        .await?;

    public_state.message_id = public_message.id.to_string();
    public_state.touch();

    let repo = EventPanelRepository::new(&app.db);
    repo.save(&public_state).await?;

    state.status = PanelStatus::Running;
    state.announced_channel_id = Some(announce_channel.to_string());
    state.announced_message_id = Some(public_state.message_id.clone());
    state.touch();
    repo.save(state).await?;
    update_panel_message(&ctx.http, state).await?;

    wire_win_detection(app, &ctx.http, &mut public_state).await?;

    followup_ephemeral(
        ctx,
        interaction,
        format!("Event started and posted in <#{announce_channel}>."),
    )
    .await
}

/// Text collected from the settings modal, before validation.
#[derive(Debug, Default)]
struct SettingsInput {
    game_link: String,
    target_number: String,
    time_limit_seconds: String,
    how_to_win_override: String,
    rules_override: String,
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

fn parse_optional_int(raw: &str, min: u32, max: u32) -> Option<u32> {
    let value: u32 = raw.trim().parse().ok()?;
    (value >= min && value <= max).then_some(value)
}

fn is_valid_http_url_or_empty(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lower = trimmed.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Applies the settings modal to a panel state. Returns a user-facing
/// validation message on rejection.
fn apply_settings_input(state: &mut PanelState, input: &SettingsInput) -> Result<(), String> {
    let game_link = input.game_link.trim().to_string();
    if !is_valid_http_url_or_empty(&game_link) {
        return Err("Game link must be a valid http(s) URL (or leave it blank).".to_string());
    }

    // Clearing the link also clears the game it pointed at.
    if game_link.is_empty() {
        state.settings.game_id.clear();
    }
    state.settings.game_link = game_link;

    state.settings.target_number = parse_optional_int(&input.target_number, 1, 100_000);
    state.settings.time_limit_seconds = parse_optional_int(&input.time_limit_seconds, 5, 86_400);
    state.settings.how_to_win_override = input.how_to_win_override.trim().to_string();
    state.settings.rules_override = input.rules_override.trim().to_string();

    // An edited killstreak how-to-win line overrides the target number.
    if state.selected_event_key == Some(EventKey::Killstreak) {
        if let Some(parsed) = parse_first_int(&state.how_to_win_text()) {
            state.settings.target_number = Some(parsed);
        }
    }

    state.normalize_for_event();
    Ok(())
}

/// Handles the `evp:modal:{message_id}` settings modal submit.
pub async fn handle_modal(
    app: &Arc<AppContext>,
    ctx: &Context,
    interaction: &ModalInteraction,
) -> Result<(), AppError> {
    let Some(message_id) = interaction.data.custom_id.strip_prefix("evp:modal:") else {
        return Ok(());
    };

    let modal_reply = |content: String| {
        interaction.create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
    };

    let repo = EventPanelRepository::new(&app.db);
    let Some(mut state) = repo.get_by_message_id(message_id).await? else {
        modal_reply("Panel state missing. Repost with -eventpanel.".to_string()).await?;
        return Ok(());
    };

    let staff_ok = match (interaction.guild_id, interaction.member.as_ref()) {
        (Some(guild_id), Some(member)) => can_use_event_panel(app, guild_id, member),
        _ => false,
    };
    if !staff_ok {
        modal_reply("Staff-only modal.".to_string()).await?;
        return Ok(());
    }

    if state.panel_type != PanelType::Staff || state.status != PanelStatus::Setup {
        modal_reply("This panel can’t be edited right now.".to_string()).await?;
        return Ok(());
    }

    let input = SettingsInput {
        game_link: modal_value(interaction, "gameLink"),
        target_number: modal_value(interaction, "targetNumber"),
        time_limit_seconds: modal_value(interaction, "timeLimitSeconds"),
        how_to_win_override: modal_value(interaction, "howToWinOverride"),
        rules_override: modal_value(interaction, "rulesOverride"),
    };

    if let Err(message) = apply_settings_input(&mut state, &input) {
        modal_reply(message).await?;
        return Ok(());
    }

    state.touch();
    repo.save(&state).await?;

    modal_reply("Updated.".to_string()).await?;
    update_panel_message(&ctx.http, &state).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_int_enforces_bounds() {
        assert_eq!(parse_optional_int("10", 1, 100_000), Some(10));
        assert_eq!(parse_optional_int("  600 ", 5, 86_400), Some(600));
        assert_eq!(parse_optional_int("0", 1, 100_000), None);
        assert_eq!(parse_optional_int("100001", 1, 100_000), None);
        assert_eq!(parse_optional_int("", 1, 100_000), None);
        assert_eq!(parse_optional_int("ten", 1, 100_000), None);
    }

    #[test]
    fn url_validation_accepts_blank_and_http() {
        assert!(is_valid_http_url_or_empty(""));
        assert!(is_valid_http_url_or_empty("  "));
        assert!(is_valid_http_url_or_empty("https://shellshock.io/#abc"));
        assert!(is_valid_http_url_or_empty("HTTP://example.com"));
        assert!(!is_valid_http_url_or_empty("shellshock.io/#abc"));
        assert!(!is_valid_http_url_or_empty("ftp://example.com"));
    }

    #[test]
    fn clearing_the_link_clears_the_game_id() {
        let mut state = PanelState::new("g1", "c1", "m1");
        state.selected_event_key = Some(EventKey::Deathmatch);
        state.settings.game_id = "game-1".to_string();
        state.settings.game_link = "https://shellshock.io/#abc".to_string();

        let input = SettingsInput::default();
        apply_settings_input(&mut state, &input).unwrap();

        assert!(state.settings.game_id.is_empty());
        assert!(state.settings.game_link.is_empty());
        // Defaults refill after the blanks cleared the fields.
        assert_eq!(state.settings.target_number, Some(30));
        assert_eq!(state.settings.time_limit_seconds, Some(600));
    }

    #[test]
    fn bad_link_is_rejected_with_message() {
        let mut state = PanelState::new("g1", "c1", "m1");
        state.selected_event_key = Some(EventKey::Killstreak);

        let input = SettingsInput {
            game_link: "not a url".to_string(),
            ..Default::default()
        };

        let err = apply_settings_input(&mut state, &input).unwrap_err();
        assert_eq!(
            err,
            "Game link must be a valid http(s) URL (or leave it blank)."
        );
    }

    #[test]
    fn killstreak_target_follows_edited_how_to_win() {
        let mut state = PanelState::new("g1", "c1", "m1");
        state.selected_event_key = Some(EventKey::Killstreak);

        let input = SettingsInput {
            target_number: "10".to_string(),
            how_to_win_override: "Reach 25 kills in a row to win.".to_string(),
            ..Default::default()
        };

        apply_settings_input(&mut state, &input).unwrap();
        assert_eq!(state.settings.target_number, Some(25));
    }

    #[test]
    fn default_how_to_win_keeps_explicit_target() {
        let mut state = PanelState::new("g1", "c1", "m1");
        state.selected_event_key = Some(EventKey::Killstreak);

        let input = SettingsInput {
            target_number: "15".to_string(),
            ..Default::default()
        };

        apply_settings_input(&mut state, &input).unwrap();
        // The default text renders the target, so re-parsing keeps it.
        assert_eq!(state.settings.target_number, Some(15));
    }
}
