//! The admin access panel: per-guild configuration of who may run staff
//! commands and who may use the staff panels without a staff role.
//!
//! The panel is owned by whoever ran `-adminpanel`; the owner's user id rides
//! in every custom id so nobody else can drive it. Changes apply to the
//! staff access store immediately; Stop Configuration just locks the message.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use serenity::all::{
    ButtonStyle, ChannelId, ComponentInteraction, ComponentInteractionDataKind, Context,
    CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter, CreateInteractionResponse,
    CreateInteractionResponseMessage, CreateMessage, CreateSelectMenu, CreateSelectMenuKind,
    CreateSelectMenuOption, EditMessage, Message, MessageId, UserId,
};

use crate::{error::AppError, staff::access::STAFF_COMMANDS, state::AppContext};

/// Which page of the admin panel is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminSection {
    Commands,
    Panel,
}

/// Draft state of one admin panel message.
#[derive(Clone, Debug)]
pub struct AdminSession {
    pub owner: UserId,
    pub guild_id: String,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub section: AdminSection,
    pub selected_command: Option<String>,
}

/// Registry of open admin panels, keyed by panel message id.
#[derive(Default)]
pub struct AdminSessions {
    sessions: Mutex<HashMap<String, AdminSession>>,
}

impl AdminSessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, AdminSession>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, message_id: &str) -> Option<AdminSession> {
        self.lock().get(message_id).cloned()
    }

    pub fn insert(&self, session: AdminSession) {
        self.lock()
            .insert(session.message_id.to_string(), session);
    }

    pub fn update(
        &self,
        message_id: &str,
        f: impl FnOnce(&mut AdminSession),
    ) -> Option<AdminSession> {
        let mut sessions = self.lock();
        let session = sessions.get_mut(message_id)?;
        f(session);
        Some(session.clone())
    }

    pub fn remove(&self, message_id: &str) {
        self.lock().remove(message_id);
    }
}

fn admin_embed(app: &AppContext, session: &AdminSession) -> CreateEmbed {
    let footer = CreateEmbedFooter::new("Stop Configuration to finalize changes");

    match session.section {
        AdminSection::Commands => {
            let lines: Vec<String> = STAFF_COMMANDS
                .iter()
                .map(|command| {
                    let roles = app.staff.roles_for_command(&session.guild_id, command);
                    let value = if roles.is_empty() {
                        "_Admins only_".to_string()
                    } else {
                        roles
                            .iter()
                            .map(|r| format!("<@&{r}>"))
                            .collect::<Vec<_>>()
                            .join(" ")
                    };
                    format!("**-{command}**: {value}")
                })
                .collect();

            CreateEmbed::new()
                .title("Admin Panel | Staff Command Access")
                .description(lines.join("\n"))
                .footer(footer)
        }
        AdminSection::Panel => {
            let users = app.staff.panel_allow_users(&session.guild_id);
            let value = if users.is_empty() {
                "_No extra users_".to_string()
            } else {
                users
                    .iter()
                    .map(|u| format!("<@{u}>"))
                    .collect::<Vec<_>>()
                    .join(" ")
            };

            CreateEmbed::new()
                .title("Admin Panel | Panel Access")
                .description(format!("Users allowed to use the staff panels:\n{value}"))
                .footer(footer)
        }
    }
}

fn section_row(session: &AdminSession) -> CreateActionRow {
    let options = vec![
        CreateSelectMenuOption::new("Staff Command Access", "commands")
            .default_selection(session.section == AdminSection::Commands),
        CreateSelectMenuOption::new("Panel Access", "panel")
            .default_selection(session.section == AdminSection::Panel),
    ];

    CreateActionRow::SelectMenu(
        CreateSelectMenu::new(
            format!("ap:section:{}", session.owner),
            CreateSelectMenuKind::String { options },
        )
        .placeholder("Select section")
        .min_values(1)
        .max_values(1),
    )
}

fn stop_row(session: &AdminSession) -> CreateActionRow {
    CreateActionRow::Buttons(vec![CreateButton::new(format!("ap:stop:{}", session.owner))
        .label("Stop Configuration")
        .style(ButtonStyle::Danger)])
}

fn admin_components(session: &AdminSession) -> Vec<CreateActionRow> {
    let mut rows = vec![section_row(session)];

    match session.section {
        AdminSection::Commands => {
            let options = STAFF_COMMANDS
                .iter()
                .map(|c| {
                    CreateSelectMenuOption::new(format!("-{c}"), *c)
                        .default_selection(session.selected_command.as_deref() == Some(*c))
                })
                .collect();
            rows.push(CreateActionRow::SelectMenu(
                CreateSelectMenu::new(
                    format!("ap:cmd:{}", session.owner),
                    CreateSelectMenuKind::String { options },
                )
                .placeholder("Select command")
                .min_values(1)
                .max_values(1),
            ));

            if let Some(command) = &session.selected_command {
                rows.push(CreateActionRow::SelectMenu(
                    CreateSelectMenu::new(
                        format!("ap:role:add:{command}:{}", session.owner),
                        CreateSelectMenuKind::Role {
                            default_roles: None,
                        },
                    )
                    .placeholder("Add roles")
                    .min_values(1)
                    .max_values(5),
                ));
                rows.push(CreateActionRow::SelectMenu(
                    CreateSelectMenu::new(
                        format!("ap:role:remove:{command}:{}", session.owner),
                        CreateSelectMenuKind::Role {
                            default_roles: None,
                        },
                    )
                    .placeholder("Remove roles")
                    .min_values(1)
                    .max_values(5),
                ));
            }
        }
        AdminSection::Panel => {
            rows.push(CreateActionRow::SelectMenu(
                CreateSelectMenu::new(
                    format!("ap:panel:add:{}", session.owner),
                    CreateSelectMenuKind::User {
                        default_users: None,
                    },
                )
                .placeholder("Add users")
                .min_values(1)
                .max_values(5),
            ));
            rows.push(CreateActionRow::SelectMenu(
                CreateSelectMenu::new(
                    format!("ap:panel:remove:{}", session.owner),
                    CreateSelectMenuKind::User {
                        default_users: None,
                    },
                )
                .placeholder("Remove users")
                .min_values(1)
                .max_values(5),
            ));
        }
    }

    rows.push(stop_row(session));
    rows
}

/// Posts a fresh admin panel for the `-adminpanel` command. The caller has
/// already been checked for admin-panel access.
pub async fn post_admin_panel(
    app: &Arc<AppContext>,
    ctx: &Context,
    message: &Message,
) -> Result<(), AppError> {
    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };

    let mut session = AdminSession {
        owner: message.author.id,
        guild_id: guild_id.to_string(),
        channel_id: message.channel_id,
        message_id: MessageId::new(1),
        section: AdminSection::Commands,
        selected_command: None,
    };

    let panel_message = message
        .channel_id
        .send_message(
            &ctx.http,
            CreateMessage::new()
                .embed(admin_embed(app, &session))
                .components(admin_components(&session)),
        )
        .await?;

    session.message_id = panel_message.id;
    app.admin_sessions.insert(session);
    Ok(())
}

async fn render(
    app: &Arc<AppContext>,
    ctx: &Context,
    session: &AdminSession,
) -> Result<(), AppError> {
    session
        .channel_id
        .edit_message(
            &ctx.http,
            session.message_id,
            EditMessage::new()
                .embed(admin_embed(app, session))
                .components(admin_components(session)),
        )
        .await?;
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

async fn acknowledge(ctx: &Context, interaction: &ComponentInteraction) -> Result<(), AppError> {
    interaction
        .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
        .await?;
    Ok(())
}

/// Routes `ap:` component interactions.
pub async fn handle_component(
    app: &Arc<AppContext>,
    ctx: &Context,
    interaction: &ComponentInteraction,
) -> Result<(), AppError> {
    let custom_id = interaction.data.custom_id.clone();
    let Some(owner_raw) = custom_id.rsplit(':').next() else {
        return Ok(());
    };
    if owner_raw != interaction.user.id.to_string() {
        return reply_ephemeral(ctx, interaction, "Not your panel").await;
    }

    let message_key = interaction.message.id.to_string();
    // Panels from before a restart get a fresh session on first use.
    let session = match app.admin_sessions.get(&message_key) {
        Some(session) => session,
        None => {
            let Some(guild_id) = interaction.guild_id else {
                return Ok(());
            };
            let session = AdminSession {
                owner: interaction.user.id,
                guild_id: guild_id.to_string(),
                channel_id: interaction.channel_id,
                message_id: interaction.message.id,
                section: AdminSection::Commands,
                selected_command: None,
            };
            app.admin_sessions.insert(session.clone());
            session
        }
    };

    if custom_id.starts_with("ap:stop:") {
        app.admin_sessions.remove(&message_key);
        acknowledge(ctx, interaction).await?;
        // Delete the panel; fall back to stripping the controls.
        if session
            .channel_id
            .delete_message(&ctx.http, session.message_id)
            .await
            .is_err()
        {
            session
                .channel_id
                .edit_message(
                    &ctx.http,
                    session.message_id,
                    EditMessage::new()
                        .embed(admin_embed(app, &session))
                        .components(Vec::new()),
                )
                .await?;
        }
        return Ok(());
    }

    if custom_id.starts_with("ap:section:") {
        if let ComponentInteractionDataKind::StringSelect { values } = &interaction.data.kind {
            let section = match values.first().map(String::as_str) {
                Some("panel") => AdminSection::Panel,
                _ => AdminSection::Commands,
            };
            let updated = app
                .admin_sessions
                .update(&message_key, |s| s.section = section)
                .unwrap_or(session);
            acknowledge(ctx, interaction).await?;
            return render(app, ctx, &updated).await;
        }
        return Ok(());
    }

    if custom_id.starts_with("ap:cmd:") {
        if let ComponentInteractionDataKind::StringSelect { values } = &interaction.data.kind {
            let chosen = values.first().map(String::as_str).unwrap_or("");
            if !STAFF_COMMANDS.contains(&chosen) {
                return reply_ephemeral(ctx, interaction, "Unknown command.").await;
            }
            let chosen = chosen.to_string();
            let updated = app
                .admin_sessions
                .update(&message_key, |s| s.selected_command = Some(chosen.clone()))
                .unwrap_or(session);
            acknowledge(ctx, interaction).await?;
            return render(app, ctx, &updated).await;
        }
        return Ok(());
    }

    if custom_id.starts_with("ap:role:") {
        // ap:role:{add|remove}:{command}:{owner}
        let parts: Vec<&str> = custom_id.split(':').collect();
        let (Some(action), Some(command)) = (parts.get(2), parts.get(3)) else {
            return Ok(());
        };
        if !STAFF_COMMANDS.contains(command) {
            return reply_ephemeral(ctx, interaction, "Unknown command.").await;
        }

        if let ComponentInteractionDataKind::RoleSelect { values } = &interaction.data.kind {
            for role_id in values {
                let role = role_id.to_string();
                let changed = if *action == "add" {
                    app.staff
                        .add_role_to_command(&session.guild_id, command, &role)?
                } else {
                    app.staff
                        .remove_role_from_command(&session.guild_id, command, &role)?
                };
                if changed {
                    tracing::info!(
                        guild_id = %session.guild_id,
                        command = %command,
                        role_id = %role,
                        action = %action,
                        "Staff command access updated"
                    );
                }
            }
            acknowledge(ctx, interaction).await?;
            return render(app, ctx, &session).await;
        }
        return Ok(());
    }

    if custom_id.starts_with("ap:panel:") {
        // ap:panel:{add|remove}:{owner}
        let parts: Vec<&str> = custom_id.split(':').collect();
        let Some(action) = parts.get(2) else {
            return Ok(());
        };

        if let ComponentInteractionDataKind::UserSelect { values } = &interaction.data.kind {
            for user_id in values {
                let user = user_id.to_string();
                if *action == "add" {
                    app.staff.add_panel_user(&session.guild_id, &user)?;
                } else {
                    app.staff.remove_panel_user(&session.guild_id, &user)?;
                }
            }
            acknowledge(ctx, interaction).await?;
            return render(app, ctx, &session).await;
        }
        return Ok(());
    }

    reply_ephemeral(ctx, interaction, "Unknown panel action.").await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(message_id: u64, owner: u64) -> AdminSession {
        AdminSession {
            owner: UserId::new(owner),
            guild_id: "g1".to_string(),
            channel_id: ChannelId::new(10),
            message_id: MessageId::new(message_id),
            section: AdminSection::Commands,
            selected_command: None,
        }
    }

    #[test]
    fn sessions_track_section_and_command() {
        let sessions = AdminSessions::new();
        sessions.insert(session(100, 7));

        let updated = sessions
            .update("100", |s| {
                s.section = AdminSection::Panel;
                s.selected_command = Some("eventpanel".to_string());
            })
            .unwrap();
        assert_eq!(updated.section, AdminSection::Panel);
        assert_eq!(
            sessions.get("100").unwrap().selected_command.as_deref(),
            Some("eventpanel")
        );

        sessions.remove("100");
        assert!(sessions.get("100").is_none());
    }

    #[test]
    fn command_section_without_selection_hides_role_pickers() {
        let rows = admin_components(&session(100, 7));
        // Section select, command select, stop row.
        assert_eq!(rows.len(), 3);

        let mut with_command = session(100, 7);
        with_command.selected_command = Some("eventpanel".to_string());
        assert_eq!(admin_components(&with_command).len(), 5);
    }

    #[test]
    fn panel_section_offers_user_pickers() {
        let mut s = session(100, 7);
        s.section = AdminSection::Panel;
        // Section select, two user selects, stop row.
        assert_eq!(admin_components(&s).len(), 4);
    }
}
