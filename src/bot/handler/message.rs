//! Prefix command dispatch.
//!
//! Staff drive the bot with text commands like `-eventpanel`; a leading bot
//! mention is tolerated so `@Bot -eventpanel` works too. Permission checks
//! happen here, before any command module runs.

use std::sync::Arc;

use serenity::all::{
    Colour, Context, CreateEmbed, CreateMessage, Member, Message, PartialGuild, Permissions,
    RoleId, Timestamp,
};

use crate::{
    error::AppError,
    panel::{admin, control, event_panel, settings},
    state::AppContext,
};

/// Handle message creation in a channel
pub async fn handle_message(app: &Arc<AppContext>, ctx: Context, message: Message) {
    // Only guild messages from humans can carry commands.
    if message.author.bot || message.guild_id.is_none() {
        return;
    }

    let bot_id = ctx.cache.current_user().id;
    let content = strip_bot_mention(&message.content, &bot_id.to_string());
    let Some((command, args)) = parse_prefixed(content, &app.config.command_prefix) else {
        return;
    };

    if let Err(err) = dispatch(app, &ctx, &message, &command, &args).await {
        tracing::error!("Command -{command} failed: {err}");
    }
}

fn strip_bot_mention<'a>(content: &'a str, bot_id: &str) -> &'a str {
    let trimmed = content.trim_start();
    for mention in [format!("<@{bot_id}>"), format!("<@!{bot_id}>")] {
        if let Some(rest) = trimmed.strip_prefix(&mention) {
            return rest.trim_start();
        }
    }
    trimmed
}

fn parse_prefixed(content: &str, prefix: &str) -> Option<(String, Vec<String>)> {
    let raw = content.strip_prefix(prefix)?.trim();
    if raw.is_empty() {
        return None;
    }

    let mut parts = raw.split_whitespace();
    let command = parts.next()?.to_lowercase();
    let args = parts.map(str::to_string).collect();
    Some((command, args))
}

async fn dispatch(
    app: &Arc<AppContext>,
    ctx: &Context,
    message: &Message,
    command: &str,
    args: &[String],
) -> Result<(), AppError> {
    if !matches!(
        command,
        "eventpanel" | "controlevent" | "adminpanel" | "panelsettings" | "setpanel" | "clearpanel"
    ) {
        return Ok(());
    }

    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };

    // Message events carry no member permissions, so both are fetched.
    let member = guild_id.member(&ctx.http, message.author.id).await?;
    let permissions = match guild_id.to_partial_guild(&ctx.http).await {
        Ok(guild) => guild_permissions(&guild, &member),
        Err(err) => {
            tracing::warn!("Failed to resolve member permissions: {err}");
            Permissions::empty()
        }
    };

    match command {
        "adminpanel" => {
            let allowed = app.staff.can_access_admin_panel(
                &guild_id.to_string(),
                &message.author.id.to_string(),
                permissions,
            );
            if !allowed {
                return reply_admin_denied(ctx, message).await;
            }
            admin::post_admin_panel(app, ctx, message).await
        }
        "eventpanel" => {
            if !allowed_for(app, &guild_id.to_string(), "eventpanel", permissions, &member) {
                return reply_command_denied(app, ctx, message, "eventpanel").await;
            }
            event_panel::post_setup_panel(app, ctx, message).await
        }
        "controlevent" => {
            // The broader eventpanel grant also covers event control.
            let guild = guild_id.to_string();
            let allowed = allowed_for(app, &guild, "controlevent", permissions, &member)
                || allowed_for(app, &guild, "eventpanel", permissions, &member);
            if !allowed {
                return reply_command_denied(app, ctx, message, "controlevent").await;
            }
            control::send_control_panel(app, ctx, message).await
        }
        _ => {
            // panelsettings, setpanel and clearpanel share one grant.
            if !allowed_for(app, &guild_id.to_string(), "panelsettings", permissions, &member) {
                return reply_command_denied(app, ctx, message, "panelsettings").await;
            }

            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            match command {
                "panelsettings" => settings::show_settings(app, ctx, message).await,
                "setpanel" => settings::set_panel(app, ctx, message, &args).await,
                _ => settings::clear_panel(app, ctx, message, &args).await,
            }
        }
    }
}

/// Guild-level permissions from the member's roles. The `@everyone` role
/// shares the guild's id; owners and administrators get everything.
fn guild_permissions(guild: &PartialGuild, member: &Member) -> Permissions {
    if guild.owner_id == member.user.id {
        return Permissions::all();
    }

    let everyone = RoleId::new(guild.id.get());
    let mut permissions = guild
        .roles
        .get(&everyone)
        .map(|role| role.permissions)
        .unwrap_or_else(Permissions::empty);
    for role_id in &member.roles {
        if let Some(role) = guild.roles.get(role_id) {
            permissions |= role.permissions;
        }
    }

    if permissions.contains(Permissions::ADMINISTRATOR) {
        return Permissions::all();
    }
    permissions
}

fn allowed_for(
    app: &AppContext,
    guild_id: &str,
    command: &str,
    permissions: Permissions,
    member: &Member,
) -> bool {
    let roles: Vec<String> = member.roles.iter().map(|r| r.to_string()).collect();
    app.staff
        .can_run_staff_command(guild_id, command, permissions, &roles)
}

async fn reply_command_denied(
    app: &Arc<AppContext>,
    ctx: &Context,
    message: &Message,
    command: &str,
) -> Result<(), AppError> {
    let guild = message.guild_id.map(|g| g.to_string()).unwrap_or_default();
    let roles = app.staff.roles_for_command(&guild, command);
    let role_text = if roles.is_empty() {
        "_None configured_".to_string()
    } else {
        roles
            .iter()
            .map(|id| format!("<@&{id}>"))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let prefix = &app.config.command_prefix;
    let embed = CreateEmbed::new()
        .title("Permission denied")
        .colour(Colour::RED)
        .description(format!(
            "You can't use `{prefix}{command}`.\n\n**Allowed roles:** {role_text}\n**Everyone else:** denied"
        ))
        .timestamp(Timestamp::now());

    message
        .channel_id
        .send_message(
            &ctx.http,
            CreateMessage::new().embed(embed).reference_message(message),
        )
        .await?;
    Ok(())
}

async fn reply_admin_denied(ctx: &Context, message: &Message) -> Result<(), AppError> {
    let embed = CreateEmbed::new()
        .title("Permission denied")
        .colour(Colour::RED)
        .description(
            "You don't have access to the admin panel.\n\n**Allowed:** Admins / Manage Server, or users explicitly granted access.",
        )
        .timestamp(Timestamp::now());

    message
        .channel_id
        .send_message(
            &ctx.http,
            CreateMessage::new().embed(embed).reference_message(message),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_prefix_is_stripped() {
        assert_eq!(strip_bot_mention("<@42> -eventpanel", "42"), "-eventpanel");
        assert_eq!(strip_bot_mention("<@!42> -eventpanel", "42"), "-eventpanel");
        assert_eq!(strip_bot_mention("-eventpanel", "42"), "-eventpanel");
        assert_eq!(strip_bot_mention("<@99> -eventpanel", "42"), "<@99> -eventpanel");
    }

    #[test]
    fn prefixed_commands_parse_into_command_and_args() {
        assert_eq!(
            parse_prefixed("-setpanel eventannounce <#123>", "-"),
            Some((
                "setpanel".to_string(),
                vec!["eventannounce".to_string(), "<#123>".to_string()]
            ))
        );
        assert_eq!(
            parse_prefixed("-EventPanel", "-"),
            Some(("eventpanel".to_string(), Vec::new()))
        );
        assert_eq!(parse_prefixed("hello there", "-"), None);
        assert_eq!(parse_prefixed("-", "-"), None);
    }
}
