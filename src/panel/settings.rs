//! Panel channel settings commands: `-panelsettings`, `-setpanel` and
//! `-clearpanel` route each panel to the channel it should post in.

use std::sync::Arc;

use serenity::all::{
    Channel, ChannelId, ChannelType, Context, CreateEmbed, CreateEmbedFooter, CreateMessage,
    Message, Timestamp,
};

use crate::{
    data::panel_channel::PanelChannelRepository, error::AppError, state::AppContext,
};

/// Panels that can be routed to a channel, with their display labels.
pub const PANELS: [(&str, &str); 3] = [
    ("eventpanel", "Mini Event Setup (Staff)"),
    ("eventannounce", "Mini Event Announcements (Public)"),
    ("adminpanel", "Admin Panel"),
];

fn panel_label(key: &str) -> Option<&'static str> {
    PANELS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
}

fn valid_panels() -> String {
    PANELS
        .iter()
        .map(|(k, _)| *k)
        .collect::<Vec<_>>()
        .join(", ")
}

async fn settings_embed(app: &AppContext, guild_id: &str) -> Result<CreateEmbed, AppError> {
    let bindings = PanelChannelRepository::new(&app.db)
        .all_for_guild(guild_id)
        .await?;

    let mut embed = CreateEmbed::new()
        .title("Panel Channel Settings")
        .description("Shows where each panel is configured to post.")
        .timestamp(Timestamp::now());

    for (key, label) in PANELS {
        let value = bindings
            .iter()
            .find(|b| b.panel_key == key)
            .map(|b| format!("<#{}>", b.channel_id))
            .unwrap_or_else(|| "_Not set_".to_string());
        embed = embed.field(label, value, false);
    }

    embed = embed
        .field(
            "Commands",
            "`-setpanel <panel> <#channel>`\n`-clearpanel <panel>`\n`-panelsettings`",
            false,
        )
        .field(
            "Valid panels",
            PANELS
                .iter()
                .map(|(k, _)| format!("`{k}`"))
                .collect::<Vec<_>>()
                .join(", "),
            false,
        );

    if let Some(newest) = bindings.iter().map(|b| b.updated_at).max() {
        embed = embed.footer(CreateEmbedFooter::new(format!(
            "Last updated: {}",
            newest.format("%Y-%m-%d %H:%M UTC")
        )));
    }

    Ok(embed)
}

async fn reply_settings_embed(
    app: &Arc<AppContext>,
    ctx: &Context,
    message: &Message,
    guild_id: &str,
) -> Result<(), AppError> {
    let embed = settings_embed(app, guild_id).await?;
    message
        .channel_id
        .send_message(
            &ctx.http,
            CreateMessage::new()
                .embed(embed)
                .reference_message(message),
        )
        .await?;
    Ok(())
}

/// `-panelsettings`: shows the guild's panel channel bindings.
pub async fn show_settings(
    app: &Arc<AppContext>,
    ctx: &Context,
    message: &Message,
) -> Result<(), AppError> {
    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };
    reply_settings_embed(app, ctx, message, &guild_id.to_string()).await
}

/// A channel mention like `<#123>` or a bare id.
fn parse_channel_arg(raw: &str) -> Option<ChannelId> {
    let id: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    id.parse::<u64>()
        .ok()
        .filter(|&v| v != 0)
        .map(ChannelId::new)
}

/// `-setpanel <panel> <#channel>`: binds a panel to a channel.
pub async fn set_panel(
    app: &Arc<AppContext>,
    ctx: &Context,
    message: &Message,
    args: &[&str],
) -> Result<(), AppError> {
    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };
    let guild = guild_id.to_string();

    let panel_key = args.first().map(|a| a.to_lowercase()).unwrap_or_default();
    if panel_label(&panel_key).is_none() {
        message
            .reply(&ctx.http, format!("Unknown panel. Valid: {}", valid_panels()))
            .await?;
        return Ok(());
    }

    let Some(channel_id) = args.get(1).and_then(|a| parse_channel_arg(a)) else {
        message.reply(&ctx.http, "Channel not found.").await?;
        return Ok(());
    };

    // Only text and announcement channels can host a panel.
    let postable = match channel_id.to_channel(&ctx.http).await {
        Ok(Channel::Guild(channel)) => {
            channel.guild_id == guild_id
                && matches!(channel.kind, ChannelType::Text | ChannelType::News)
        }
        _ => false,
    };
    if !postable {
        message
            .reply(&ctx.http, "That channel must be a text or announcement channel.")
            .await?;
        return Ok(());
    }

    PanelChannelRepository::new(&app.db)
        .set(&guild, &panel_key, &channel_id.to_string())
        .await?;

    reply_settings_embed(app, ctx, message, &guild).await
}

/// `-clearpanel <panel>`: removes a panel's channel binding.
pub async fn clear_panel(
    app: &Arc<AppContext>,
    ctx: &Context,
    message: &Message,
    args: &[&str],
) -> Result<(), AppError> {
    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };
    let guild = guild_id.to_string();

    let panel_key = args.first().map(|a| a.to_lowercase()).unwrap_or_default();
    if panel_label(&panel_key).is_none() {
        message
            .reply(&ctx.http, format!("Unknown panel. Valid: {}", valid_panels()))
            .await?;
        return Ok(());
    }

    PanelChannelRepository::new(&app.db)
        .clear(&guild, &panel_key)
        .await?;

    reply_settings_embed(app, ctx, message, &guild).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_args_accept_mentions_and_ids() {
        assert_eq!(parse_channel_arg("<#123456>"), Some(ChannelId::new(123456)));
        assert_eq!(parse_channel_arg("123456"), Some(ChannelId::new(123456)));
        assert_eq!(parse_channel_arg("general"), None);
        assert_eq!(parse_channel_arg(""), None);
    }

    #[test]
    fn panel_keys_resolve_labels() {
        assert_eq!(panel_label("eventpanel"), Some("Mini Event Setup (Staff)"));
        assert_eq!(
            panel_label("eventannounce"),
            Some("Mini Event Announcements (Public)")
        );
        assert_eq!(panel_label("adminpanel"), Some("Admin Panel"));
        assert_eq!(panel_label("livepanel"), None);
    }

    #[test]
    fn valid_panels_lists_every_key() {
        assert_eq!(valid_panels(), "eventpanel, eventannounce, adminpanel");
    }
}
