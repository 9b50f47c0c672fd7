//! Ready event handler for bot initialization.

use std::sync::Arc;

use serenity::all::{Context, Ready};

use crate::{panel::live, state::AppContext};

/// Handles the ready event when the bot connects to Discord.
///
/// Live stats messages recorded by a previous process have no refresh task
/// anymore, so they are deleted here rather than left frozen.
pub async fn handle_ready(app: &Arc<AppContext>, ctx: Context, ready: Ready) {
    tracing::info!("{} is connected to Discord", ready.user.name);

    if let Err(err) = live::sweep_stale_panels(app, &ctx.http).await {
        tracing::error!("Failed to sweep stale live panels: {err}");
    }
}
