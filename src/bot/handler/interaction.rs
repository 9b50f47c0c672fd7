//! Component and modal interaction routing.
//!
//! Custom id prefixes pick the owning module: `evp:` for the event panels,
//! `evc:` for the control panel and `ap:` for the admin panel. Errors are
//! logged and swallowed here at the gateway boundary.

use std::sync::Arc;

use serenity::all::{Context, Interaction};

use crate::{
    panel::{admin, control, event_panel},
    state::AppContext,
};

/// Handles component clicks and modal submissions.
pub async fn handle_interaction(app: &Arc<AppContext>, ctx: Context, interaction: Interaction) {
    match interaction {
        Interaction::Component(component) => {
            let custom_id = component.data.custom_id.clone();
            let result = if custom_id.starts_with("evp:") {
                event_panel::handle_component(app, &ctx, &component).await
            } else if custom_id.starts_with("evc:") {
                control::handle_component(app, &ctx, &component).await
            } else if custom_id.starts_with("ap:") {
                admin::handle_component(app, &ctx, &component).await
            } else {
                Ok(())
            };

            if let Err(err) = result {
                tracing::error!("Component interaction {custom_id} failed: {err}");
            }
        }
        Interaction::Modal(modal) => {
            let custom_id = modal.data.custom_id.clone();
            let result = if custom_id.starts_with("evp:modal:") {
                event_panel::handle_modal(app, &ctx, &modal).await
            } else if custom_id.starts_with("evc:modal:") {
                control::handle_modal(app, &ctx, &modal).await
            } else {
                Ok(())
            };

            if let Err(err) = result {
                tracing::error!("Modal submission {custom_id} failed: {err}");
            }
        }
        _ => {}
    }
}
