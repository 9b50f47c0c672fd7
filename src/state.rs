//! Shared application state handed to every handler.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::Config,
    game::{client::GameClient, lobby::LobbyRegistry, session::Greeter},
    panel::{admin::AdminSessions, control::ControlSessions, live::LivePanelRuntime},
    staff::access::StaffAccessStore,
    tracker::{deathmatch::DeathmatchTracker, killstreak::KillstreakTracker},
};

/// Everything the bot's handlers share: configuration, the database, the game
/// client and the in-memory runtime registries. Owned here and passed around
/// behind an `Arc` instead of living in module globals.
pub struct AppContext {
    pub config: Config,
    pub db: DatabaseConnection,
    pub game: Arc<dyn GameClient>,
    pub lobbies: LobbyRegistry,
    pub greeter: Arc<Greeter>,
    pub killstreak: Arc<KillstreakTracker>,
    pub deathmatch: Arc<DeathmatchTracker>,
    pub live_panels: LivePanelRuntime,
    pub control_sessions: ControlSessions,
    pub admin_sessions: AdminSessions,
    pub staff: StaffAccessStore,
}

impl AppContext {
    pub fn new(
        config: Config,
        db: DatabaseConnection,
        game: Arc<dyn GameClient>,
        staff: StaffAccessStore,
    ) -> Self {
        Self {
            config,
            db,
            game,
            lobbies: LobbyRegistry::new(),
            greeter: Arc::new(Greeter::new()),
            killstreak: Arc::new(KillstreakTracker::new()),
            deathmatch: Arc::new(DeathmatchTracker::new()),
            live_panels: LivePanelRuntime::new(),
            control_sessions: ControlSessions::new(),
            admin_sessions: AdminSessions::new(),
            staff,
        }
    }
}
