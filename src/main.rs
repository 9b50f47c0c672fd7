mod bot;
mod config;
mod data;
mod error;
mod game;
mod panel;
mod staff;
mod startup;
mod state;
mod tracker;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    config::Config, error::AppError, game::sim::SimClient, staff::access::StaffAccessStore,
    state::AppContext,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let db = startup::connect_to_database(&config).await?;

    let game = Arc::new(SimClient::new(&config.game_bot_name));
    let staff = StaffAccessStore::load(&config.staff_access_path)?;

    let app = Arc::new(AppContext::new(config, db, game, staff));

    tracing::info!("Starting Discord bot");

    bot::start::start_bot(app).await?;

    Ok(())
}
