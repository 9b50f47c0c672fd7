use crate::error::{config::ConfigError, AppError};

/// Application configuration loaded from environment variables.
pub struct Config {
    pub database_url: String,
    pub discord_token: String,
    /// Prefix for staff text commands, e.g. `-eventpanel`.
    pub command_prefix: String,
    /// In-game display name the bot joins lobbies under.
    pub game_bot_name: String,
    /// Chat line sent once when the first player enters a fresh lobby.
    pub greeting_message: String,
    /// Path to the per-guild staff access JSON file.
    pub staff_access_path: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Returns
    /// - `Ok(Config)` - Configuration with all required variables present
    /// - `Err(AppError::ConfigErr)` - A required environment variable is missing
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?,
            discord_token: std::env::var("DISCORD_BOT_TOKEN")
                .map_err(|_| ConfigError::MissingEnvVar("DISCORD_BOT_TOKEN".to_string()))?,
            command_prefix: std::env::var("COMMAND_PREFIX").unwrap_or_else(|_| "-".to_string()),
            game_bot_name: std::env::var("GAME_BOT_NAME")
                .unwrap_or_else(|_| "EventBot".to_string()),
            greeting_message: std::env::var("GREETING_MESSAGE").unwrap_or_else(|_| "hi".to_string()),
            staff_access_path: std::env::var("STAFF_ACCESS_PATH")
                .unwrap_or_else(|_| "staffAccess.json".to_string()),
        })
    }
}
