//! Error types for the event bot.
//!
//! `AppError` is the top-level error type. Most variants use `#[from]` for
//! automatic conversion. Discord gateway handlers log and swallow errors at the
//! boundary; everything below them propagates `AppError` with `?`.

pub mod config;

use thiserror::Error;

use crate::{error::config::ConfigError, game::client::GameError};

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error during startup or environment variable loading.
    #[error(transparent)]
    ConfigErr(#[from] ConfigError),

    /// Database operation error from SeaORM.
    #[error(transparent)]
    DbErr(#[from] sea_orm::DbErr),

    /// Discord API error from Serenity.
    ///
    /// Boxed due to large size.
    #[error(transparent)]
    DiscordErr(#[from] Box<serenity::Error>),

    /// Game client operation error.
    #[error(transparent)]
    GameErr(#[from] GameError),

    /// Filesystem error, e.g. reading or writing the staff access file.
    #[error(transparent)]
    IoErr(#[from] std::io::Error),

    /// JSON serialization error for persisted panel state or staff access.
    #[error(transparent)]
    JsonErr(#[from] serde_json::Error),

    /// Resource not found error.
    ///
    /// # Fields
    /// - Message describing what resource was not found
    #[error("{0}")]
    NotFound(String),

    /// Invalid input from a command or interaction.
    ///
    /// # Fields
    /// - Message describing what was invalid
    #[error("{0}")]
    InvalidInput(String),
}

/// Manual conversion from serenity::Error to AppError.
///
/// Boxes the error to reduce the size of the AppError enum, as serenity::Error
/// is very large and would make all AppError variants larger if not boxed.
impl From<serenity::Error> for AppError {
    fn from(err: serenity::Error) -> Self {
        AppError::DiscordErr(Box::new(err))
    }
}
