//! Factory methods for creating test data.
//!
//! Each entity has its own factory module with both a `Factory` struct for
//! customization and a `create_*` convenience function for quick default creation.
//!
//! # Basic Usage
//!
//! ```rust,ignore
//! use test_utils::factory;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), sea_orm::DbErr> {
//!     let db = /* ... */;
//!
//!     // Create with defaults
//!     let panel = factory::panel_state::create_panel_state(&db).await?;
//!
//!     // Or customize via the builder
//!     let panel = factory::panel_state::PanelStateFactory::new(&db)
//!         .guild_id("987654321")
//!         .status("running")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod helpers;
pub mod live_panel;
pub mod panel_channel;
pub mod panel_state;

// Re-export commonly used factory functions for concise usage
pub use live_panel::create_live_panel;
pub use panel_channel::create_panel_channel;
pub use panel_state::create_panel_state;
