//! Kill tracking and win detection for the mini-game modes.
//!
//! Each mode has its own tracker keyed by game id. Trackers are synchronous
//! over their own state and take explicit timestamps, so the dedupe windows
//! and timers are unit-testable; the async glue (event subscription, presence
//! sync, countdowns) lives in each tracker's `arm` path.

pub mod deathmatch;
pub mod killstreak;
pub mod state;

pub use state::StandingRow;
