//! Data repositories over the panel tables.
//!
//! Repositories convert between entity rows and the panel domain types at the
//! database boundary; callers never touch entity models directly.

pub mod live_panel;
pub mod panel_channel;
pub mod panel_state;

#[cfg(test)]
mod test;
