pub mod event_panel_state;
pub mod live_panel;
pub mod panel_channel;
pub mod prelude;
