//! Discord-facing panels: the staff setup panel, the public announcement
//! panel, live leaderboards, the event control panel, the admin access panel
//! and the panel-channel settings commands.

pub mod admin;
pub mod catalog;
pub mod control;
pub mod event_panel;
pub mod live;
pub mod settings;
pub mod state;
pub mod view;
