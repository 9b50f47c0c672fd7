mod live_panel;
mod panel_channel;
mod panel_state;
