pub use super::event_panel_state::Entity as EventPanelState;
pub use super::live_panel::Entity as LivePanel;
pub use super::panel_channel::Entity as PanelChannel;
