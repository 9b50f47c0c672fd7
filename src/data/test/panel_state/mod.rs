use crate::data::panel_state::EventPanelRepository;
use crate::panel::catalog::EventKey;
use crate::panel::state::{PanelState, PanelStatus, PanelType};
use sea_orm::{DbErr, EntityTrait, PaginatorTrait};
use test_utils::{builder::TestBuilder, factory};

mod delete_by_message_id;
mod get_by_guild;
mod get_by_message_id;
mod save;
