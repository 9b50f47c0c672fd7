use crate::data::panel_channel::PanelChannelRepository;
use sea_orm::{DbErr, EntityTrait, PaginatorTrait};
use test_utils::builder::TestBuilder;

mod all_for_guild;
mod clear;
mod get_and_set;
