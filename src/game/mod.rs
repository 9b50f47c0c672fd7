//! Game-side integration: the client trait, event payload decoding, lobby
//! bookkeeping and the in-process simulator used for development and tests.

pub mod client;
pub mod event;
pub mod lobby;
pub mod session;
pub mod sim;
