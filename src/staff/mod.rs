//! Staff authorization: per-guild role allow-lists for staff commands and the
//! admin-panel user allow-list, persisted to a JSON file.

pub mod access;
