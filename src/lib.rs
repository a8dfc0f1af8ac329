//! Roster: unit and personnel management over a realtime key-value store
//!
//! Units form a hierarchy; personnel records are stored grouped by the id
//! of their owning unit. All data lives in a path-addressed store that is
//! either a remote realtime backend or a local mock mirrored to disk.

pub mod cli;
pub mod core;
pub mod store;
