//! CLI command implementations

pub mod completions;
pub mod config;
pub mod init;
pub mod passkey;
pub mod person;
pub mod status;
pub mod transfer;
pub mod unit;
