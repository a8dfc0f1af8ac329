//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs,
    config::ConfigCommands,
    init::InitArgs,
    passkey::PasskeyCommands,
    person::PersonCommands,
    status::StatusArgs,
    transfer::{ExportArgs, ImportArgs},
    unit::UnitCommands,
};

#[derive(Parser)]
#[command(name = "roster")]
#[command(author, version, about = "Unit roster - personnel and unit hierarchy manager")]
#[command(
    long_about = "Keeps a tree of units and the personnel assigned to them, stored locally \
                  or in a shared realtime store so every connected client sees the same roster."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .roster/)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Administrative passkey for commands that change the roster
    #[arg(long, global = true, env = "ROSTER_PASSKEY", hide_env_values = true)]
    pub passkey: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new roster workspace
    Init(InitArgs),

    /// Show workspace and backend status
    Status(StatusArgs),

    /// Unit hierarchy management
    #[command(subcommand)]
    Unit(UnitCommands),

    /// Personnel management
    #[command(subcommand)]
    Person(PersonCommands),

    /// Export the whole roster as JSON
    Export(ExportArgs),

    /// Replace the roster with a JSON export
    Import(ImportArgs),

    /// Administrative passkey management
    #[command(subcommand)]
    Passkey(PasskeyCommands),

    /// View and modify configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Use the configured default_format, else a table
    #[default]
    Auto,
    /// Aligned table for reading
    Table,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Tab-separated values (for piping)
    Tsv,
    /// Just IDs, one per line
    Id,
}
