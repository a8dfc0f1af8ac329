//! `roster config` command - Configuration management

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use serde_yml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{find_project, success};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, RosterError};

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,

    /// Show only the workspace config file
    #[arg(long = "workspace-only", conflicts_with = "global_only")]
    pub workspace_only: bool,

    /// Show only the global (user) config file
    #[arg(long = "global-only")]
    pub global_only: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g. default_format, remote.enabled)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of workspace config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of workspace config
    #[arg(long, short = 'g')]
    pub global: bool,
}

/// Kind of value a key holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyKind {
    Text,
    Secret,
    Flag,
    Format,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, KeyKind, &str)] = &[
    ("log", KeyKind::Text, "Tracing filter for stderr diagnostics (e.g. warn, roster=debug)"),
    ("default_format", KeyKind::Format, "Default output format (table, json, csv, tsv, id)"),
    ("remote.enabled", KeyKind::Flag, "Use the remote realtime store"),
    ("remote.api_key", KeyKind::Secret, "Remote API key (required)"),
    ("remote.database_url", KeyKind::Text, "Remote database URL (required)"),
    ("remote.project_id", KeyKind::Text, "Remote project id (required)"),
    ("remote.auth_domain", KeyKind::Text, "Remote auth domain"),
    ("remote.storage_bucket", KeyKind::Text, "Remote storage bucket"),
    ("remote.messaging_sender_id", KeyKind::Secret, "Remote messaging sender id"),
    ("remote.app_id", KeyKind::Secret, "Remote app id"),
    ("remote.retry_failed_init", KeyKind::Flag, "Retry a failed remote connection on next use"),
];

fn key_kind(key: &str) -> Result<KeyKind> {
    VALID_KEYS
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, kind, _)| *kind)
        .ok_or_else(|| miette::miette!("unknown config key '{}'; see 'roster config keys'", key))
}

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args, global),
        ConfigCommands::Unset(args) => run_unset(args, global),
        ConfigCommands::Path => run_path(global),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    if args.workspace_only {
        return show_file("Workspace config:", &workspace_config_path(global)?);
    }
    if args.global_only {
        return show_file("Global config:", &global_config_path()?);
    }

    let project = find_project(global).ok();
    let config = Config::load_for(project.as_ref());

    if let Some(key) = &args.key {
        let kind = key_kind(key)?;
        match get_config_value(&config, key) {
            Some(_) if kind == KeyKind::Secret => println!("***masked***"),
            Some(value) => println!("{}", value),
            None => return Err(miette::miette!("Key '{}' is not set", key)),
        }
        return Ok(());
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    print_config_value("log", config.log.as_deref());
    print_config_value("default_format", config.default_format.as_deref());
    println!();
    println!("{}", style("Remote store").bold());
    for (field, value) in config.remote.masked_report() {
        println!("  {}: {}", style(format!("remote.{}", field)).cyan(), value);
    }
    println!(
        "  {}: {}",
        style("active").cyan(),
        if config.remote.is_active() {
            style("yes").green()
        } else {
            style("no").dim()
        }
    );

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Environment variables (ROSTER_LOG, ROSTER_REMOTE_*)");
    println!("  2. Workspace config (.roster/config.yaml)");
    println!("  3. Global config (~/.config/roster/config.yaml)");
    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let value = typed_value(&args.key, &args.value)?;
    let config_path = target_path(args.global, global)?;

    let mut config_map = read_mapping(&config_path)?;
    set_nested_value(&mut config_map, &args.key, value);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(&Value::Mapping(config_map)).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let shown = if key_kind(&args.key)? == KeyKind::Secret {
        "***masked***".to_string()
    } else {
        args.value.clone()
    };
    success(
        global,
        format!(
            "Set {} {} {} in {} config",
            style(&args.key).cyan(),
            style("→").dim(),
            style(shown).yellow(),
            scope(args.global)
        ),
    );
    Ok(())
}

fn run_unset(args: UnsetArgs, global: &GlobalOpts) -> Result<()> {
    key_kind(&args.key)?;
    let config_path = target_path(args.global, global)?;
    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_mapping(&config_path)?;
    if !unset_nested_value(&mut config_map, &args.key) {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&Value::Mapping(config_map)).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    success(
        global,
        format!("Removed {} from {} config", style(&args.key).cyan(), scope(args.global)),
    );
    Ok(())
}

fn run_path(global: &GlobalOpts) -> Result<()> {
    let global_path = global_config_path()?;

    println!("{}", style("Configuration file paths:").bold());
    println!();
    println!("  {} {}", style("Global:").cyan(), global_path.display());
    println!("         {}", exists_note(&global_path));

    println!();
    match workspace_config_path(global) {
        Ok(path) => {
            println!("  {} {}", style("Workspace:").cyan(), path.display());
            println!("            {}", exists_note(&path));
        }
        Err(_) => println!(
            "  {} {}",
            style("Workspace:").cyan(),
            style("(not in a roster workspace)").dim()
        ),
    }
    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();
    for (key, _, description) in VALID_KEYS {
        println!("  {:<28} {}", style(key).cyan(), style(description).dim());
    }
    println!();
    println!(
        "{}",
        style("Use 'roster config set <key> <value>' to set a value.").dim()
    );
    Ok(())
}

// Helper functions

fn scope(global: bool) -> &'static str {
    if global {
        "global"
    } else {
        "workspace"
    }
}

fn exists_note(path: &Path) -> console::StyledObject<&'static str> {
    if path.exists() {
        style("(exists)").green()
    } else {
        style("(not created)").dim()
    }
}

fn global_config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn workspace_config_path(global: &GlobalOpts) -> Result<PathBuf> {
    let project = find_project(global).map_err(RosterError::from)?;
    Ok(project.config_path())
}

fn target_path(use_global: bool, global: &GlobalOpts) -> Result<PathBuf> {
    if use_global {
        global_config_path()
    } else {
        workspace_config_path(global)
    }
}

/// Validate the raw text for `key` and convert it to a YAML value
fn typed_value(key: &str, raw: &str) -> Result<Value> {
    match key_kind(key)? {
        KeyKind::Flag => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(miette::miette!("'{}' expects true or false", key)),
        },
        KeyKind::Format => {
            OutputFormat::from_str(raw, true)
                .map_err(|_| miette::miette!("unknown output format '{}'", raw))?;
            Ok(Value::String(raw.to_lowercase()))
        }
        KeyKind::Text | KeyKind::Secret => Ok(Value::String(raw.to_string())),
    }
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    let remote = &config.remote;
    let flag = |value: Option<bool>| value.map(|b| b.to_string());
    match key {
        "log" => config.log.clone(),
        "default_format" => config.default_format.clone(),
        "remote.enabled" => flag(remote.enabled),
        "remote.api_key" => remote.api_key.clone(),
        "remote.database_url" => remote.database_url.clone(),
        "remote.project_id" => remote.project_id.clone(),
        "remote.auth_domain" => remote.auth_domain.clone(),
        "remote.storage_bucket" => remote.storage_bucket.clone(),
        "remote.messaging_sender_id" => remote.messaging_sender_id.clone(),
        "remote.app_id" => remote.app_id.clone(),
        "remote.retry_failed_init" => flag(remote.retry_failed_init),
        _ => None,
    }
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

fn show_file(title: &str, path: &Path) -> Result<()> {
    println!("{} {}", style(title).bold(), style(path.display()).dim());
    println!();
    if path.exists() {
        let content = fs::read_to_string(path).into_diagnostic()?;
        print!("{}", content);
    } else {
        println!("{}", style("(not created)").dim());
    }
    Ok(())
}

fn read_mapping(path: &Path) -> Result<Mapping> {
    if !path.exists() {
        return Ok(Mapping::new());
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    match serde_yml::from_str::<Value>(&content) {
        Ok(Value::Mapping(map)) => Ok(map),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(_) => Err(miette::miette!("{} is not a YAML mapping", path.display())),
        Err(e) => Err(miette::miette!("could not parse {}: {}", path.display(), e)),
    }
}

fn set_nested_value(root: &mut Mapping, key: &str, value: Value) {
    let mut parts: Vec<&str> = key.split('.').collect();
    let Some(last) = parts.pop() else {
        return;
    };

    let mut current = root;
    for part in parts {
        let entry = current
            .entry(Value::String(part.to_string()))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if !entry.is_mapping() {
            *entry = Value::Mapping(Mapping::new());
        }
        let Value::Mapping(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert(Value::String(last.to_string()), value);
}

fn unset_nested_value(root: &mut Mapping, key: &str) -> bool {
    let mut parts: Vec<&str> = key.split('.').collect();
    let Some(last) = parts.pop() else {
        return false;
    };

    let mut current = root;
    for part in parts {
        match current.get_mut(part) {
            Some(Value::Mapping(next)) => current = next,
            _ => return false,
        }
    }
    current.remove(last).is_some()
}
