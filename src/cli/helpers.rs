//! Shared helper functions for CLI commands
//!
//! Workspace and session setup, the passkey guard, and the lookups that
//! let commands accept either ids or names.

use clap::ValueEnum;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Password};
use miette::{IntoDiagnostic, Result};
use std::sync::Arc;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::credential::CredentialError;
use crate::core::entity::{Personnel, Unit};
use crate::core::error::{RosterError, UnitError};
use crate::core::project::{Project, ProjectError};
use crate::core::roster::RosterIndex;
use crate::core::units::UnitTree;
use crate::core::{Config, RosterSession};
use crate::store::{MockStore, StoreAdapter};

/// Find the workspace from `--workspace` or the current directory
pub fn find_project(global: &GlobalOpts) -> std::result::Result<Project, ProjectError> {
    match &global.workspace {
        Some(dir) => Project::discover_from(dir),
        None => Project::discover(),
    }
}

/// A discovered workspace with its merged configuration
#[derive(Debug)]
pub struct Workspace {
    pub project: Project,
    pub config: Config,
}

impl Workspace {
    pub fn discover(global: &GlobalOpts) -> Result<Self> {
        let project = find_project(global).map_err(RosterError::from)?;
        Ok(Self::for_project(project))
    }

    pub fn for_project(project: Project) -> Self {
        let config = Config::load_for(Some(&project));
        Self { project, config }
    }

    /// Store adapter over the workspace mirror and the configured remote
    pub fn adapter(&self) -> StoreAdapter {
        let mock = Arc::new(MockStore::open(self.project.store_path()));
        StoreAdapter::new(mock, self.config.remote.clone(), None)
    }

    /// Open a live session, seeding defaults on first use
    pub async fn session(&self) -> Result<RosterSession> {
        let session = RosterSession::open(Arc::new(self.adapter())).await?;
        Ok(session)
    }

    pub fn format(&self, global: &GlobalOpts) -> OutputFormat {
        resolve_format(global.format, self.config.default_format.as_deref())
    }
}

/// Turn `auto` into a concrete format using the configured default
pub fn resolve_format(requested: OutputFormat, configured: Option<&str>) -> OutputFormat {
    if requested != OutputFormat::Auto {
        return requested;
    }
    let Some(name) = configured else {
        return OutputFormat::Table;
    };
    match OutputFormat::from_str(name, true) {
        Ok(OutputFormat::Auto) => OutputFormat::Table,
        Ok(format) => format,
        Err(_) => {
            tracing::warn!(default_format = name, "unknown default_format in config, using table");
            OutputFormat::Table
        }
    }
}

/// Require the administrative passkey once one has been set
///
/// Taken from `--passkey`/`ROSTER_PASSKEY`, or prompted for when a user is
/// at the terminal.
pub async fn authorize(session: &RosterSession, global: &GlobalOpts) -> Result<()> {
    let gate = session.passkey();
    if !gate.is_set().await.into_diagnostic()? {
        return Ok(());
    }

    let input = match &global.passkey {
        Some(passkey) => passkey.clone(),
        None if console::user_attended() => prompt_passkey("Passkey")?,
        None => return Err(RosterError::from(CredentialError::Required).into()),
    };

    if !gate.verify(&input).await.into_diagnostic()? {
        return Err(RosterError::from(CredentialError::Mismatch).into());
    }
    Ok(())
}

pub fn prompt_passkey(prompt: &str) -> Result<String> {
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact()
        .into_diagnostic()
}

/// Ask before a destructive action unless `--yes` was given
///
/// Without a terminal there is nobody to ask, so the action is refused.
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !console::user_attended() {
        miette::bail!("not running interactively; pass --yes to confirm");
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Print a success line unless `--quiet`
pub fn success(global: &GlobalOpts, message: impl std::fmt::Display) {
    if !global.quiet {
        println!("{} {}", style("✓").green(), message);
    }
}

/// Look a unit up by id, then by name (case-insensitive)
pub fn resolve_unit<'a>(units: &'a UnitTree, reference: &str) -> Result<&'a Unit> {
    units
        .get(reference)
        .or_else(|| units.find_by_name(reference))
        .ok_or_else(|| RosterError::from(UnitError::UnknownUnit(reference.to_string())).into())
}

/// Look a personnel record up by id or unique id prefix
///
/// Returns the owning unit id with the record.
pub fn resolve_person<'a>(roster: &'a RosterIndex, reference: &str) -> Result<(&'a str, &'a Personnel)> {
    if let Some(found) = roster.find(reference) {
        return Ok(found);
    }

    let prefix = reference.to_lowercase();
    let matches: Vec<_> = roster
        .iter()
        .filter(|(_, p)| !prefix.is_empty() && p.id.to_lowercase().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [one] => Ok(*one),
        [] => Err(miette::miette!("no personnel record matches '{}'", reference)),
        many => Err(miette::miette!(
            "'{}' is ambiguous: it matches {} personnel records",
            reference,
            many.len()
        )),
    }
}

/// Shorten an id for table display
///
/// The result is a prefix of the id, so it can be passed back to commands.
pub fn format_short_id(id: &str) -> String {
    if id.chars().count() > 12 {
        id.chars().take(10).collect()
    } else {
        id.to_string()
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_short_id() {
        assert_eq!(format_short_id("p1"), "p1");
        assert_eq!(format_short_id("01J9ZQ4V8XK3M2N5P7R9T1W3Y5"), "01J9ZQ4V8X");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("Überschall", 6), "Übe...");
    }

    #[test]
    fn test_resolve_format() {
        assert_eq!(resolve_format(OutputFormat::Json, Some("csv")), OutputFormat::Json);
        assert_eq!(resolve_format(OutputFormat::Auto, Some("csv")), OutputFormat::Csv);
        assert_eq!(resolve_format(OutputFormat::Auto, Some("CSV")), OutputFormat::Csv);
        assert_eq!(resolve_format(OutputFormat::Auto, Some("bogus")), OutputFormat::Table);
        assert_eq!(resolve_format(OutputFormat::Auto, None), OutputFormat::Table);
    }

    #[test]
    fn test_resolve_unit_by_id_or_name() {
        let units = UnitTree::new(vec![Unit::unassigned(), Unit::new("hq", "Headquarters")]);
        assert_eq!(resolve_unit(&units, "hq").unwrap().name, "Headquarters");
        assert_eq!(resolve_unit(&units, "headquarters").unwrap().id, "hq");
        assert!(resolve_unit(&units, "nowhere").is_err());
    }

    #[test]
    fn test_resolve_person_by_prefix() {
        let mut roster = RosterIndex::default();
        roster.insert("hq", Personnel::new("01ABCDEF", "Ann"));
        roster.insert("hq", Personnel::new("01ABXYZ", "Bob"));

        assert_eq!(resolve_person(&roster, "01ABCDEF").unwrap().1.name, "Ann");
        assert_eq!(resolve_person(&roster, "01abc").unwrap().1.name, "Ann");
        assert!(resolve_person(&roster, "01AB").is_err());
        assert!(resolve_person(&roster, "zz").is_err());
        assert!(resolve_person(&roster, "").is_err());
    }
}
