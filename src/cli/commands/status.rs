//! `roster status` command - Workspace and backend overview

use console::style;
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeMap;

use crate::cli::helpers::Workspace;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Status;
use crate::core::filter::{rank_category, RankCategory};
use crate::core::RosterState;

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Also show the remote store settings (secrets masked)
    #[arg(long)]
    pub remote: bool,
}

#[derive(Debug, serde::Serialize)]
struct StatusReport {
    workspace: String,
    backend: String,
    remote_attempts: usize,
    passkey_set: bool,
    current_unit: Option<String>,
    units: usize,
    personnel: usize,
    by_status: BTreeMap<String, usize>,
    by_rank_category: BTreeMap<String, usize>,
}

impl StatusReport {
    fn collect(workspace: &Workspace, state: &RosterState, backend: String, attempts: usize, passkey_set: bool) -> Self {
        let mut by_status: BTreeMap<String, usize> =
            Status::all().iter().map(|s| (s.to_string(), 0)).collect();
        let mut by_rank_category = BTreeMap::new();

        for (_, person) in state.roster.iter() {
            *by_status.entry(person.status.to_string()).or_default() += 1;
            let category = rank_category(&person.grade)
                .as_ref()
                .map_or("ungraded".to_string(), RankCategory::to_string);
            *by_rank_category.entry(category).or_default() += 1;
        }

        Self {
            workspace: workspace.project.root().display().to_string(),
            backend,
            remote_attempts: attempts,
            passkey_set,
            current_unit: state.current_unit().map(|u| u.name.clone()),
            units: state.units.len(),
            personnel: state.roster.len(),
            by_status,
            by_rank_category,
        }
    }
}

pub async fn run(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::discover(global)?;
    let session = workspace.session().await?;
    let state = session.snapshot();
    let passkey_set = session.passkey().is_set().await.into_diagnostic()?;
    let report = StatusReport::collect(
        &workspace,
        &state,
        session.backend_kind().to_string(),
        session.store().init_attempts(),
        passkey_set,
    );
    session.close();

    if workspace.format(global) == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        return Ok(());
    }

    println!("{}", style("Roster Status").bold().underlined());
    println!();
    println!("  {:<14} {}", style("Workspace").dim(), report.workspace);
    println!("  {:<14} {}", style("Backend").dim(), style(&report.backend).cyan());
    println!(
        "  {:<14} {}",
        style("Passkey").dim(),
        if report.passkey_set {
            style("set").green()
        } else {
            style("not set").yellow()
        }
    );
    println!(
        "  {:<14} {}",
        style("Current unit").dim(),
        report.current_unit.as_deref().unwrap_or("-")
    );
    println!("  {:<14} {}", style("Units").dim(), report.units);
    println!("  {:<14} {}", style("Personnel").dim(), report.personnel);

    if report.personnel > 0 {
        println!();
        println!("{}", style("By status").bold());
        for (status, count) in &report.by_status {
            println!("  {:<14} {}", status, count);
        }
        println!();
        println!("{}", style("By rank category").bold());
        for (category, count) in &report.by_rank_category {
            println!("  {:<16} {}", category, count);
        }
    }

    if args.remote || global.verbose {
        println!();
        println!("{}", style("Remote store").bold());
        for (field, value) in workspace.config.remote.masked_report() {
            println!("  {:<20} {}", field, value);
        }
    }

    Ok(())
}
