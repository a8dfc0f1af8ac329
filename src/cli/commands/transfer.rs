//! `roster export` / `roster import` commands - Whole-roster JSON transfer

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::helpers::{authorize, confirm, success, Workspace};
use crate::cli::GlobalOpts;
use crate::core::transfer::{parse_import, ExportData};
use crate::core::{RosterError, RosterSession};

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Write to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Export file to import
    pub file: PathBuf,

    /// Replace the current roster without asking
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub async fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::discover(global)?;
    let session = workspace.session().await?;
    let state = session.snapshot();
    let exported = session.export_json();
    session.close();
    let json = exported?;

    match &args.output {
        Some(path) => {
            fs::write(path, format!("{}\n", json)).into_diagnostic()?;
            success(
                global,
                format!(
                    "Exported {} unit(s) and {} personnel record(s) to {}",
                    state.units.len(),
                    state.roster.len(),
                    style(path.display()).cyan()
                ),
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub async fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let text = fs::read_to_string(&args.file).into_diagnostic()?;

    // validate before touching the store so a bad file never prompts
    let preview = parse_import(&text).map_err(RosterError::from)?;

    let workspace = Workspace::discover(global)?;
    let session = workspace.session().await?;
    let result = replace_roster(&args, &text, &preview, &session, global).await;
    session.close();
    result
}

async fn replace_roster(
    args: &ImportArgs,
    text: &str,
    preview: &ExportData,
    session: &RosterSession,
    global: &GlobalOpts,
) -> Result<()> {
    authorize(session, global).await?;

    let prompt = format!(
        "Replace the current roster with {} unit(s) and {} personnel record(s) from {}?",
        preview.units.len(),
        preview.personnel_by_unit.len(),
        args.file.display()
    );
    if !confirm(&prompt, args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    let data = session.import_json(text).await?;
    success(
        global,
        format!(
            "Imported {} unit(s) and {} personnel record(s)",
            style(data.units.len()).cyan(),
            style(data.personnel_by_unit.len()).cyan()
        ),
    );
    if !data.export_date.is_empty() && !global.quiet {
        println!("  exported {}", style(&data.export_date).dim());
    }
    Ok(())
}
