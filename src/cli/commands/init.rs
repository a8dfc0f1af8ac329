//! `roster init` command - Initialize a new roster workspace

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::Workspace;
use crate::cli::GlobalOpts;
use crate::core::project::{Project, ProjectError};
use crate::core::RosterError;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Rewrite the config template even if .roster/ already exists
    #[arg(long)]
    pub force: bool,
}

pub async fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    let project = match project {
        Ok(project) => project,
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} Roster workspace already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("roster init --force").yellow());
            return Ok(());
        }
        Err(e) => return Err(RosterError::from(e).into()),
    };

    // opening a session seeds the default units into an empty store
    let workspace = Workspace::for_project(project);
    let session = workspace.session().await?;
    let state = session.snapshot();
    session.close();

    if global.quiet {
        return Ok(());
    }

    println!(
        "{} Initialized roster workspace at {}",
        style("✓").green(),
        style(workspace.project.root().display()).cyan()
    );
    println!();
    println!("Created:");
    for file in [workspace.project.config_path(), workspace.project.store_path()] {
        if file.exists() {
            let shown = file
                .strip_prefix(workspace.project.root())
                .unwrap_or(file.as_path())
                .display()
                .to_string();
            println!("  {}", style(shown).dim());
        }
    }
    println!();
    println!(
        "{} unit(s) ready, current unit {}",
        style(state.units.len()).cyan(),
        style(state.current_unit().map_or("-", |u| u.name.as_str())).yellow()
    );
    println!();
    println!("Next steps:");
    println!("  {} Create a unit", style("roster unit add \"1st Platoon\"").yellow());
    println!("  {} Add personnel", style("roster person add \"Jane Doe\" --grade 5").yellow());
    println!("  {} Protect changes with a passkey", style("roster passkey set").yellow());
    Ok(())
}
