//! `roster unit` command - Unit hierarchy management

use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Select};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{authorize, confirm, resolve_unit, success, Workspace};
use crate::cli::output::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::{Unit, UNASSIGNED_UNIT_ID};
use crate::core::units::UnitTree;
use crate::core::{RosterSession, RosterState};

#[derive(Subcommand, Debug)]
pub enum UnitCommands {
    /// List units as an indented tree, in display order
    List(ListArgs),

    /// Create a unit (its id is derived from the name)
    Add(AddArgs),

    /// Rename and/or move a unit
    Edit(EditArgs),

    /// Set or clear a unit's manual sort position
    Order(OrderArgs),

    /// Delete a unit, moving its personnel elsewhere
    Delete(DeleteArgs),

    /// Select the current unit used for new personnel
    Use(UseArgs),

    /// Show details of a unit
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show only the count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Unit name
    pub name: String,

    /// Parent unit (id or name); omit for a top-level unit
    #[arg(long, short = 'p')]
    pub parent: Option<String>,

    /// Manual sort position among units
    #[arg(long)]
    pub order: Option<i64>,

    /// Make the new unit the current unit
    #[arg(long = "use")]
    pub select: bool,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Unit to edit (id or name)
    pub unit: String,

    /// New name; personnel referring to the old name follow the rename
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// New parent unit (id or name)
    #[arg(long, short = 'p', conflicts_with = "top_level")]
    pub parent: Option<String>,

    /// Make the unit top-level
    #[arg(long)]
    pub top_level: bool,
}

#[derive(clap::Args, Debug)]
pub struct OrderArgs {
    /// Unit to reorder (id or name)
    pub unit: String,

    /// Sort position; lower numbers come first
    #[arg(required_unless_present = "clear", allow_negative_numbers = true)]
    pub position: Option<i64>,

    /// Remove the manual position
    #[arg(long, conflicts_with = "position")]
    pub clear: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Unit to delete (id or name)
    pub unit: String,

    /// Unit that receives the deleted unit's personnel (default: Unassigned)
    #[arg(long, short = 'r')]
    pub reassign_to: Option<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct UseArgs {
    /// Unit to select (id or name)
    pub unit: String,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Unit to show (default: current unit)
    pub unit: Option<String>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 24),
    ColumnDef::new("name", "NAME", 36),
    ColumnDef::new("parent", "PARENT", 24),
    ColumnDef::new("order", "ORDER", 6),
    ColumnDef::new("direct", "DIRECT", 6),
    ColumnDef::new("total", "TOTAL", 6),
    ColumnDef::new("current", "CUR", 3),
];

/// Run a unit subcommand
pub async fn run(cmd: UnitCommands, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::discover(global)?;
    let session = workspace.session().await?;
    let result = dispatch(cmd, &workspace, &session, global).await;
    session.close();
    result
}

async fn dispatch(
    cmd: UnitCommands,
    workspace: &Workspace,
    session: &RosterSession,
    global: &GlobalOpts,
) -> Result<()> {
    match cmd {
        UnitCommands::List(args) => run_list(args, workspace, session, global),
        UnitCommands::Show(args) => run_show(args, workspace, session, global),
        UnitCommands::Add(args) => {
            authorize(session, global).await?;
            run_add(args, session, global).await
        }
        UnitCommands::Edit(args) => {
            authorize(session, global).await?;
            run_edit(args, session, global).await
        }
        UnitCommands::Order(args) => {
            authorize(session, global).await?;
            run_order(args, session, global).await
        }
        UnitCommands::Delete(args) => {
            authorize(session, global).await?;
            run_delete(args, session, global).await
        }
        UnitCommands::Use(args) => {
            authorize(session, global).await?;
            run_use(args, session, global).await
        }
    }
}

fn run_list(
    args: ListArgs,
    workspace: &Workspace,
    session: &RosterSession,
    global: &GlobalOpts,
) -> Result<()> {
    let state = session.snapshot();
    if args.count {
        println!("{}", state.units.len());
        return Ok(());
    }

    let current = state.current_unit().map(|u| u.id.clone());
    let rows: Vec<TableRow> = state
        .units
        .ordered()
        .into_iter()
        .map(|unit| unit_row(&state, unit, current.as_deref() == Some(unit.id.as_str())))
        .collect();

    TableFormatter::new(COLUMNS, "unit").output(&rows, workspace.format(global))
}

fn unit_row(state: &RosterState, unit: &Unit, is_current: bool) -> TableRow {
    let parent = unit
        .parent()
        .map(|p| state.units.get(p).map_or(p, |u| u.name.as_str()))
        .unwrap_or_default();
    let total = state.roster.personnel_in_subtree(&state.units, &unit.id).len();

    TableRow::new(unit.id.clone())
        .cell("id", CellValue::Text(unit.id.clone()))
        .cell(
            "name",
            CellValue::Tree {
                name: unit.name.clone(),
                depth: state.units.depth(&unit.id),
            },
        )
        .cell("parent", CellValue::text(parent))
        .cell("order", unit.sort_order.map_or(CellValue::Empty, CellValue::Number))
        .cell("direct", CellValue::Number(state.roster.count(&unit.id) as i64))
        .cell("total", CellValue::Number(total as i64))
        .cell("current", CellValue::Flag(is_current))
}

fn run_show(
    args: ShowArgs,
    workspace: &Workspace,
    session: &RosterSession,
    global: &GlobalOpts,
) -> Result<()> {
    let state = session.snapshot();
    let unit = match &args.unit {
        Some(reference) => resolve_unit(&state.units, reference)?,
        None => state.resolve_unit(None)?,
    };

    let names = |units: Vec<&Unit>| units.into_iter().map(|u| u.name.clone()).collect::<Vec<_>>();
    let children = names(state.units.children(&unit.id));
    let parents = names(state.units.available_parents(Some(&unit.id)));
    let targets = names(state.units.reassign_targets(&unit.id));
    let direct = state.roster.count(&unit.id);
    let total = state.roster.personnel_in_subtree(&state.units, &unit.id).len();

    if workspace.format(global) == OutputFormat::Json {
        let json = serde_json::json!({
            "unit": unit,
            "path": state.units.path(&unit.id),
            "depth": state.units.depth(&unit.id),
            "children": children,
            "personnel": direct,
            "personnelInSubtree": total,
            "availableParents": parents,
            "reassignTargets": targets,
        });
        println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        return Ok(());
    }

    let list = |items: &[String]| {
        if items.is_empty() {
            style("-".to_string()).dim().to_string()
        } else {
            items.join(", ")
        }
    };

    println!("{}", style(&unit.name).bold());
    println!("  {:<18} {}", style("ID").dim(), style(&unit.id).cyan());
    println!("  {:<18} {}", style("Path").dim(), state.units.path(&unit.id));
    println!(
        "  {:<18} {}",
        style("Sort order").dim(),
        unit.sort_order.map_or("-".to_string(), |o| o.to_string())
    );
    println!("  {:<18} {}", style("Children").dim(), list(&children));
    println!("  {:<18} {} ({} including subunits)", style("Personnel").dim(), direct, total);
    println!("  {:<18} {}", style("Can move under").dim(), list(&parents));
    if !unit.is_unassigned() {
        println!("  {:<18} {}", style("Reassign targets").dim(), list(&targets));
    }
    Ok(())
}

fn resolve_parent(units: &UnitTree, reference: Option<&str>) -> Result<Option<String>> {
    reference
        .map(|r| resolve_unit(units, r).map(|u| u.id.clone()))
        .transpose()
}

async fn run_add(args: AddArgs, session: &RosterSession, global: &GlobalOpts) -> Result<()> {
    let state = session.snapshot();
    let parent = resolve_parent(&state.units, args.parent.as_deref())?;

    let unit = session.create_unit(&args.name, parent.as_deref()).await?;
    if args.order.is_some() {
        session.set_unit_sort_order(&unit.id, args.order).await?;
    }
    if args.select {
        session.select_unit(&unit.id).await?;
    }

    success(
        global,
        format!(
            "Created unit {} ({})",
            style(&unit.name).cyan(),
            style(&unit.id).dim()
        ),
    );
    Ok(())
}

async fn run_edit(args: EditArgs, session: &RosterSession, global: &GlobalOpts) -> Result<()> {
    let state = session.snapshot();
    let unit = resolve_unit(&state.units, &args.unit)?.clone();

    let new_parent = if args.top_level {
        Some(None)
    } else {
        resolve_parent(&state.units, args.parent.as_deref())?.map(Some)
    };

    let touched = match (&args.name, new_parent) {
        (None, None) => miette::bail!("nothing to change; pass --name, --parent or --top-level"),
        (Some(name), None) => session.rename_unit(&unit.id, name).await?,
        (None, Some(parent)) => {
            session.reparent_unit(&unit.id, parent.as_deref()).await?;
            0
        }
        (Some(name), Some(parent)) => session.edit_unit(&unit.id, name, parent.as_deref()).await?,
    };

    let state = session.snapshot();
    let shown = state.units.get(&unit.id).map_or(unit.name.clone(), |u| state.units.path(&u.id));
    success(global, format!("Updated unit {}", style(shown).cyan()));
    if touched > 0 && !global.quiet {
        println!("  {} personnel record(s) now refer to the new name", style(touched).cyan());
    }
    Ok(())
}

async fn run_order(args: OrderArgs, session: &RosterSession, global: &GlobalOpts) -> Result<()> {
    let state = session.snapshot();
    let unit = resolve_unit(&state.units, &args.unit)?.clone();
    let position = if args.clear { None } else { args.position };

    session.set_unit_sort_order(&unit.id, position).await?;
    match position {
        Some(p) => success(global, format!("{} moved to position {}", style(&unit.name).cyan(), p)),
        None => success(global, format!("Cleared sort position of {}", style(&unit.name).cyan())),
    }
    Ok(())
}

async fn run_delete(args: DeleteArgs, session: &RosterSession, global: &GlobalOpts) -> Result<()> {
    let state = session.snapshot();
    let unit = resolve_unit(&state.units, &args.unit)?.clone();
    let personnel = state.roster.count(&unit.id);

    let target = match &args.reassign_to {
        Some(reference) => resolve_unit(&state.units, reference)?.id.clone(),
        None if personnel > 0 && !args.yes && console::user_attended() => {
            pick_reassign_target(&state.units, &unit)?
        }
        None => UNASSIGNED_UNIT_ID.to_string(),
    };

    let prompt = format!(
        "Delete unit '{}' and move its {} personnel record(s)?",
        unit.name, personnel
    );
    if !confirm(&prompt, args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    let outcome = session.delete_unit(&unit.id, &target).await?;
    success(global, format!("Deleted unit {}", style(&outcome.unit.name).cyan()));
    if !global.quiet {
        if outcome.reassigned_personnel > 0 {
            let state = session.snapshot();
            let target_name = state.units.get(&target).map_or(target.as_str(), |u| u.name.as_str());
            println!(
                "  {} personnel record(s) moved to {}",
                style(outcome.reassigned_personnel).cyan(),
                style(target_name).yellow()
            );
        }
        if outcome.reparented_children > 0 {
            println!(
                "  {} subunit(s) moved up a level",
                style(outcome.reparented_children).cyan()
            );
        }
    }
    Ok(())
}

fn pick_reassign_target(units: &UnitTree, deleting: &Unit) -> Result<String> {
    let targets = units.reassign_targets(&deleting.id);
    let labels: Vec<String> = targets.iter().map(|u| units.path(&u.id)).collect();
    let default = targets
        .iter()
        .position(|u| u.is_unassigned())
        .unwrap_or_default();

    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Move personnel of '{}' to", deleting.name))
        .items(&labels)
        .default(default)
        .interact()
        .into_diagnostic()?;
    targets
        .get(choice)
        .map(|u| u.id.clone())
        .ok_or_else(|| miette::miette!("no unit selected"))
}

async fn run_use(args: UseArgs, session: &RosterSession, global: &GlobalOpts) -> Result<()> {
    let state = session.snapshot();
    let unit = resolve_unit(&state.units, &args.unit)?.clone();
    session.select_unit(&unit.id).await?;
    success(global, format!("Current unit is now {}", style(&unit.name).cyan()));
    Ok(())
}
