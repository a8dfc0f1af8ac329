//! `roster person` command - Personnel management

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeSet;

use crate::cli::helpers::{authorize, confirm, resolve_person, resolve_unit, success, Workspace};
use crate::cli::output::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::{CharacterType, Personnel, PersonnelPatch, Status};
use crate::core::filter::{filter_personnel, rank_category, sort_by_name, sort_by_rank, RankCategory};
use crate::core::units::UnitTree;
use crate::core::{RosterSession, SearchFilters};

#[derive(Subcommand, Debug)]
pub enum PersonCommands {
    /// Add a personnel record to a unit (default: current unit)
    Add(AddArgs),

    /// Change fields of a personnel record
    Edit(EditArgs),

    /// Move a record to another unit
    Move(MoveArgs),

    /// Delete a personnel record
    Delete(DeleteArgs),

    /// Show one personnel record
    Show(ShowArgs),

    /// List personnel of a unit and its subunits, or of the whole roster
    List(ListArgs),

    /// List the distinct specialties in use
    Specialties,
}

/// Optional record fields shared by add and edit
#[derive(clap::Args, Debug, Default)]
pub struct RecordFields {
    #[arg(long)]
    pub callsign: Option<String>,

    /// Rank title (e.g. "Sergeant")
    #[arg(long)]
    pub rank: Option<String>,

    /// Numeric rank level; 1-3 junior enlisted, 4-8 NCO, 9-16 officer
    #[arg(long)]
    pub grade: Option<String>,

    #[arg(long)]
    pub role: Option<String>,

    #[arg(long)]
    pub specialty: Option<String>,

    #[arg(long)]
    pub species: Option<String>,

    #[arg(long)]
    pub gender: Option<String>,

    /// Unit the person is temporarily attached to (id or name; "" clears)
    #[arg(long)]
    pub secondment: Option<String>,

    #[arg(long, value_enum)]
    pub status: Option<Status>,

    /// Player or non-player character
    #[arg(long, value_enum, alias = "type")]
    pub character_type: Option<CharacterType>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Full name
    pub name: String,

    /// Owning unit (id or name; default: current unit)
    #[arg(long, short = 'u')]
    pub unit: Option<String>,

    #[command(flatten)]
    pub fields: RecordFields,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Personnel id (or unique id prefix)
    pub id: String,

    /// New full name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Move to the unit with this id or name
    #[arg(long)]
    pub assigned_unit: Option<String>,

    #[command(flatten)]
    pub fields: RecordFields,
}

#[derive(clap::Args, Debug)]
pub struct MoveArgs {
    /// Personnel id (or unique id prefix)
    pub id: String,

    /// Target unit (id or name)
    pub unit: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Personnel id (or unique id prefix)
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Personnel id (or unique id prefix)
    pub id: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Highest grade first
    #[default]
    Rank,
    /// Alphabetical
    Name,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Unit whose subtree to list (id or name; default: current unit)
    pub unit: Option<String>,

    /// List the whole roster
    #[arg(long, conflicts_with = "unit")]
    pub all: bool,

    /// Text matched against name, callsign, rank, specialty and role
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Only these statuses (repeatable or comma-separated)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub status: Vec<Status>,

    /// Only these rank categories
    #[arg(long, value_enum, value_delimiter = ',')]
    pub rank_category: Vec<RankCategory>,

    /// Only these specialties
    #[arg(long)]
    pub specialty: Vec<String>,

    /// Only player or only non-player characters
    #[arg(long, value_enum, value_delimiter = ',', alias = "type")]
    pub character_type: Vec<CharacterType>,

    /// Only personnel assigned to these units (id or name)
    #[arg(long)]
    pub assigned_unit: Vec<String>,

    /// Only personnel seconded to these units (id or name)
    #[arg(long)]
    pub secondment: Vec<String>,

    /// Include inactive personnel
    #[arg(long)]
    pub show_inactive: bool,

    /// Sort order
    #[arg(long, value_enum, default_value = "rank")]
    pub sort: SortBy,

    /// Show only the count
    #[arg(long)]
    pub count: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 12),
    ColumnDef::new("name", "NAME", 24),
    ColumnDef::new("callsign", "CALLSIGN", 14),
    ColumnDef::new("rank", "RANK", 16),
    ColumnDef::new("grade", "GRADE", 5),
    ColumnDef::new("role", "ROLE", 18),
    ColumnDef::new("specialty", "SPECIALTY", 16),
    ColumnDef::new("unit", "UNIT", 20),
    ColumnDef::new("secondment", "SECONDMENT", 20),
    ColumnDef::new("status", "STATUS", 9),
    ColumnDef::new("type", "TYPE", 4),
];

/// Run a person subcommand
pub async fn run(cmd: PersonCommands, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::discover(global)?;
    let session = workspace.session().await?;
    let result = dispatch(cmd, &workspace, &session, global).await;
    session.close();
    result
}

async fn dispatch(
    cmd: PersonCommands,
    workspace: &Workspace,
    session: &RosterSession,
    global: &GlobalOpts,
) -> Result<()> {
    match cmd {
        PersonCommands::List(args) => run_list(args, workspace, session, global),
        PersonCommands::Show(args) => run_show(args, workspace, session, global),
        PersonCommands::Specialties => {
            for specialty in session.snapshot().roster.specialties() {
                println!("{}", specialty);
            }
            Ok(())
        }
        PersonCommands::Add(args) => {
            authorize(session, global).await?;
            run_add(args, session, global).await
        }
        PersonCommands::Edit(args) => {
            authorize(session, global).await?;
            run_edit(args, session, global).await
        }
        PersonCommands::Move(args) => {
            authorize(session, global).await?;
            run_move(args, session, global).await
        }
        PersonCommands::Delete(args) => {
            authorize(session, global).await?;
            run_delete(args, session, global).await
        }
    }
}

/// Secondment input as the unit name it is stored as; empty clears it
fn secondment_name(units: &UnitTree, reference: &str) -> Result<String> {
    if reference.trim().is_empty() {
        return Ok(String::new());
    }
    Ok(resolve_unit(units, reference)?.name.clone())
}

/// Filter values are stored unit names; ids are translated, unknown text
/// is kept so stale names still match
fn unit_names(units: &UnitTree, references: &[String]) -> BTreeSet<String> {
    references
        .iter()
        .map(|r| {
            units
                .get(r)
                .or_else(|| units.find_by_name(r))
                .map_or_else(|| r.clone(), |u| u.name.clone())
        })
        .collect()
}

async fn run_add(args: AddArgs, session: &RosterSession, global: &GlobalOpts) -> Result<()> {
    let state = session.snapshot();
    let unit_id = match &args.unit {
        Some(reference) => Some(resolve_unit(&state.units, reference)?.id.clone()),
        None => None,
    };

    let fields = args.fields;
    let secondment = match &fields.secondment {
        Some(reference) => secondment_name(&state.units, reference)?,
        None => String::new(),
    };
    let draft = Personnel {
        callsign: fields.callsign.unwrap_or_default(),
        rank: fields.rank.unwrap_or_default(),
        grade: fields.grade.unwrap_or_default(),
        role: fields.role.unwrap_or_default(),
        specialty: fields.specialty.unwrap_or_default(),
        species: fields.species.unwrap_or_default(),
        gender: fields.gender.unwrap_or_default(),
        secondment,
        status: fields.status.unwrap_or_default(),
        character_type: fields.character_type.unwrap_or_default(),
        notes: fields.notes.unwrap_or_default(),
        ..Personnel::new("", args.name.trim())
    };
    if draft.name.is_empty() {
        miette::bail!("name is required");
    }

    let person = session.add_personnel(draft, unit_id.as_deref()).await?;

    if global.quiet {
        println!("{}", person.id);
    } else {
        success(
            global,
            format!(
                "Added {} to {} ({})",
                style(&person.name).cyan(),
                style(&person.assigned_unit).yellow(),
                style(&person.id).dim()
            ),
        );
    }
    Ok(())
}

async fn run_edit(args: EditArgs, session: &RosterSession, global: &GlobalOpts) -> Result<()> {
    let state = session.snapshot();
    let (_, person) = resolve_person(&state.roster, &args.id)?;
    let id = person.id.clone();

    let assigned_unit = match &args.assigned_unit {
        Some(reference) => Some(resolve_unit(&state.units, reference)?.name.clone()),
        None => None,
    };
    let secondment = match &args.fields.secondment {
        Some(reference) => Some(secondment_name(&state.units, reference)?),
        None => None,
    };

    let fields = args.fields;
    let patch = PersonnelPatch {
        name: args.name.map(|n| n.trim().to_string()),
        callsign: fields.callsign,
        rank: fields.rank,
        grade: fields.grade,
        role: fields.role,
        specialty: fields.specialty,
        species: fields.species,
        gender: fields.gender,
        assigned_unit,
        secondment,
        status: fields.status,
        character_type: fields.character_type,
        notes: fields.notes,
    };
    if patch.is_empty() {
        miette::bail!("nothing to change; pass at least one field option");
    }
    if patch.name.as_deref() == Some("") {
        miette::bail!("name is required");
    }

    if !session.update_personnel(&id, &patch).await? {
        miette::bail!("no personnel record with id '{}'", id);
    }

    let state = session.snapshot();
    let name = state.roster.find(&id).map_or(id.clone(), |(_, p)| p.name.clone());
    success(global, format!("Updated {}", style(name).cyan()));
    Ok(())
}

async fn run_move(args: MoveArgs, session: &RosterSession, global: &GlobalOpts) -> Result<()> {
    let state = session.snapshot();
    let (_, person) = resolve_person(&state.roster, &args.id)?;
    let unit = resolve_unit(&state.units, &args.unit)?;

    if !session.reassign_personnel(&person.id, &unit.id).await? {
        miette::bail!("no personnel record with id '{}'", person.id);
    }
    success(
        global,
        format!("Moved {} to {}", style(&person.name).cyan(), style(&unit.name).yellow()),
    );
    Ok(())
}

async fn run_delete(args: DeleteArgs, session: &RosterSession, global: &GlobalOpts) -> Result<()> {
    let state = session.snapshot();
    let (_, person) = resolve_person(&state.roster, &args.id)?;

    if !confirm(&format!("Delete {} ({})?", person.name, person.id), args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    match session.delete_personnel(&person.id).await? {
        Some(removed) => success(global, format!("Deleted {}", style(&removed.name).cyan())),
        None => miette::bail!("no personnel record with id '{}'", person.id),
    }
    Ok(())
}

fn run_show(
    args: ShowArgs,
    workspace: &Workspace,
    session: &RosterSession,
    global: &GlobalOpts,
) -> Result<()> {
    let state = session.snapshot();
    let (unit_id, person) = resolve_person(&state.roster, &args.id)?;

    if workspace.format(global) == OutputFormat::Json {
        let mut json = serde_json::to_value(person).into_diagnostic()?;
        json["unitId"] = serde_json::Value::String(unit_id.to_string());
        println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        return Ok(());
    }

    let category = rank_category(&person.grade).map_or("-".to_string(), |c| c.to_string());
    let fields: [(&str, String); 12] = [
        ("ID", person.id.clone()),
        ("Callsign", person.callsign.clone()),
        ("Rank", person.rank.clone()),
        ("Grade", format!("{} ({})", or_dash(&person.grade), category)),
        ("Role", person.role.clone()),
        ("Specialty", person.specialty.clone()),
        ("Species", person.species.clone()),
        ("Gender", person.gender.clone()),
        ("Unit", state.units.path(unit_id)),
        ("Secondment", person.secondment.clone()),
        ("Status", person.status.to_string()),
        ("Type", person.character_type.to_string()),
    ];

    println!("{}", style(&person.name).bold());
    for (label, value) in &fields {
        println!("  {:<12} {}", style(label).dim(), or_dash(value));
    }
    if !person.notes.is_empty() {
        println!();
        println!("{}", person.notes);
    }
    Ok(())
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn run_list(
    args: ListArgs,
    workspace: &Workspace,
    session: &RosterSession,
    global: &GlobalOpts,
) -> Result<()> {
    let state = session.snapshot();

    let filters = SearchFilters {
        search_query: args.search.clone().unwrap_or_default(),
        statuses: args.status.iter().copied().collect(),
        rank_categories: args.rank_category.iter().copied().collect(),
        specialties: args.specialty.iter().cloned().collect(),
        character_types: args.character_type.iter().copied().collect(),
        assigned_units: unit_names(&state.units, &args.assigned_unit),
        secondments: unit_names(&state.units, &args.secondment),
        show_inactive: args.show_inactive,
    };

    let (scope, people) = if args.all {
        let everyone = state.roster.iter().map(|(_, p)| p);
        ("all units".to_string(), filter_personnel(everyone, &filters))
    } else {
        let unit = match &args.unit {
            Some(reference) => resolve_unit(&state.units, reference)?,
            None => state.resolve_unit(None)?,
        };
        let subtree = state.roster.personnel_in_subtree(&state.units, &unit.id);
        (state.units.path(&unit.id), filter_personnel(subtree, &filters))
    };
    let people = match args.sort {
        SortBy::Rank => sort_by_rank(people),
        SortBy::Name => sort_by_name(people),
    };

    if args.count {
        println!("{}", people.len());
        return Ok(());
    }

    let format = workspace.format(global);
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&people).into_diagnostic()?);
        return Ok(());
    }

    if format == OutputFormat::Table && !global.quiet {
        let mut heading = format!("{}", style(&scope).bold());
        if filters.is_active() {
            heading.push_str(&format!(
                " {}",
                style(format!("({} filter(s) active)", filters.active_count())).dim()
            ));
        }
        println!("{}", heading);
    }

    let rows: Vec<TableRow> = people.iter().map(|p| person_row(p)).collect();
    TableFormatter::new(COLUMNS, "personnel record").output(&rows, format)
}

fn person_row(person: &Personnel) -> TableRow {
    TableRow::new(person.id.clone())
        .cell("id", CellValue::Id(person.id.clone()))
        .cell("name", CellValue::Text(person.name.clone()))
        .cell("callsign", CellValue::text(&person.callsign))
        .cell("rank", CellValue::text(&person.rank))
        .cell("grade", CellValue::text(&person.grade))
        .cell("role", CellValue::text(&person.role))
        .cell("specialty", CellValue::text(&person.specialty))
        .cell("unit", CellValue::text(&person.assigned_unit))
        .cell("secondment", CellValue::text(&person.secondment))
        .cell("status", CellValue::Status(person.status))
        .cell("type", CellValue::Text(person.character_type.to_string()))
}
