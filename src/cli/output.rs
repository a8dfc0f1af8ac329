//! Table formatting for CLI list commands
//!
//! Commands describe their columns once and build typed rows; the
//! formatter renders them as an aligned table, TSV, CSV, bare ids, or a
//! flat JSON array keyed by column.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::{Map, Value};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{format_short_id, truncate_str};
use crate::cli::OutputFormat;
use crate::core::entity::Status;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Record id, shortened in tables
    Id(String),
    /// Plain text, truncated to the column width in tables
    Text(String),
    /// Duty status with color coding
    Status(Status),
    /// Unit name indented by tree depth
    Tree { name: String, depth: usize },
    Number(i64),
    /// Yes/no marker, shown as a check in tables
    Flag(bool),
    Empty,
}

impl CellValue {
    /// Optional text, rendering empty strings as [`CellValue::Empty`]
    pub fn text(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }

    /// Table rendering (colors when attached to a terminal)
    pub fn format_table(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => style(format_short_id(id)).cyan().to_string(),
            CellValue::Text(s) => truncate_str(s, width),
            CellValue::Status(status) => {
                let s = status.to_string();
                let styled = match status {
                    Status::Available => style(s).green(),
                    Status::Deployed => style(s).cyan(),
                    Status::Inactive => style(s).dim(),
                    Status::Wia => style(s).yellow(),
                    Status::Kia => style(s).red().bold(),
                };
                styled.to_string()
            }
            CellValue::Tree { name, depth } => {
                let indent = "  ".repeat(*depth);
                truncate_str(&format!("{}{}", indent, name), width)
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Flag(true) => style("✓").green().to_string(),
            CellValue::Flag(false) => String::new(),
            CellValue::Empty => style("-").dim().to_string(),
        }
    }

    /// Get raw string value (no formatting, for piped output)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(id) => id.clone(),
            CellValue::Text(s) => s.clone(),
            CellValue::Status(status) => status.to_string(),
            CellValue::Tree { name, .. } => name.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Flag(b) => (if *b { "yes" } else { "no" }).to_string(),
            CellValue::Empty => String::new(),
        }
    }

    fn json(&self) -> Value {
        match self {
            CellValue::Number(n) => Value::from(*n),
            CellValue::Flag(b) => Value::Bool(*b),
            other => Value::String(other.raw()),
        }
    }
}

/// Column definition with header label and maximum table width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
#[derive(Debug, Clone)]
pub struct TableRow {
    pub id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Renders rows in every list output format
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str) -> Self {
        Self {
            columns,
            entity_name,
        }
    }

    pub fn output(&self, rows: &[TableRow], format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Tsv => self.output_tsv(rows),
            OutputFormat::Csv => self.output_csv(rows)?,
            OutputFormat::Id => {
                for row in rows {
                    println!("{}", row.id);
                }
            }
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&self.to_json(rows)).into_diagnostic()?;
                println!("{}", json);
            }
            OutputFormat::Table | OutputFormat::Auto => self.output_table(rows),
        }
        Ok(())
    }

    /// Rendered table text, without the summary line
    pub fn render_table(&self, rows: &[TableRow]) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().map(|c| c.header.to_string()));
        for row in rows {
            builder.push_record(self.columns.iter().map(|col| {
                row.get(col.key)
                    .map(|v| v.format_table(col.width))
                    .unwrap_or_default()
            }));
        }
        builder.build().with(Style::rounded()).to_string()
    }

    fn output_table(&self, rows: &[TableRow]) {
        if rows.is_empty() {
            println!("No {}s found.", self.entity_name);
            return;
        }
        println!("{}", self.render_table(rows));
        println!(
            "{} {}(s) found.",
            style(rows.len()).cyan(),
            self.entity_name
        );
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let header: Vec<&str> = self.columns.iter().map(|c| c.key).collect();
        println!("{}", header.join("\t"));
        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| {
                    row.get(col.key)
                        .map(|v| v.raw().replace(['\t', '\n'], " "))
                        .unwrap_or_default()
                })
                .collect();
            println!("{}", values.join("\t"));
        }
    }

    fn output_csv(&self, rows: &[TableRow]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(std::io::stdout());
        writer
            .write_record(self.columns.iter().map(|c| c.key))
            .into_diagnostic()?;
        for row in rows {
            writer
                .write_record(
                    self.columns
                        .iter()
                        .map(|col| row.get(col.key).map(CellValue::raw).unwrap_or_default()),
                )
                .into_diagnostic()?;
        }
        writer.flush().into_diagnostic()
    }

    pub fn to_json(&self, rows: &[TableRow]) -> Value {
        let objects = rows
            .iter()
            .map(|row| {
                let mut object = Map::new();
                for col in self.columns {
                    let value = row.get(col.key).map_or(Value::Null, CellValue::json);
                    object.insert(col.key.to_string(), value);
                }
                Value::Object(object)
            })
            .collect();
        Value::Array(objects)
    }
}
