//! Roster export and import
//!
//! Exports are a single JSON document holding every unit and personnel
//! group. Imports accept the same document, validate its structure and
//! fill defaults for optional personnel fields before anything is decoded.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::roster::RosterIndex;
use crate::core::units::UnitTree;

/// Format version written to every export
pub const EXPORT_VERSION: &str = "1.0";

/// Fields filled with an empty string when absent
const TEXT_FIELDS: &[&str] = &[
    "gender",
    "grade",
    "secondment",
    "callsign",
    "role",
    "specialty",
    "species",
    "notes",
    "rank",
    "assignedUnit",
];

/// A rejected import, with a reason fit to show the user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ImportError {
    pub reason: String,
}

impl ImportError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The export document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub version: String,
    pub export_date: String,
    pub personnel_by_unit: RosterIndex,
    pub units: UnitTree,
}

impl ExportData {
    /// Snapshot the current state, stamped with the current time
    pub fn new(units: &UnitTree, roster: &RosterIndex) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            export_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            personnel_by_unit: roster.clone(),
            units: units.clone(),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Parse and validate an export document
pub fn parse_import(text: &str) -> Result<ExportData, ImportError> {
    let raw: Value = serde_json::from_str(text).map_err(|e| ImportError::new(e.to_string()))?;
    validate_import(raw)
}

/// Validate a decoded export document, filling personnel defaults
pub fn validate_import(raw: Value) -> Result<ExportData, ImportError> {
    let Value::Object(mut doc) = raw else {
        return Err(ImportError::new("Invalid file format"));
    };

    let version = doc.get("version").filter(|v| truthy(v)).cloned();
    let Some(version) = version else {
        return Err(ImportError::new("Missing version information"));
    };

    let Some(Value::Object(groups)) = doc.remove("personnelByUnit") else {
        return Err(ImportError::new("Missing or invalid personnel data"));
    };

    let units = match doc.remove("units") {
        Some(Value::Array(units)) => units,
        _ => return Err(ImportError::new("Missing or invalid units data")),
    };

    let mut filled = Map::new();
    for (unit_id, people) in groups {
        let Value::Array(people) = people else {
            return Err(ImportError::new(format!(
                "Invalid personnel data for unit {}",
                unit_id
            )));
        };
        let people = people
            .into_iter()
            .map(fill_defaults)
            .collect::<Result<Vec<_>, _>>()?;
        filled.insert(unit_id, Value::Array(people));
    }

    let personnel_by_unit: RosterIndex = serde_json::from_value(Value::Object(filled))
        .map_err(|e| ImportError::new(format!("Invalid personnel record: {}", e)))?;
    let units: UnitTree = serde_json::from_value(Value::Array(units))
        .map_err(|e| ImportError::new(format!("Missing or invalid units data: {}", e)))?;

    let export_date = doc
        .get("exportDate")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(ExportData {
        version: text_of(&version),
        export_date,
        personnel_by_unit,
        units,
    })
}

fn fill_defaults(person: Value) -> Result<Value, ImportError> {
    let missing = || ImportError::new("Personnel record missing required fields (id, name)");

    let Value::Object(mut person) = person else {
        return Err(missing());
    };
    for required in ["id", "name"] {
        if !person.get(required).is_some_and(truthy) {
            return Err(missing());
        }
    }

    for (field, fallback) in [("characterType", "pc"), ("status", "available")] {
        if !person.get(field).is_some_and(truthy) {
            person.insert(field.to_string(), Value::String(fallback.to_string()));
        }
    }

    for field in ["id", "name"].iter().chain(TEXT_FIELDS) {
        let text = match person.get(*field) {
            None | Some(Value::Null) => String::new(),
            Some(value) => text_of(value),
        };
        person.insert(field.to_string(), Value::String(text));
    }

    Ok(Value::Object(person))
}

/// JavaScript-style truthiness, which is what older exports were checked with
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Scalar values as text; numeric grades are common in hand-edited files
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
