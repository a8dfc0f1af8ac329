//! Roster entities - units and the personnel grouped under them

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Id of the permanent catch-all unit
pub const UNASSIGNED_UNIT_ID: &str = "unassigned";

/// Display name of the permanent catch-all unit
pub const UNASSIGNED_UNIT_NAME: &str = "Unassigned";

/// A node in the organizational forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// Stable key, derived from the name at creation
    pub id: String,

    /// Display label, unique case-insensitively
    pub name: String,

    /// Parent unit id; absent (or empty) means top-level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Manual position among siblings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

impl Unit {
    /// Create a top-level unit
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            sort_order: None,
        }
    }

    /// Builder-style parent assignment
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Parent id, treating an empty string as top-level
    pub fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|p| !p.is_empty())
    }

    /// Whether this is the permanent unassigned unit
    pub fn is_unassigned(&self) -> bool {
        self.id == UNASSIGNED_UNIT_ID
    }

    /// The permanent unassigned unit
    pub fn unassigned() -> Self {
        Self::new(UNASSIGNED_UNIT_ID, UNASSIGNED_UNIT_NAME)
    }
}

/// Units seeded into an empty store
pub fn default_units() -> Vec<Unit> {
    vec![Unit::unassigned()]
}

/// Display order for names and unit paths: case-insensitive first, then
/// byte order so names differing only in case still sort stably
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Duty status of a personnel record
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Status {
    #[default]
    Available,
    Deployed,
    Inactive,
    Wia,
    Kia,
}

impl Status {
    pub fn all() -> &'static [Status] {
        &[
            Status::Available,
            Status::Deployed,
            Status::Inactive,
            Status::Wia,
            Status::Kia,
        ]
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Available => write!(f, "available"),
            Status::Deployed => write!(f, "deployed"),
            Status::Inactive => write!(f, "inactive"),
            Status::Wia => write!(f, "wia"),
            Status::Kia => write!(f, "kia"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(Status::Available),
            "deployed" => Ok(Status::Deployed),
            "inactive" => Ok(Status::Inactive),
            "wia" => Ok(Status::Wia),
            "kia" => Ok(Status::Kia),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// Player or non-player character
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum CharacterType {
    #[default]
    Pc,
    Npc,
}

impl std::fmt::Display for CharacterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CharacterType::Pc => write!(f, "pc"),
            CharacterType::Npc => write!(f, "npc"),
        }
    }
}

impl std::str::FromStr for CharacterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pc" => Ok(CharacterType::Pc),
            "npc" => Ok(CharacterType::Npc),
            _ => Err(format!("Unknown character type: {}", s)),
        }
    }
}

/// A personnel record, stored inside its owning unit's group
///
/// `assigned_unit` and `secondment` hold unit *names*, not ids, so they
/// must be rewritten whenever the referenced unit is renamed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personnel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub callsign: String,
    #[serde(default)]
    pub rank: String,
    /// Numeric rank level kept as a string
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub assigned_unit: String,
    /// Temporary attachment; empty when not seconded
    #[serde(default)]
    pub secondment: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub character_type: CharacterType,
    #[serde(default)]
    pub notes: String,
}

impl Personnel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Secondment unit name, if seconded
    pub fn secondment(&self) -> Option<&str> {
        Some(self.secondment.as_str()).filter(|s| !s.is_empty())
    }
}

/// Partial update applied to a personnel record
///
/// `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonnelPatch {
    pub name: Option<String>,
    pub callsign: Option<String>,
    pub rank: Option<String>,
    pub grade: Option<String>,
    pub role: Option<String>,
    pub specialty: Option<String>,
    pub species: Option<String>,
    pub gender: Option<String>,
    pub assigned_unit: Option<String>,
    pub secondment: Option<String>,
    pub status: Option<Status>,
    pub character_type: Option<CharacterType>,
    pub notes: Option<String>,
}

impl PersonnelPatch {
    pub fn is_empty(&self) -> bool {
        *self == PersonnelPatch::default()
    }

    /// Apply every set field to `person`
    pub fn apply(&self, person: &mut Personnel) {
        fn set(slot: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                slot.clone_from(v);
            }
        }

        set(&mut person.name, &self.name);
        set(&mut person.callsign, &self.callsign);
        set(&mut person.rank, &self.rank);
        set(&mut person.grade, &self.grade);
        set(&mut person.role, &self.role);
        set(&mut person.specialty, &self.specialty);
        set(&mut person.species, &self.species);
        set(&mut person.gender, &self.gender);
        set(&mut person.assigned_unit, &self.assigned_unit);
        set(&mut person.secondment, &self.secondment);
        set(&mut person.notes, &self.notes);
        if let Some(status) = self.status {
            person.status = status;
        }
        if let Some(character_type) = self.character_type {
            person.character_type = character_type;
        }
    }
}
