//! Logical collections persisted in the key-value store

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::core::entity::Personnel;
use crate::core::roster::RosterIndex;
use crate::core::units::UnitTree;

/// The closed set of paths the roster reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorePath {
    /// unit id -> list of personnel
    PersonnelByUnit,
    /// list of units
    Units,
    /// id of the unit selected as context
    CurrentUnitId,
    /// hashed administrative passkey
    GmPasskey,
}

impl StorePath {
    /// Storage key for this path
    pub fn key(&self) -> &'static str {
        match self {
            StorePath::PersonnelByUnit => "personnelByUnit",
            StorePath::Units => "units",
            StorePath::CurrentUnitId => "currentUnitId",
            StorePath::GmPasskey => "gmPasskey",
        }
    }

    pub fn all() -> &'static [StorePath] {
        &[
            StorePath::PersonnelByUnit,
            StorePath::Units,
            StorePath::CurrentUnitId,
            StorePath::GmPasskey,
        ]
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Binds a [`StorePath`] to the Rust type stored there
///
/// The store enforces no schema, so every value crossing the boundary is
/// decoded through [`Collection::decode`] before anything trusts its shape.
/// Absent values decode to `Self::Value::default()`.
pub trait Collection {
    const PATH: StorePath;
    type Value: Serialize + Default + Clone + Send + Sync + 'static;

    fn decode(raw: Value) -> Result<Self::Value, serde_json::Error>;

    /// Decode an optional raw value, mapping absence to the default
    fn decode_opt(raw: Option<Value>) -> Result<Self::Value, serde_json::Error> {
        match raw {
            None | Some(Value::Null) => Ok(Self::Value::default()),
            Some(v) => Self::decode(v),
        }
    }
}

/// `units`
#[derive(Debug)]
pub struct UnitList;

impl Collection for UnitList {
    const PATH: StorePath = StorePath::Units;
    type Value = UnitTree;

    fn decode(raw: Value) -> Result<UnitTree, serde_json::Error> {
        serde_json::from_value(raw)
    }
}

/// `personnelByUnit`
#[derive(Debug)]
pub struct PersonnelGroups;

impl Collection for PersonnelGroups {
    const PATH: StorePath = StorePath::PersonnelByUnit;
    type Value = RosterIndex;

    fn decode(raw: Value) -> Result<RosterIndex, serde_json::Error> {
        // realtime stores drop empty lists, so groups may come back as null
        let groups: BTreeMap<String, Option<Vec<Personnel>>> = serde_json::from_value(raw)?;
        Ok(RosterIndex::new(
            groups
                .into_iter()
                .map(|(unit_id, people)| (unit_id, people.unwrap_or_default()))
                .collect(),
        ))
    }
}

/// `currentUnitId`
#[derive(Debug)]
pub struct CurrentUnit;

impl Collection for CurrentUnit {
    const PATH: StorePath = StorePath::CurrentUnitId;
    type Value = String;

    fn decode(raw: Value) -> Result<String, serde_json::Error> {
        serde_json::from_value(raw)
    }
}

/// `gmPasskey`
#[derive(Debug)]
pub struct Passkey;

impl Collection for Passkey {
    const PATH: StorePath = StorePath::GmPasskey;
    type Value = String;

    fn decode(raw: Value) -> Result<String, serde_json::Error> {
        serde_json::from_value(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_match_persisted_layout() {
        let keys: Vec<&str> = StorePath::all().iter().map(|p| p.key()).collect();
        assert_eq!(keys, ["personnelByUnit", "units", "currentUnitId", "gmPasskey"]);
    }

    #[test]
    fn test_absent_values_decode_to_defaults() {
        assert!(UnitList::decode_opt(None).unwrap().is_empty());
        assert!(PersonnelGroups::decode_opt(Some(Value::Null)).unwrap().is_empty());
        assert_eq!(CurrentUnit::decode_opt(None).unwrap(), "");
    }

    #[test]
    fn test_null_group_decodes_as_empty() {
        let raw = json!({
            "hq": [{"id": "p1", "name": "Ann"}],
            "sq1": null
        });
        let roster = PersonnelGroups::decode(raw).unwrap();
        assert_eq!(roster.count("hq"), 1);
        assert_eq!(roster.count("sq1"), 0);
    }

    #[test]
    fn test_malformed_units_rejected() {
        let raw = json!([{"name": "no id"}]);
        assert!(UnitList::decode(raw).is_err());
        assert!(Passkey::decode(json!(42)).is_err());
    }
}
