//! Personnel storage grouped by unit id
//!
//! Records live in the group of their owning unit while `assigned_unit`
//! carries that unit's *name*. Every operation here that moves a record
//! between groups rewrites the name as well, so both stay in agreement.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::core::entity::{Personnel, PersonnelPatch, Unit};
use crate::core::units::UnitTree;

/// Mapping of unit id to the personnel grouped under it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RosterIndex {
    groups: BTreeMap<String, Vec<Personnel>>,
}

impl RosterIndex {
    pub fn new(groups: BTreeMap<String, Vec<Personnel>>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &BTreeMap<String, Vec<Personnel>> {
        &self.groups
    }

    /// Personnel grouped directly under `unit_id`
    pub fn group(&self, unit_id: &str) -> &[Personnel] {
        self.groups.get(unit_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of personnel grouped directly under `unit_id`
    pub fn count(&self, unit_id: &str) -> usize {
        self.group(unit_id).len()
    }

    /// Total number of personnel across every group
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every record with the id of the group holding it
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Personnel)> {
        self.groups
            .iter()
            .flat_map(|(unit_id, people)| people.iter().map(move |p| (unit_id.as_str(), p)))
    }

    /// Locate a record by id, scanning every group; first match wins
    pub fn find(&self, personnel_id: &str) -> Option<(&str, &Personnel)> {
        self.iter().find(|(_, p)| p.id == personnel_id)
    }

    fn locate(&self, personnel_id: &str) -> Option<(String, usize)> {
        self.groups.iter().find_map(|(unit_id, people)| {
            people
                .iter()
                .position(|p| p.id == personnel_id)
                .map(|idx| (unit_id.clone(), idx))
        })
    }

    /// Append a record to the group of `unit_id`
    pub fn insert(&mut self, unit_id: &str, person: Personnel) {
        self.groups.entry(unit_id.to_string()).or_default().push(person);
    }

    /// Remove a record, returning it with the id of the group it was in
    pub fn remove(&mut self, personnel_id: &str) -> Option<(String, Personnel)> {
        let (unit_id, idx) = self.locate(personnel_id)?;
        let person = self.groups.get_mut(&unit_id)?.remove(idx);
        Some((unit_id, person))
    }

    /// Move a record into `target`'s group and point `assigned_unit` at it
    ///
    /// Returns false, leaving everything unchanged, when no record has
    /// that id.
    pub fn reassign(&mut self, personnel_id: &str, target: &Unit) -> bool {
        let Some((_, mut person)) = self.remove(personnel_id) else {
            tracing::warn!(personnel = personnel_id, "reassign of unknown personnel ignored");
            return false;
        };
        person.assigned_unit.clone_from(&target.name);
        self.insert(&target.id, person);
        true
    }

    /// Apply a partial update in place
    ///
    /// When the patch names a unit, `assigned_unit` is stored as that
    /// unit's canonical name and the record moves to its group if it is a
    /// different unit. Returns false, leaving everything unchanged, when no
    /// record has that id or the named unit does not exist.
    pub fn update(&mut self, personnel_id: &str, patch: &PersonnelPatch, tree: &UnitTree) -> bool {
        let Some((unit_id, idx)) = self.locate(personnel_id) else {
            tracing::warn!(personnel = personnel_id, "update of unknown personnel ignored");
            return false;
        };

        let target = match patch.assigned_unit.as_deref() {
            None => None,
            Some(name) => match tree.find_by_name(name) {
                Some(unit) => Some(unit),
                None => {
                    tracing::warn!(personnel = personnel_id, unit = name, "update to unknown unit ignored");
                    return false;
                }
            },
        };

        let Some(group) = self.groups.get_mut(&unit_id) else {
            return false;
        };
        match target {
            None => patch.apply(&mut group[idx]),
            Some(unit) if unit.id == unit_id => {
                let person = &mut group[idx];
                patch.apply(person);
                person.assigned_unit.clone_from(&unit.name);
            }
            Some(unit) => {
                let mut person = group.remove(idx);
                patch.apply(&mut person);
                person.assigned_unit.clone_from(&unit.name);
                self.insert(&unit.id, person);
            }
        }
        true
    }

    /// Rewrite `assigned_unit` and `secondment` references from one unit
    /// name to another; returns the number of records touched
    pub fn rename_references(&mut self, old_name: &str, new_name: &str) -> usize {
        let mut touched = 0;
        for person in self.groups.values_mut().flatten() {
            let mut changed = false;
            if person.assigned_unit == old_name {
                person.assigned_unit = new_name.to_string();
                changed = true;
            }
            if person.secondment == old_name {
                person.secondment = new_name.to_string();
                changed = true;
            }
            if changed {
                touched += 1;
            }
        }
        touched
    }

    /// Move an entire group into `target`'s group, rewriting
    /// `assigned_unit`; the source group is dropped. Returns how many
    /// records moved.
    pub fn move_group(&mut self, from_unit_id: &str, target: &Unit) -> usize {
        if from_unit_id == target.id {
            return 0;
        }
        let Some(people) = self.groups.remove(from_unit_id) else {
            return 0;
        };
        let moved = people.len();
        let group = self.groups.entry(target.id.clone()).or_default();
        for mut person in people {
            person.assigned_unit.clone_from(&target.name);
            group.push(person);
        }
        moved
    }

    /// Drop the group of `unit_id`, returning whatever it held
    pub fn drop_group(&mut self, unit_id: &str) -> Vec<Personnel> {
        self.groups.remove(unit_id).unwrap_or_default()
    }

    /// Same records in the same groups, ignoring empty groups
    ///
    /// Realtime stores may drop an empty list entirely, so a group that is
    /// empty on one side and absent on the other still matches.
    pub fn same_records(&self, other: &RosterIndex) -> bool {
        let non_empty = |index: &'_ RosterIndex| {
            index
                .groups
                .iter()
                .filter(|(_, people)| !people.is_empty())
                .map(|(unit_id, people)| (unit_id.clone(), people.clone()))
                .collect::<BTreeMap<_, _>>()
        };
        non_empty(self) == non_empty(other)
    }

    /// Personnel grouped under `unit_id` or any of its descendants, plus
    /// anyone seconded to it, each record exactly once
    pub fn personnel_in_subtree<'a>(&'a self, tree: &UnitTree, unit_id: &str) -> Vec<&'a Personnel> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        let mut unit_ids = vec![unit_id.to_string()];
        unit_ids.extend(tree.descendants(unit_id));
        for id in &unit_ids {
            for person in self.group(id) {
                if seen.insert(person.id.as_str()) {
                    out.push(person);
                }
            }
        }

        if let Some(unit) = tree.get(unit_id) {
            for (_, person) in self.iter() {
                if person.secondment() == Some(unit.name.as_str()) && seen.insert(person.id.as_str()) {
                    out.push(person);
                }
            }
        }

        out
    }

    /// Distinct non-empty specialties, sorted
    pub fn specialties(&self) -> Vec<String> {
        self.iter()
            .map(|(_, p)| p.specialty.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
