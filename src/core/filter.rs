//! Derived roster views: filtering and rank ordering

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;

use crate::core::entity::{compare_names, CharacterType, Personnel, Status};

/// Rank bucket derived from the numeric grade
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum RankCategory {
    JuniorEnlisted,
    Nco,
    Officer,
}

impl std::fmt::Display for RankCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankCategory::JuniorEnlisted => write!(f, "junior-enlisted"),
            RankCategory::Nco => write!(f, "nco"),
            RankCategory::Officer => write!(f, "officer"),
        }
    }
}

/// Numeric value of a grade string, if it is one
pub fn grade_value(grade: &str) -> Option<i64> {
    grade.trim().parse().ok()
}

/// Bucket for a grade: 1-3 junior enlisted, 4-8 NCO, 9-16 officer
///
/// # Examples
/// ```
/// use roster::core::filter::{rank_category, RankCategory};
///
/// assert_eq!(rank_category("5"), Some(RankCategory::Nco));
/// assert_eq!(rank_category("abc"), None);
/// ```
pub fn rank_category(grade: &str) -> Option<RankCategory> {
    match grade_value(grade)? {
        1..=3 => Some(RankCategory::JuniorEnlisted),
        4..=8 => Some(RankCategory::Nco),
        9..=16 => Some(RankCategory::Officer),
        _ => None,
    }
}

/// Filter criteria for roster listings; never persisted
///
/// Each selection set is ignored while empty. Non-empty sets are ANDed
/// together, and values within one set are ORed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub search_query: String,
    pub statuses: BTreeSet<Status>,
    pub rank_categories: BTreeSet<RankCategory>,
    pub specialties: BTreeSet<String>,
    pub character_types: BTreeSet<CharacterType>,
    /// Unit names, compared with `assigned_unit`
    pub assigned_units: BTreeSet<String>,
    /// Unit names, compared with `secondment`
    pub secondments: BTreeSet<String>,
    pub show_inactive: bool,
}

impl SearchFilters {
    /// Whether a query or any selection narrows the listing
    pub fn is_active(&self) -> bool {
        !self.search_query.trim().is_empty()
            || !self.statuses.is_empty()
            || !self.rank_categories.is_empty()
            || !self.specialties.is_empty()
            || !self.character_types.is_empty()
            || !self.assigned_units.is_empty()
            || !self.secondments.is_empty()
    }

    /// Number of selected values, counting a query as one
    pub fn active_count(&self) -> usize {
        self.statuses.len()
            + self.rank_categories.len()
            + self.specialties.len()
            + self.character_types.len()
            + self.assigned_units.len()
            + self.secondments.len()
            + usize::from(!self.search_query.trim().is_empty())
    }

    /// Reset every criterion, hiding inactive records again
    pub fn clear(&mut self) {
        *self = SearchFilters::default();
    }

    pub fn matches(&self, person: &Personnel) -> bool {
        if person.status == Status::Inactive && !self.show_inactive {
            return false;
        }

        let query = self.search_query.trim().to_lowercase();
        if !query.is_empty() {
            let hit = [
                &person.name,
                &person.callsign,
                &person.rank,
                &person.specialty,
                &person.role,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&query));
            if !hit {
                return false;
            }
        }

        fn allows<T: Ord>(set: &BTreeSet<T>, value: Option<&T>) -> bool {
            set.is_empty() || value.is_some_and(|v| set.contains(v))
        }

        let category = rank_category(&person.grade);
        let secondment = person.secondment().map(str::to_string);

        allows(&self.statuses, Some(&person.status))
            && allows(&self.rank_categories, category.as_ref())
            && allows(&self.specialties, Some(&person.specialty))
            && allows(&self.character_types, Some(&person.character_type))
            && allows(&self.assigned_units, Some(&person.assigned_unit))
            && allows(&self.secondments, secondment.as_ref())
    }
}

/// Records matching `filters`, in input order
pub fn filter_personnel<'a, I>(people: I, filters: &SearchFilters) -> Vec<&'a Personnel>
where
    I: IntoIterator<Item = &'a Personnel>,
{
    people.into_iter().filter(|p| filters.matches(p)).collect()
}

/// Highest grade first (an unparseable grade counts as 0), then by name
/// without regard to case
pub fn sort_by_rank<P: Borrow<Personnel>>(mut people: Vec<P>) -> Vec<P> {
    people.sort_by(|a, b| {
        let (a, b) = (a.borrow(), b.borrow());
        let grade = |p: &Personnel| grade_value(&p.grade).unwrap_or(0);
        grade(b)
            .cmp(&grade(a))
            .then_with(|| compare_names(&a.name, &b.name))
    });
    people
}

/// Alphabetical by name without regard to case, ties broken by id
pub fn sort_by_name<P: Borrow<Personnel>>(mut people: Vec<P>) -> Vec<P> {
    people.sort_by(|a, b| {
        let (a, b) = (a.borrow(), b.borrow());
        compare_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id))
    });
    people
}
