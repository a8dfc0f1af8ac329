//! Identity rules for units and personnel

use ulid::Ulid;

/// Derive a unit id from its display name
///
/// Lowercases, drops everything except ASCII letters, digits, whitespace
/// and hyphens, turns whitespace runs into a single hyphen and collapses
/// repeated hyphens.
///
/// # Examples
/// ```
/// use roster::core::identity::unit_id_from_name;
///
/// assert_eq!(unit_id_from_name("Squad 1"), "squad-1");
/// assert_eq!(unit_id_from_name("I.S.S. Beaumont Hill"), "iss-beaumont-hill");
/// ```
pub fn unit_id_from_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();

    let mut id = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for c in lowered.chars() {
        if c.is_whitespace() {
            in_whitespace = true;
            continue;
        }
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if in_whitespace {
            id.push('-');
            in_whitespace = false;
        }
        id.push(c);
    }

    collapse_hyphens(&id)
}

fn collapse_hyphens(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Generate a fresh personnel id
pub fn new_personnel_id() -> String {
    Ulid::new().to_string()
}
