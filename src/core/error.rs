//! Error taxonomy for roster operations

use miette::Diagnostic;
use thiserror::Error;

use crate::core::credential::CredentialError;
use crate::core::project::ProjectError;
use crate::core::transfer::ImportError;
use crate::store::StoreError;

/// Unit-tree validation failures
///
/// Raised before any state changes, so a failed operation leaves the tree
/// and the personnel groups untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("unit name '{0}' already exists")]
    DuplicateName(String),

    #[error("generated unit id '{0}' already exists, please use a different name")]
    DuplicateId(String),

    #[error("cannot make '{parent}' the parent of '{unit}': circular parent reference")]
    CircularReference { unit: String, parent: String },

    #[error("the '{0}' unit cannot be deleted")]
    ProtectedUnit(String),

    #[error("unit name is required")]
    EmptyName,

    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    #[error("cannot reassign personnel of '{deleting}' to '{target}'")]
    InvalidReassignTarget { deleting: String, target: String },
}

/// Top-level error for the roster library
#[derive(Debug, Error, Diagnostic)]
pub enum RosterError {
    #[error(transparent)]
    #[diagnostic(code(roster::unit))]
    Unit(#[from] UnitError),

    #[error(transparent)]
    #[diagnostic(
        code(roster::import),
        help("the file must be a roster export with 'version', 'personnelByUnit' and 'units'")
    )]
    Import(#[from] ImportError),

    #[error(transparent)]
    #[diagnostic(code(roster::store))]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(
        code(roster::passkey),
        help("pass the administrative passkey with --passkey or ROSTER_PASSKEY")
    )]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    #[diagnostic(code(roster::workspace), help("run 'roster init' to create a workspace"))]
    Project(#[from] ProjectError),

    #[error("JSON encoding failed: {0}")]
    #[diagnostic(code(roster::json))]
    Json(#[from] serde_json::Error),

    #[error("timed out waiting for roster data from the store")]
    #[diagnostic(
        code(roster::timeout),
        help("check the remote store settings with 'roster config show'")
    )]
    LoadTimeout,
}

pub type Result<T, E = RosterError> = std::result::Result<T, E>;
