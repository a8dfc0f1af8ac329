//! Core module - roster domain model and logic

pub mod config;
pub mod credential;
pub mod entity;
pub mod error;
pub mod filter;
pub mod identity;
pub mod project;
pub mod roster;
pub mod session;
pub mod transfer;
pub mod units;

pub use config::{Config, RemoteConfig};
pub use credential::{CredentialError, CredentialGate};
pub use entity::{CharacterType, Personnel, PersonnelPatch, Status, Unit};
pub use error::{RosterError, UnitError};
pub use filter::{RankCategory, SearchFilters};
pub use project::{Project, ProjectError};
pub use roster::RosterIndex;
pub use session::{RosterSession, RosterState};
pub use transfer::{ExportData, ImportError};
pub use units::{DeleteOutcome, UnitTree};
