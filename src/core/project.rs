//! Workspace discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the directory that marks a workspace root
pub const WORKSPACE_DIR: &str = ".roster";

/// A roster workspace on disk
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the workspace (parent of .roster/)
    root: PathBuf,
}

impl Project {
    /// Find the workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find the workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new workspace at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = Self::resolve(path)?;
        if root.join(WORKSPACE_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }
        Self::write_skeleton(root)
    }

    /// Initialize even if .roster/ exists, rewriting the config template
    ///
    /// Roster data in the store mirror is left alone.
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = Self::resolve(path)?;
        Self::write_skeleton(root)
    }

    fn resolve(path: &Path) -> Result<PathBuf, ProjectError> {
        std::fs::create_dir_all(path).map_err(|e| ProjectError::IoError(e.to_string()))?;
        Ok(path.canonicalize().unwrap_or_else(|_| path.to_path_buf()))
    }

    fn write_skeleton(root: PathBuf) -> Result<Self, ProjectError> {
        let project = Self { root };
        std::fs::create_dir_all(project.roster_dir())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(project.config_path(), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        Ok(project)
    }

    fn default_config() -> &'static str {
        r#"# Roster workspace configuration
# Run 'roster config keys' to list every option.

# Tracing filter for diagnostics on stderr (overridden by RUST_LOG)
# log: warn

# Default output format for list commands (table, json, csv, tsv, id)
# default_format: table

# Remote realtime store. Used only when enabled AND api_key,
# database_url and project_id are all set.
# remote:
#   enabled: false
#   api_key: ""
#   database_url: ""
#   project_id: ""
#   auth_domain: ""
#   storage_bucket: ""
#   messaging_sender_id: ""
#   app_id: ""
#   retry_failed_init: false
"#
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .roster directory
    pub fn roster_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    /// Workspace configuration file
    pub fn config_path(&self) -> PathBuf {
        self.roster_dir().join("config.yaml")
    }

    /// Durable mirror of the local store
    pub fn store_path(&self) -> PathBuf {
        self.roster_dir().join("store.json")
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a roster workspace (searched from {searched_from:?})")]
    NotFound { searched_from: PathBuf },

    #[error("roster workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
