//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::Project;

/// Roster configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Default tracing filter (e.g. "warn", "roster=debug")
    pub log: Option<String>,

    /// Default output format for list commands
    pub default_format: Option<String>,

    /// Remote realtime store connection
    pub remote: RemoteConfig,
}

/// Remote backend settings
///
/// The remote store is used only when `enabled` is true *and* the
/// api key, database url and project id are all present; anything less
/// is treated as disabled.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub enabled: Option<bool>,
    pub api_key: Option<String>,
    pub database_url: Option<String>,
    pub project_id: Option<String>,
    pub auth_domain: Option<String>,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,

    /// Allow a new connection attempt after one has failed
    pub retry_failed_init: Option<bool>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

impl RemoteConfig {
    /// All required connection parameters are present
    pub fn is_configured(&self) -> bool {
        present(&self.api_key) && present(&self.database_url) && present(&self.project_id)
    }

    /// Enabled and fully configured
    pub fn is_active(&self) -> bool {
        self.enabled == Some(true) && self.is_configured()
    }

    pub fn retry_failed_init(&self) -> bool {
        self.retry_failed_init.unwrap_or(false)
    }

    /// Per-field presence report with secrets masked, for diagnostics
    pub fn masked_report(&self) -> Vec<(&'static str, String)> {
        fn masked(value: &Option<String>) -> String {
            if present(value) {
                "***masked***".to_string()
            } else {
                "missing".to_string()
            }
        }
        fn shown(value: &Option<String>) -> String {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .unwrap_or("missing")
                .to_string()
        }

        vec![
            (
                "enabled",
                self.enabled.map_or("unset".to_string(), |e| e.to_string()),
            ),
            ("api_key", masked(&self.api_key)),
            ("auth_domain", shown(&self.auth_domain)),
            ("database_url", shown(&self.database_url)),
            ("project_id", shown(&self.project_id)),
            ("storage_bucket", shown(&self.storage_bucket)),
            ("messaging_sender_id", masked(&self.messaging_sender_id)),
            ("app_id", masked(&self.app_id)),
        ]
    }

    fn merge(&mut self, other: RemoteConfig) {
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.database_url.is_some() {
            self.database_url = other.database_url;
        }
        if other.project_id.is_some() {
            self.project_id = other.project_id;
        }
        if other.auth_domain.is_some() {
            self.auth_domain = other.auth_domain;
        }
        if other.storage_bucket.is_some() {
            self.storage_bucket = other.storage_bucket;
        }
        if other.messaging_sender_id.is_some() {
            self.messaging_sender_id = other.messaging_sender_id;
        }
        if other.app_id.is_some() {
            self.app_id = other.app_id;
        }
        if other.retry_failed_init.is_some() {
            self.retry_failed_init = other.retry_failed_init;
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(enabled) = var("ROSTER_REMOTE_ENABLED") {
            // only the literal "true" turns the remote on
            self.enabled = Some(enabled == "true");
        }
        let fields: [(&str, &mut Option<String>); 7] = [
            ("ROSTER_REMOTE_API_KEY", &mut self.api_key),
            ("ROSTER_REMOTE_DATABASE_URL", &mut self.database_url),
            ("ROSTER_REMOTE_PROJECT_ID", &mut self.project_id),
            ("ROSTER_REMOTE_AUTH_DOMAIN", &mut self.auth_domain),
            ("ROSTER_REMOTE_STORAGE_BUCKET", &mut self.storage_bucket),
            ("ROSTER_REMOTE_MESSAGING_SENDER_ID", &mut self.messaging_sender_id),
            ("ROSTER_REMOTE_APP_ID", &mut self.app_id),
        ];
        for (name, slot) in fields {
            if let Some(value) = var(name) {
                *slot = Some(value);
            }
        }
    }
}

impl Config {
    /// Load configuration for the workspace containing the current directory
    pub fn load() -> Self {
        Self::load_for(Project::discover().ok().as_ref())
    }

    /// Load configuration from all sources, merging in priority order
    pub fn load_for(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/roster/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Workspace config (.roster/config.yaml)
        if let Some(project) = project {
            if let Some(local) = Self::read_file(&project.config_path()) {
                config.merge(local);
            }
        }

        // 4. Environment variables
        config.apply_env(|name| std::env::var(name).ok());

        config
    }

    fn read_file(path: &std::path::Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Option<Config>>(&contents) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "roster")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.log.is_some() {
            self.log = other.log;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        self.remote.merge(other.remote);
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(log) = var("ROSTER_LOG") {
            self.log = Some(log);
        }
        self.remote.apply_env(var);
    }
}
