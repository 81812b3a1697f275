use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::board::DEFAULT_UPCOMING_LIMIT;
use crate::db::BackofficeDb;
use crate::error::CoreError;
use crate::workspace::{WorkspaceLimits, DEFAULT_FEED_LIMIT};

/// User configuration from `~/.backoffice/config.json`. Every field has a
/// default, so an empty object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Database file; `~/.backoffice/backoffice.db` when unset.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Caps the workspace timeline, inquiry and notification lists.
    #[serde(default = "default_feed_limit")]
    pub feed_limit: usize,
    #[serde(default = "default_upcoming_limit")]
    pub upcoming_task_limit: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_feed_limit() -> usize {
    DEFAULT_FEED_LIMIT
}

fn default_upcoming_limit() -> usize {
    DEFAULT_UPCOMING_LIMIT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: default_log_level(),
            feed_limit: default_feed_limit(),
            upcoming_task_limit: default_upcoming_limit(),
        }
    }
}

impl Config {
    pub fn workspace_limits(&self) -> WorkspaceLimits {
        WorkspaceLimits {
            feed: self.feed_limit,
            upcoming_tasks: self.upcoming_task_limit,
        }
    }

    /// The configured database path, or the default location.
    pub fn resolved_database_path(&self) -> Result<PathBuf, CoreError> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(BackofficeDb::default_path()?),
        }
    }
}

/// Process-wide state: the loaded config and a lazily opened database.
pub struct AppState {
    pub config: Mutex<Option<Config>>,
    pub db: Mutex<Option<BackofficeDb>>,
}

impl AppState {
    pub fn new() -> Self {
        let config = match load_config() {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("{e}. Using default configuration.");
                None
            }
        };
        Self::with_config(config)
    }

    pub fn with_config(config: Option<Config>) -> Self {
        Self {
            config: Mutex::new(config),
            db: Mutex::new(None),
        }
    }

    /// The active config, falling back to defaults.
    pub fn config(&self) -> Config {
        self.config.lock().clone().unwrap_or_default()
    }

    /// Run `f` against the database, opening it on first use.
    pub fn with_db<F, T>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&BackofficeDb) -> Result<T, CoreError>,
    {
        let mut guard = self.db.lock();
        if guard.is_none() {
            let path = self.config().resolved_database_path()?;
            *guard = Some(BackofficeDb::open_at(path)?);
        }
        match guard.as_ref() {
            Some(db) => f(db),
            None => Err(CoreError::invalid("Database is not available.")),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the canonical config file path (~/.backoffice/config.json)
pub fn config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".backoffice").join("config.json"))
}

/// Load configuration from ~/.backoffice/config.json. A missing file yields
/// the defaults.
pub fn load_config() -> Result<Config, String> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
}
