// Runtime configuration
// Defaults live next to the working directory; env vars and --db override them.

use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_FILE: &str = "finance_tracker.db";
pub const DEFAULT_LOG_FILE: &str = "finance_tracker.log";

pub const DB_PATH_ENV: &str = "FINANCE_TRACKER_DB";
pub const LOG_PATH_ENV: &str = "FINANCE_TRACKER_LOG";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite file holding the expenses table
    pub db_path: PathBuf,

    /// Where the TUI writes its log (stderr would corrupt the screen)
    pub log_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Config {
    /// Defaults, overridden by `FINANCE_TRACKER_DB` / `FINANCE_TRACKER_LOG`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(DB_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(LOG_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            config.log_path = PathBuf::from(path);
        }

        config
    }

    pub fn with_db_path(mut self, path: impl AsRef<Path>) -> Self {
        self.db_path = path.as_ref().to_path_buf();
        self
    }
}
