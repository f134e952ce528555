//! Runtime configuration for ledger front ends.
//!
//! # Responsibility
//! - Resolve database location and logging settings from the environment.
//! - Provide defaults so a bare invocation works against `./lending.sqlite3`.
//!
//! # Invariants
//! - Environment values are trimmed; blank values count as unset.
//! - The loan period is not configurable (see `LOAN_PERIOD_DAYS`).

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "LENDING_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "LENDING_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "LENDING_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "lending.sqlite3";

/// Resolved ledger settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files; logging is off when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl LedgerConfig {
    /// Reads `LENDING_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds config from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            db_path: read(ENV_DB_PATH).map_or(defaults.db_path, PathBuf::from),
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
        }
    }
}
