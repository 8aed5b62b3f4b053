//! Runtime configuration and repository bootstrap.
//!
//! # Responsibility
//! - Resolve database path and logging settings from the environment.
//! - Construct the process-wide repository explicitly, for injection into
//!   presenters.
//!
//! # Invariants
//! - Blank environment values fall back to defaults.
//! - File logging starts only when a log directory is configured.

use crate::db::open_db;
use crate::logging::{default_log_level, init_logging};
use crate::repo::local_store::{RepoError, SqliteMemoStore};
use crate::repo::memo_repo::MemoRepository;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "MEMO_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "MEMO_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "MEMO_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "memo_core.sqlite3";

/// Settings needed to bring up the memo core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads `MEMO_DB_PATH`, `MEMO_LOG_LEVEL` and `MEMO_LOG_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            db_path: read(DB_PATH_ENV).map_or(defaults.db_path, PathBuf::from),
            log_level: read(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            log_dir: read(LOG_DIR_ENV).map(PathBuf::from),
        }
    }
}

/// Failure while bringing up the memo core.
#[derive(Debug)]
pub enum CoreInitError {
    Logging(String),
    Repo(RepoError),
}

impl Display for CoreInitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(message) => write!(f, "logging init failed: {message}"),
            Self::Repo(err) => write!(f, "memo store init failed: {err}"),
        }
    }
}

impl Error for CoreInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for CoreInitError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Starts logging (when configured), opens the database and returns the
/// repository to hand to presenters.
///
/// The store closes when the last repository clone is dropped.
pub fn open_repository(
    config: &CoreConfig,
) -> Result<MemoRepository<SqliteMemoStore>, CoreInitError> {
    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, log_dir).map_err(CoreInitError::Logging)?;
    }

    let conn = open_db(&config.db_path).map_err(RepoError::from)?;
    let store = SqliteMemoStore::try_new(conn)?;
    info!(
        "event=repo_open module=core status=ok db_path={}",
        config.db_path.display()
    );
    Ok(MemoRepository::new(store))
}
