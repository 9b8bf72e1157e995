//! Process configuration for core consumers.
//!
//! # Responsibility
//! - Resolve database, logging and paging settings from the environment.
//! - Provide deterministic defaults when variables are absent.
//!
//! # Invariants
//! - Blank variables are treated as absent.
//! - `default_page_size` is always positive.

use crate::logging::default_log_level;
use crate::repo::query::{PageRequest, QueryError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "EXOSCOPE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "EXOSCOPE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "EXOSCOPE_LOG_DIR";
pub const ENV_PAGE_SIZE: &str = "EXOSCOPE_PAGE_SIZE";

pub use crate::repo::query::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidPageSize(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPageSize(value) => write!(
                f,
                "{ENV_PAGE_SIZE} must be a positive integer, got `{value}`"
            ),
            Self::RelativeLogDir(path) => write!(
                f,
                "{ENV_LOG_DIR} must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Resolved core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite file path; `None` selects an in-memory store.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Rolling log directory; `None` leaves file logging off.
    pub log_dir: Option<PathBuf>,
    pub default_page_size: i64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CoreConfig {
    /// Page `page` sized by the configured default.
    pub fn page_request(&self, page: i64) -> Result<PageRequest, QueryError> {
        PageRequest::new(page, self.default_page_size)
    }

    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Reads configuration from explicit `(name, value)` pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();

        for (name, value) in vars {
            let value: String = value.into();
            let trimmed = value.trim();
            if trimmed.is_empty() {
                continue;
            }
            match name.as_ref() {
                ENV_DB_PATH => config.db_path = Some(PathBuf::from(trimmed)),
                ENV_LOG_LEVEL => config.log_level = trimmed.to_string(),
                ENV_LOG_DIR => {
                    let path = PathBuf::from(trimmed);
                    if !path.is_absolute() {
                        return Err(ConfigError::RelativeLogDir(path));
                    }
                    config.log_dir = Some(path);
                }
                ENV_PAGE_SIZE => {
                    config.default_page_size = match trimmed.parse::<i64>() {
                        Ok(size) if size > 0 => size,
                        _ => return Err(ConfigError::InvalidPageSize(trimmed.to_string())),
                    };
                }
                _ => {}
            }
        }

        Ok(config)
    }
}
