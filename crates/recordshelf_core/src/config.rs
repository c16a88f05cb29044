//! Runtime configuration loaded from the environment.
//!
//! # Invariants
//! - Missing variables fall back to defaults; present but invalid values are
//!   errors, never silently replaced.
//! - `log_dir`, when set, must be absolute (same rule as `init_logging`).

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "RECORDSHELF_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "RECORDSHELF_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "RECORDSHELF_LOG_DIR";
pub const ENV_BLOB_ROOT: &str = "RECORDSHELF_BLOB_ROOT";
pub const ENV_BUCKET: &str = "RECORDSHELF_BUCKET";

const DEFAULT_DB_PATH: &str = "recordshelf.sqlite3";
const DEFAULT_BLOB_ROOT: &str = "blobs";
const DEFAULT_BUCKET: &str = "records-storage";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Empty(&'static str),
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(variable) => write!(f, "{variable} is set but empty"),
            Self::RelativeLogDir(value) => {
                write!(f, "{ENV_LOG_DIR} must be an absolute path, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Process-level settings for storage, logging and blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub blob_root: PathBuf,
    pub bucket: String,
}

impl AppConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &'static str| -> Result<Option<String>, ConfigError> {
            match lookup(name) {
                Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(name)),
                Some(value) => Ok(Some(value.trim().to_string())),
                None => Ok(None),
            }
        };

        let log_dir = match read(ENV_LOG_DIR)? {
            Some(value) => {
                let path = PathBuf::from(&value);
                if !path.is_absolute() {
                    return Err(ConfigError::RelativeLogDir(value));
                }
                Some(path)
            }
            None => None,
        };

        Ok(Self {
            db_path: read(ENV_DB_PATH)?
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            log_level: read(ENV_LOG_LEVEL)?.unwrap_or_else(|| default_log_level().to_string()),
            log_dir,
            blob_root: read(ENV_BLOB_ROOT)?
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BLOB_ROOT)),
            bucket: read(ENV_BUCKET)?.unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
        })
    }
}
