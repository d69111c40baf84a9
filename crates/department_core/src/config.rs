//! Explicit runtime configuration for the department core.
//!
//! # Responsibility
//! - Hold the values validation, storage and logging depend on.
//! - Load overrides from `DEPARTMENTS_*` environment variables.
//!
//! # Invariants
//! - Configuration is passed by value or reference into constructors; there
//!   is no process-wide mutable config.
//! - `uuid_version` is one of 3, 4 or 5.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "DEPARTMENTS_DB_PATH";
pub const ENV_UUID_VERSION: &str = "DEPARTMENTS_UUID_VERSION";
pub const ENV_LOG_LEVEL: &str = "DEPARTMENTS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "DEPARTMENTS_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "departments.sqlite3";
const DEFAULT_UUID_VERSION: usize = 4;
const SUPPORTED_UUID_VERSIONS: [usize; 3] = [3, 4, 5];

/// Configuration error raised while reading environment overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedUuidVersion(String),
    NotUnicode(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedUuidVersion(value) => write!(
                f,
                "unsupported uuid version `{value}`; expected one of 3|4|5"
            ),
            Self::NotUnicode(key) => write!(f, "environment variable {key} is not valid UTF-8"),
        }
    }
}

impl Error for ConfigError {}

/// Core configuration threaded into validator, store and logging setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// UUID version accepted for `id` arguments.
    pub uuid_version: usize,
    /// Log level passed to `init_logging`.
    pub log_level: String,
    /// Absolute log directory; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            uuid_version: DEFAULT_UUID_VERSION,
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Builds a configuration from defaults overlaid with environment values.
    ///
    /// Blank variables are treated as unset.
    ///
    /// # Errors
    /// - `ConfigError::UnsupportedUuidVersion` for anything but 3, 4 or 5.
    /// - `ConfigError::NotUnicode` when a variable is not valid UTF-8.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(key)),
        })
    }

    fn from_lookup(
        lookup: impl Fn(&'static str) -> Result<Option<String>, ConfigError>,
    ) -> Result<Self, ConfigError> {
        let read = |key: &'static str| -> Result<Option<String>, ConfigError> {
            Ok(lookup(key)?
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty()))
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH)? {
            config.db_path = PathBuf::from(path);
        }
        if let Some(version) = read(ENV_UUID_VERSION)? {
            config.uuid_version = parse_uuid_version(&version)?;
        }
        if let Some(level) = read(ENV_LOG_LEVEL)? {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR)? {
            config.log_dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }

    /// Overrides the accepted UUID version.
    ///
    /// # Errors
    /// Returns `ConfigError::UnsupportedUuidVersion` for anything but 3, 4 or 5.
    pub fn with_uuid_version(mut self, version: usize) -> Result<Self, ConfigError> {
        if !SUPPORTED_UUID_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedUuidVersion(version.to_string()));
        }
        self.uuid_version = version;
        Ok(self)
    }
}

fn parse_uuid_version(raw: &str) -> Result<usize, ConfigError> {
    raw.parse::<usize>()
        .ok()
        .filter(|version| SUPPORTED_UUID_VERSIONS.contains(version))
        .ok_or_else(|| ConfigError::UnsupportedUuidVersion(raw.to_string()))
}
