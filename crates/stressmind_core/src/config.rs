//! Runtime configuration for opening the core.
//!
//! # Responsibility
//! - Resolve the data directory and log level from the environment.
//! - Derive on-disk locations for the slot database, key and logs.
//!
//! # Invariants
//! - `data_dir` is absolute, except for the last-resort `./.stressmind`
//!   fallback used when no home directory is known.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "STRESSMIND_DATA_DIR";
pub const LOG_LEVEL_ENV: &str = "STRESSMIND_LOG_LEVEL";

const APP_DIR_NAME: &str = "stressmind";
const DB_FILE_NAME: &str = "stressmind.sqlite3";
const CREDENTIAL_DIR_NAME: &str = "credentials";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    RelativeDataDir(String),
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RelativeDataDir(value) => {
                write!(f, "{DATA_DIR_ENV} must be an absolute path, got `{value}`")
            }
            Self::InvalidLogLevel(message) => write!(f, "{LOG_LEVEL_ENV}: {message}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub log_level: &'static str,
}

impl CoreConfig {
    /// Uses `data_dir` with the build-mode default log level.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            log_level: default_log_level(),
        }
    }

    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through `lookup`.
    ///
    /// Data directory precedence: `STRESSMIND_DATA_DIR`,
    /// `$XDG_DATA_HOME/stressmind`, `$HOME/.local/share/stressmind`,
    /// `./.stressmind`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let data_dir = if let Some(raw) = non_empty(DATA_DIR_ENV) {
            let path = PathBuf::from(&raw);
            if !path.is_absolute() {
                return Err(ConfigError::RelativeDataDir(raw));
            }
            path
        } else if let Some(xdg) = non_empty("XDG_DATA_HOME") {
            PathBuf::from(xdg).join(APP_DIR_NAME)
        } else if let Some(home) = non_empty("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join(APP_DIR_NAME)
        } else {
            PathBuf::from(format!(".{APP_DIR_NAME}"))
        };

        let log_level = match non_empty(LOG_LEVEL_ENV) {
            Some(raw) => normalize_level(&raw).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };

        Ok(Self {
            data_dir,
            log_level,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    /// Directory used by `FileCredentialStore`.
    pub fn credential_dir(&self) -> PathBuf {
        self.data_dir.join(CREDENTIAL_DIR_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn explicit_data_dir_wins() {
        let config = CoreConfig::from_lookup(lookup(&[
            ("STRESSMIND_DATA_DIR", "/srv/stressmind"),
            ("HOME", "/home/kid"),
            ("STRESSMIND_LOG_LEVEL", "WARNING"),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/stressmind"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.db_path(), PathBuf::from("/srv/stressmind/stressmind.sqlite3"));
        assert_eq!(config.log_dir(), PathBuf::from("/srv/stressmind/logs"));
    }

    #[test]
    fn falls_back_to_xdg_then_home() {
        let xdg = CoreConfig::from_lookup(lookup(&[
            ("XDG_DATA_HOME", "/home/kid/.data"),
            ("HOME", "/home/kid"),
        ]))
        .unwrap();
        assert_eq!(xdg.data_dir, PathBuf::from("/home/kid/.data/stressmind"));

        let home = CoreConfig::from_lookup(lookup(&[("HOME", "/home/kid"), ("XDG_DATA_HOME", " ")]))
            .unwrap();
        assert_eq!(
            home.data_dir,
            PathBuf::from("/home/kid/.local/share/stressmind")
        );
    }

    #[test]
    fn rejects_relative_data_dir_and_bad_level() {
        let relative =
            CoreConfig::from_lookup(lookup(&[("STRESSMIND_DATA_DIR", "data")])).unwrap_err();
        assert_eq!(relative, ConfigError::RelativeDataDir("data".to_string()));

        let level = CoreConfig::from_lookup(lookup(&[
            ("HOME", "/home/kid"),
            ("STRESSMIND_LOG_LEVEL", "verbose"),
        ]))
        .unwrap_err();
        assert!(matches!(level, ConfigError::InvalidLogLevel(_)));
    }
}
