//! Store configuration read from `TODO_*` environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `TODO_STORAGE` | `sqlite` (`badger` accepted as an alias) |
//! | `TODO_DB_NAME` | `todo` |
//! | `TODO_LOG_LEVEL` | build-mode default |
//! | `TODO_LOG_DIR` | unset, file logging disabled |
//! | `TODO_TOKEN_SIGNING_KEY` | `signing-key` |
//! | `TODO_REFRESH_TOKEN_TTL_SECS` | two weeks |

use crate::logging::default_log_level;
use chrono::Duration;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const DEFAULT_DB_NAME: &str = "todo";
const DEFAULT_SIGNING_KEY: &str = "signing-key";
const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 14 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownBackend(String),
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownBackend(name) => write!(f, "unknown storage type: \"{name}\""),
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "badger" => Ok(Self::Sqlite),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StorageBackend,
    /// Database name; the file is `{db_name}.db`.
    pub db_name: String,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub token_signing_key: Vec<u8>,
    pub refresh_token_ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            db_name: DEFAULT_DB_NAME.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
            token_signing_key: DEFAULT_SIGNING_KEY.as_bytes().to_vec(),
            refresh_token_ttl: Duration::seconds(DEFAULT_REFRESH_TOKEN_TTL_SECS),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any variable source; unset keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("TODO_STORAGE") {
            config.backend = StorageBackend::parse(&value)?;
        }
        if let Some(value) = non_empty(lookup("TODO_DB_NAME")) {
            config.db_name = value;
        }
        if let Some(value) = non_empty(lookup("TODO_LOG_LEVEL")) {
            config.log_level = value;
        }
        config.log_dir = non_empty(lookup("TODO_LOG_DIR")).map(PathBuf::from);
        if let Some(value) = non_empty(lookup("TODO_TOKEN_SIGNING_KEY")) {
            config.token_signing_key = value.into_bytes();
        }
        if let Some(value) = non_empty(lookup("TODO_REFRESH_TOKEN_TTL_SECS")) {
            let secs = value
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: "TODO_REFRESH_TOKEN_TTL_SECS",
                    value: value.clone(),
                })?;
            config.refresh_token_ttl = Duration::seconds(secs);
        }

        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StorageBackend, StoreConfig};
    use chrono::Duration;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = StoreConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.db_name, "todo");
        assert_eq!(config.refresh_token_ttl, Duration::days(14));
    }

    #[test]
    fn reads_every_variable() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            ("TODO_STORAGE", "Badger"),
            ("TODO_DB_NAME", "/var/lib/todo/main"),
            ("TODO_LOG_LEVEL", "warn"),
            ("TODO_LOG_DIR", "/var/log/todo"),
            ("TODO_TOKEN_SIGNING_KEY", "s3cret"),
            ("TODO_REFRESH_TOKEN_TTL_SECS", "3600"),
        ]))
        .unwrap();

        assert_eq!(config.backend, StorageBackend::Sqlite);
        assert_eq!(config.db_name, "/var/lib/todo/main");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/todo")));
        assert_eq!(config.token_signing_key, b"s3cret".to_vec());
        assert_eq!(config.refresh_token_ttl, Duration::hours(1));
    }

    #[test]
    fn rejects_unknown_backend_and_bad_ttl() {
        assert_eq!(
            StoreConfig::from_lookup(lookup_from(&[("TODO_STORAGE", "session")])),
            Err(ConfigError::UnknownBackend("session".to_string()))
        );
        assert!(matches!(
            StoreConfig::from_lookup(lookup_from(&[("TODO_REFRESH_TOKEN_TTL_SECS", "-1")])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
