//! SQLite bootstrap and the ordered key-value engine built on top of it.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the todo store.
//! - Apply schema migrations in deterministic order.
//! - Expose the single-key transactional accessor used by every repository.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repositories must not read/write data before migrations succeed.
//! - Missing keys surface as `DbError::KeyNotFound`, never as a generic
//!   SQLite error.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod kv;
pub mod migrations;
mod open;

pub use kv::KvStore;
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    KeyNotFound(String),
    Json(serde_json::Error),
    InvalidUtf8(String),
    LockPoisoned,
    WorkerSpawn(std::io::Error),
    /// `close` found other live handles to the engine.
    EngineInUse { handles: usize },
}

impl DbError {
    /// Returns whether this error only reports an absent key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_))
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::KeyNotFound(key) => write!(f, "key not found: {key}"),
            Self::Json(err) => write!(f, "json codec failed: {err}"),
            Self::InvalidUtf8(key) => write!(f, "value stored at `{key}` is not valid UTF-8"),
            Self::LockPoisoned => write!(f, "database connection lock poisoned"),
            Self::WorkerSpawn(err) => write!(f, "failed to start sync worker: {err}"),
            Self::EngineInUse { handles } => {
                write!(f, "cannot close engine: {handles} other handle(s) still open")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::WorkerSpawn(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. }
            | Self::KeyNotFound(_)
            | Self::InvalidUtf8(_)
            | Self::LockPoisoned
            | Self::EngineInUse { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for DbError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
