//! Repository layer over the key-value engine.
//!
//! # Responsibility
//! - Define use-case oriented contracts for users, tokens and todo items.
//! - Keep key layout details inside the storage boundary.
//!
//! # Invariants
//! - Writes run record validation before touching the engine.
//! - Missing records surface as `RepoError::NotFound`, never as a raw
//!   engine error.
//! - Engine errors are propagated unchanged; nothing is swallowed.

pub mod keys;
pub mod todo_repo;
pub mod token_repo;
pub mod user_repo;

use crate::db::DbError;
use crate::model::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// Carries the storage key that was looked up.
    NotFound(String),
    /// A mutation was attempted without an owner.
    NotAuthenticated,
    TokenMismatch {
        key: String,
        value: String,
    },
    /// Persisted data contradicts its key; never repaired silently.
    InvalidData(String),
    /// The sync pipeline is no longer accepting work.
    SyncClosed(&'static str),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(key) => write!(f, "not found: {key}"),
            Self::NotAuthenticated => write!(f, "not authenticated"),
            Self::TokenMismatch { key, value } => {
                write!(f, "token mismatch: key=`{key}` holds `{value}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::SyncClosed(channel) => write!(f, "sync pipeline closed: {channel}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::NotAuthenticated
            | Self::TokenMismatch { .. }
            | Self::InvalidData(_)
            | Self::SyncClosed(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::KeyNotFound(key) => Self::NotFound(key),
            other => Self::Db(other),
        }
    }
}
