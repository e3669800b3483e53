//! Domain records persisted by the todo store.
//!
//! # Responsibility
//! - Define the JSON shapes stored under `/users/` and `/todos/`.
//! - Provide validation run by repositories before every write.
//!
//! # Invariants
//! - A todo item is identified by a caller-generated `TodoId`.
//! - A user is identified by a syntactically valid email address.

pub mod todo;
pub mod user;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejection reasons for records that must not be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyTitle,
    EmptyToken,
    InvalidEmail(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title required"),
            Self::EmptyToken => write!(f, "token required"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
        }
    }
}

impl Error for ValidationError {}
