//! Todo item record stored under `/todos/`.
//!
//! # Invariants
//! - `id` is stable and equals the trailing segment of every key holding it.
//! - `title` is never empty once persisted.
//! - `due_date` is a calendar date without time-of-day or zone, serialized
//!   as `YYYY-MM-DD`.

use super::ValidationError;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller-generated identifier of a todo item.
pub type TodoId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: TodoId,
    pub title: String,
    pub due_date: NaiveDate,
    /// Ordering hint; lower ranks sort first in clients.
    pub rank: i64,
}

impl TodoItem {
    /// Creates an item due today with a fresh id and rank `0`.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, today())
    }

    pub fn with_id(id: TodoId, title: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            id,
            title: title.into(),
            due_date,
            rank: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(())
    }
}

/// Current UTC calendar date.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
