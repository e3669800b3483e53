//! Logical key space of the store.
//!
//! ```text
//! /users/{email}          User JSON
//! /tokens/{token}         raw token string, equal to {token}
//! /todos/{owner}/{id}     TodoItem JSON, owner partition
//! /todos/all/{id}         TodoItem JSON, global index
//! ```
//!
//! # Invariants
//! - The empty owner selects the global index and is never a real owner.
//! - Real owners are validated emails, so they can never collide with the
//!   `all` segment or contain `/`.

use super::{RepoError, RepoResult};
use crate::model::user::validate_email;
use std::fmt::Display;

pub const USERS_PREFIX: &str = "/users/";
pub const TOKENS_PREFIX: &str = "/tokens/";
pub const TODOS_PREFIX: &str = "/todos/";
const GLOBAL_SEGMENT: &str = "all";

pub fn user_key(email: &str) -> String {
    format!("{USERS_PREFIX}{email}")
}

pub fn token_key(token: &str) -> String {
    format!("{TOKENS_PREFIX}{token}")
}

pub fn global_todo_key(id: impl Display) -> String {
    format!("{TODOS_PREFIX}{GLOBAL_SEGMENT}/{id}")
}

/// Returns the part of `key` after its last `/`.
pub fn trailing_segment(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Todo partition addressed by an owner argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition<'a> {
    Global,
    Owner(&'a str),
}

impl<'a> Partition<'a> {
    /// Maps an owner argument to its partition.
    ///
    /// `""` selects the global index; anything else must be an email.
    pub fn parse(owner: &'a str) -> RepoResult<Self> {
        if owner.is_empty() {
            return Ok(Self::Global);
        }
        validate_email(owner)?;
        Ok(Self::Owner(owner))
    }

    /// Like [`Partition::parse`], but refuses the global index.
    ///
    /// Mutations always target an owner partition; the global index is only
    /// written by the sync pipeline.
    pub fn for_owner(owner: &'a str) -> RepoResult<Self> {
        match Self::parse(owner)? {
            Self::Global => Err(RepoError::NotAuthenticated),
            partition => Ok(partition),
        }
    }

    pub fn prefix(&self) -> String {
        match self {
            Self::Global => format!("{TODOS_PREFIX}{GLOBAL_SEGMENT}/"),
            Self::Owner(owner) => format!("{TODOS_PREFIX}{owner}/"),
        }
    }

    pub fn item_key(&self, id: impl Display) -> String {
        format!("{}{id}", self.prefix())
    }
}
