//! Refresh-token repository over `/tokens/{token}`.
//!
//! # Invariants
//! - The stored value always equals the token in the key; a difference is
//!   reported as `TokenMismatch`, distinct from `NotFound`.
//! - Storing a token guarantees a user record for its email.

use super::keys::token_key;
use super::user_repo::{KvUserRepository, UserRepository};
use super::{RepoError, RepoResult};
use crate::db::KvStore;
use crate::model::user::User;
use crate::model::ValidationError;
use log::info;

pub trait TokenRepository {
    fn create_token(&self, email: &str, token: &str) -> RepoResult<()>;
    fn get_token(&self, token: &str) -> RepoResult<String>;
    fn delete_token(&self, token: &str) -> RepoResult<()>;
}

/// Key-value backed token repository.
pub struct KvTokenRepository<'s> {
    kv: &'s KvStore,
    users: KvUserRepository<'s>,
}

impl<'s> KvTokenRepository<'s> {
    pub fn new(kv: &'s KvStore, users: KvUserRepository<'s>) -> Self {
        Self { kv, users }
    }
}

impl TokenRepository for KvTokenRepository<'_> {
    fn create_token(&self, email: &str, token: &str) -> RepoResult<()> {
        if token.is_empty() {
            return Err(ValidationError::EmptyToken.into());
        }

        match self.users.get_user(email) {
            Ok(_) => {}
            Err(RepoError::NotFound(_)) => {
                self.users.create_user(&User::new(email))?;
                info!("event=user_create module=repo status=ok source=token");
            }
            Err(err) => return Err(err),
        }

        self.kv.set_string(&token_key(token), token)?;
        Ok(())
    }

    fn get_token(&self, token: &str) -> RepoResult<String> {
        let key = token_key(token);
        let value = self.kv.get_string(&key)?;
        if value != token {
            return Err(RepoError::TokenMismatch { key, value });
        }
        Ok(value)
    }

    fn delete_token(&self, token: &str) -> RepoResult<()> {
        match self.kv.delete(&token_key(token)) {
            Err(err) if !err.is_not_found() => Err(err.into()),
            _ => Ok(()),
        }
    }
}
