//! User repository over `/users/{email}`.
//!
//! # Invariants
//! - `create_user` is an upsert; there is no uniqueness check beyond the key.
//! - `delete_user` returns once the record is gone; tokens and todo items are
//!   removed later by the sync pipeline.
//! - The cascade is queued even when no user record exists, since todo items
//!   can be written for an owner that never got one.

use super::keys::user_key;
use super::{RepoError, RepoResult};
use crate::db::KvStore;
use crate::model::user::{validate_email, User};
use crate::sync::SyncPipeline;

pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<()>;
    fn get_user(&self, email: &str) -> RepoResult<User>;
    fn delete_user(&self, email: &str) -> RepoResult<()>;
}

/// Key-value backed user repository.
pub struct KvUserRepository<'s> {
    kv: &'s KvStore,
    sync: &'s SyncPipeline,
}

impl<'s> KvUserRepository<'s> {
    pub fn new(kv: &'s KvStore, sync: &'s SyncPipeline) -> Self {
        Self { kv, sync }
    }
}

impl UserRepository for KvUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<()> {
        user.validate()?;
        self.kv.set_json(&user_key(&user.email), user)?;
        Ok(())
    }

    fn get_user(&self, email: &str) -> RepoResult<User> {
        Ok(self.kv.get_json(&user_key(email))?)
    }

    /// Removes the user record and queues the cascade.
    ///
    /// A missing record still queues the cascade, then reports `NotFound`.
    fn delete_user(&self, email: &str) -> RepoResult<()> {
        validate_email(email)?;

        let key = user_key(email);
        let removed = match self.kv.delete(&key) {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => Err(RepoError::NotFound(key)),
            Err(err) => return Err(err.into()),
        };

        self.sync.user_deleted(email)?;
        removed
    }
}
