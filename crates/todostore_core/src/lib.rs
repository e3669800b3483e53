//! Persistent storage engine for the todo service.
//! Users, refresh tokens and todo items live in one ordered key-value store;
//! a background pipeline keeps the global todo index in step with owner
//! partitions.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod storage;
pub mod sync;
pub mod token;

pub use config::{ConfigError, StorageBackend, StoreConfig};
pub use db::{DbError, DbResult, KvStore};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::todo::{today, TodoId, TodoItem};
pub use model::user::User;
pub use model::ValidationError;
pub use repo::todo_repo::{KvTodoRepository, TodoRepository};
pub use repo::token_repo::{KvTokenRepository, TokenRepository};
pub use repo::user_repo::{KvUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use storage::Storage;
pub use token::{TokenCodec, TokenError, TokenOwner};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
