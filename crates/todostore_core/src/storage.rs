//! Top-level storage handle.
//!
//! # Responsibility
//! - Open the database and start the sync pipeline as one unit.
//! - Hand out repository views that borrow the shared engine.
//! - Tear everything down exactly once.
//!
//! # Invariants
//! - Only `Storage` closes the engine; repositories merely borrow it.
//! - Workers are joined before the engine is closed.
//! - `close` consumes the handle, so nothing can enqueue after shutdown.

use crate::config::{StorageBackend, StoreConfig};
use crate::db::{open_db, open_db_in_memory, DbError, DbResult, KvStore};
use crate::repo::todo_repo::KvTodoRepository;
use crate::repo::token_repo::KvTokenRepository;
use crate::repo::user_repo::KvUserRepository;
use crate::sync::SyncPipeline;
use crate::token::{TokenCodec, TokenOwner};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Storage {
    kv: Arc<KvStore>,
    sync: SyncPipeline,
}

impl Storage {
    /// Opens (or creates) `{name}.db` and starts the sync workers.
    ///
    /// `owners` resolves stored tokens to emails when a user is deleted.
    pub fn open(name: impl AsRef<Path>, owners: impl TokenOwner + 'static) -> DbResult<Self> {
        let conn = open_db(db_path(name.as_ref()))?;
        Self::start(KvStore::new(conn), Arc::new(owners))
    }

    /// Opens a private in-memory store; data is lost on close.
    pub fn open_in_memory(owners: impl TokenOwner + 'static) -> DbResult<Self> {
        let conn = open_db_in_memory()?;
        Self::start(KvStore::new(conn), Arc::new(owners))
    }

    /// Opens the configured backend, resolving token owners with the
    /// configured signing key.
    pub fn from_config(config: &StoreConfig) -> DbResult<Self> {
        let owners = TokenCodec::new(&config.token_signing_key);
        match config.backend {
            StorageBackend::Sqlite => Self::open(&config.db_name, owners),
        }
    }

    fn start(kv: KvStore, owners: Arc<dyn TokenOwner>) -> DbResult<Self> {
        let kv = Arc::new(kv);
        let sync = SyncPipeline::start(Arc::clone(&kv), owners)?;
        Ok(Self { kv, sync })
    }

    pub fn users(&self) -> KvUserRepository<'_> {
        KvUserRepository::new(&self.kv, &self.sync)
    }

    pub fn tokens(&self) -> KvTokenRepository<'_> {
        KvTokenRepository::new(&self.kv, self.users())
    }

    pub fn todos(&self) -> KvTodoRepository<'_> {
        KvTodoRepository::new(&self.kv, &self.sync)
    }

    /// Stops the sync workers, then closes the database.
    ///
    /// Fails with `EngineInUse` when something else still holds the engine;
    /// the connection then stays open until that holder drops it.
    pub fn close(self) -> DbResult<()> {
        let Self { kv, mut sync } = self;
        sync.shutdown();
        drop(sync);

        let kv = Arc::try_unwrap(kv).map_err(|shared| {
            let handles = Arc::strong_count(&shared) - 1;
            error!(
                "event=storage_close module=storage status=error error_code=engine_in_use handles={handles}"
            );
            DbError::EngineInUse { handles }
        })?;
        kv.close()?;
        info!("event=storage_close module=storage status=ok");
        Ok(())
    }
}

fn db_path(name: &Path) -> PathBuf {
    let mut path = name.as_os_str().to_owned();
    path.push(".db");
    PathBuf::from(path)
}
