//! Background projection of owner writes into the global todo index.
//!
//! # Responsibility
//! - Own the three work queues (user deleted, todo deleted, todo updated).
//! - Run one dedicated worker thread per queue.
//! - Stop every worker with a single shutdown.
//!
//! # Invariants
//! - Queues are rendezvous channels: a send returns only after a worker has
//!   taken the message, never after the work is applied.
//! - Dropping the sender set is the only shutdown signal; each worker leaves
//!   its receive loop on disconnect.
//! - Worker failures are logged and dropped, never retried or surfaced.

mod worker;

use crate::db::{DbError, DbResult, KvStore};
use crate::model::todo::TodoId;
use crate::repo::{RepoError, RepoResult};
use crate::token::TokenOwner;
use log::{error, info};
use std::sync::mpsc::{sync_channel, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Owner write that must be copied into the global index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoChange {
    pub owner: String,
    pub id: TodoId,
}

struct Queues {
    user_deleted: SyncSender<String>,
    todo_deleted: SyncSender<TodoId>,
    todo_updated: SyncSender<TodoChange>,
}

/// Handle over the running sync workers.
pub struct SyncPipeline {
    queues: Option<Queues>,
    workers: Vec<(&'static str, JoinHandle<()>)>,
}

impl SyncPipeline {
    /// Spawns the workers against `kv`.
    ///
    /// `owners` resolves stored tokens to emails for the user cascade.
    pub fn start(kv: Arc<KvStore>, owners: Arc<dyn TokenOwner>) -> DbResult<Self> {
        let (user_deleted, user_deleted_rx) = sync_channel::<String>(0);
        let (todo_deleted, todo_deleted_rx) = sync_channel::<TodoId>(0);
        let (todo_updated, todo_updated_rx) = sync_channel::<TodoChange>(0);

        let mut pipeline = Self {
            queues: Some(Queues {
                user_deleted,
                todo_deleted,
                todo_updated,
            }),
            workers: Vec::with_capacity(3),
        };

        let worker_kv = Arc::clone(&kv);
        pipeline.spawn("user_deleted", move || {
            worker::run_user_deleted(&worker_kv, owners.as_ref(), user_deleted_rx)
        })?;
        let worker_kv = Arc::clone(&kv);
        pipeline.spawn("todo_deleted", move || {
            worker::run_todo_deleted(&worker_kv, todo_deleted_rx)
        })?;
        pipeline.spawn("todo_updated", move || {
            worker::run_todo_updated(&kv, todo_updated_rx)
        })?;

        info!("event=sync_start module=sync status=ok workers=3");
        Ok(pipeline)
    }

    /// Queues the cascade for a removed user record.
    pub fn user_deleted(&self, email: &str) -> RepoResult<()> {
        let queues = self.queues()?;
        queues
            .user_deleted
            .send(email.to_string())
            .map_err(|_| RepoError::SyncClosed("user_deleted"))
    }

    /// Queues removal of `id` from the global index.
    pub fn todo_deleted(&self, id: TodoId) -> RepoResult<()> {
        let queues = self.queues()?;
        queues
            .todo_deleted
            .send(id)
            .map_err(|_| RepoError::SyncClosed("todo_deleted"))
    }

    /// Queues a copy of `owner`'s record for `id` into the global index.
    pub fn todo_updated(&self, owner: &str, id: TodoId) -> RepoResult<()> {
        let queues = self.queues()?;
        queues
            .todo_updated
            .send(TodoChange {
                owner: owner.to_string(),
                id,
            })
            .map_err(|_| RepoError::SyncClosed("todo_updated"))
    }

    /// Closes every queue and waits for the workers to exit.
    ///
    /// Calling this more than once is a no-op.
    pub fn shutdown(&mut self) {
        if self.queues.take().is_none() && self.workers.is_empty() {
            return;
        }

        for (name, handle) in self.workers.drain(..) {
            if handle.join().is_err() {
                error!(
                    "event=sync_stop module=sync status=error worker={name} error_code=worker_panicked"
                );
            }
        }
        info!("event=sync_stop module=sync status=ok");
    }

    fn queues(&self) -> RepoResult<&Queues> {
        self.queues.as_ref().ok_or(RepoError::SyncClosed("pipeline"))
    }

    fn spawn(
        &mut self,
        name: &'static str,
        body: impl FnOnce() + Send + 'static,
    ) -> DbResult<()> {
        let handle = thread::Builder::new()
            .name(format!("todostore-sync-{name}"))
            .spawn(body)
            .map_err(DbError::WorkerSpawn)?;
        self.workers.push((name, handle));
        Ok(())
    }
}

impl Drop for SyncPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
