//! Todo repository over owner partitions and the global index.
//!
//! # Responsibility
//! - CRUD on `/todos/{owner}/{id}` for the authoritative copy.
//! - Reads of `/todos/all/{id}` through the empty owner.
//! - Queue global-index work after every successful owner write.
//!
//! # Invariants
//! - A record's `id` must equal its key's trailing segment; reads reject
//!   mismatches as `InvalidData`.
//! - Mutations never write the global index directly.
//! - `update_todo`/`delete_todo` block until the sync pipeline takes the
//!   message, not until the global index is updated.

use super::keys::{trailing_segment, Partition};
use super::{RepoError, RepoResult};
use crate::db::KvStore;
use crate::model::todo::{TodoId, TodoItem};
use crate::sync::SyncPipeline;

pub trait TodoRepository {
    fn create_todo(&self, owner: &str, item: &TodoItem) -> RepoResult<()>;
    /// Lists a partition in key order; `""` lists the global index.
    fn list_todos(&self, owner: &str) -> RepoResult<Vec<TodoItem>>;
    fn get_todo(&self, owner: &str, id: TodoId) -> RepoResult<TodoItem>;
    fn update_todo(&self, owner: &str, item: &TodoItem) -> RepoResult<()>;
    fn delete_todo(&self, owner: &str, id: TodoId) -> RepoResult<()>;
}

/// Key-value backed todo repository.
pub struct KvTodoRepository<'s> {
    kv: &'s KvStore,
    sync: &'s SyncPipeline,
}

impl<'s> KvTodoRepository<'s> {
    pub fn new(kv: &'s KvStore, sync: &'s SyncPipeline) -> Self {
        Self { kv, sync }
    }
}

impl TodoRepository for KvTodoRepository<'_> {
    fn create_todo(&self, owner: &str, item: &TodoItem) -> RepoResult<()> {
        let partition = Partition::for_owner(owner)?;
        item.validate()?;

        self.kv.set_json(&partition.item_key(item.id), item)?;
        self.sync.todo_updated(owner, item.id)
    }

    fn list_todos(&self, owner: &str) -> RepoResult<Vec<TodoItem>> {
        let partition = Partition::parse(owner)?;
        let mut items = Vec::new();

        self.kv
            .iterate_prefix(&partition.prefix(), |key, value| -> RepoResult<()> {
                items.push(decode_item(key, value)?);
                Ok(())
            })?;

        Ok(items)
    }

    fn get_todo(&self, owner: &str, id: TodoId) -> RepoResult<TodoItem> {
        let key = Partition::parse(owner)?.item_key(id);
        let value = self.kv.get(&key)?;
        decode_item(&key, &value)
    }

    fn update_todo(&self, owner: &str, item: &TodoItem) -> RepoResult<()> {
        let partition = Partition::for_owner(owner)?;
        item.validate()?;

        self.kv.replace_json(&partition.item_key(item.id), item)?;
        self.sync.todo_updated(owner, item.id)
    }

    fn delete_todo(&self, owner: &str, id: TodoId) -> RepoResult<()> {
        let partition = Partition::for_owner(owner)?;

        self.kv.delete(&partition.item_key(id))?;
        self.sync.todo_deleted(id)
    }
}

fn decode_item(key: &str, value: &[u8]) -> RepoResult<TodoItem> {
    let item: TodoItem = serde_json::from_slice(value)
        .map_err(|err| RepoError::InvalidData(format!("undecodable todo at `{key}`: {err}")))?;

    if trailing_segment(key) != item.id.to_string() {
        return Err(RepoError::InvalidData(format!(
            "key and value mismatch: key={key}, id={}",
            item.id
        )));
    }

    Ok(item)
}
