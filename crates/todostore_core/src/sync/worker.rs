//! Receive loops run by the sync worker threads.
//!
//! Every loop ends when its queue disconnects. Errors never leave a loop:
//! the caller that triggered the work already got its answer.

use super::TodoChange;
use crate::db::{DbResult, KvStore};
use crate::model::todo::TodoId;
use crate::repo::keys::{global_todo_key, trailing_segment, Partition, TOKENS_PREFIX};
use crate::token::TokenOwner;
use log::{debug, error, info, warn};
use std::sync::mpsc::Receiver;

pub(super) fn run_user_deleted(kv: &KvStore, owners: &dyn TokenOwner, rx: Receiver<String>) {
    info!("event=sync_worker module=sync status=start worker=user_deleted");
    for email in rx {
        match cascade_user(kv, owners, &email) {
            Ok(report) if report.failed == 0 => info!(
                "event=user_cascade module=sync status=ok tokens_deleted={} todos_deleted={}",
                report.tokens_deleted, report.todos_deleted
            ),
            Ok(report) => error!(
                "event=user_cascade module=sync status=partial tokens_deleted={} todos_deleted={} failed={}",
                report.tokens_deleted, report.todos_deleted, report.failed
            ),
            Err(err) => error!(
                "event=user_cascade module=sync status=error error_code=cascade_failed error={err}"
            ),
        }
    }
    info!("event=sync_worker module=sync status=stop worker=user_deleted");
}

pub(super) fn run_todo_deleted(kv: &KvStore, rx: Receiver<TodoId>) {
    info!("event=sync_worker module=sync status=start worker=todo_deleted");
    for id in rx {
        match kv.delete(&global_todo_key(id)) {
            Ok(()) => debug!("event=sync_delete module=sync status=ok id={id}"),
            Err(err) if err.is_not_found() => {
                debug!("event=sync_delete module=sync status=skipped reason=absent id={id}")
            }
            Err(err) => error!(
                "event=sync_delete module=sync status=error id={id} error_code=global_delete_failed error={err}"
            ),
        }
    }
    info!("event=sync_worker module=sync status=stop worker=todo_deleted");
}

pub(super) fn run_todo_updated(kv: &KvStore, rx: Receiver<TodoChange>) {
    info!("event=sync_worker module=sync status=start worker=todo_updated");
    for change in rx {
        let source = Partition::Owner(&change.owner).item_key(change.id);
        match kv.copy(&source, &global_todo_key(change.id)) {
            Ok(()) => debug!("event=sync_update module=sync status=ok id={}", change.id),
            // The owner record vanished before the copy; a delete is queued.
            Err(err) if err.is_not_found() => warn!(
                "event=sync_update module=sync status=dropped reason=source_absent id={}",
                change.id
            ),
            Err(err) => error!(
                "event=sync_update module=sync status=error id={} error_code=global_update_failed error={err}",
                change.id
            ),
        }
    }
    info!("event=sync_worker module=sync status=stop worker=todo_updated");
}

#[derive(Debug, Default, PartialEq, Eq)]
struct CascadeReport {
    tokens_deleted: usize,
    todos_deleted: usize,
    failed: usize,
}

/// Removes every token and todo item belonging to `email`.
///
/// Tokens whose owner cannot be resolved are treated as orphans and removed
/// as well. A failed delete is logged and counted; the cascade goes on with
/// the remaining keys. Only a failed scan aborts it.
fn cascade_user(kv: &KvStore, owners: &dyn TokenOwner, email: &str) -> DbResult<CascadeReport> {
    let mut report = CascadeReport::default();

    for key in kv.keys_with_prefix(TOKENS_PREFIX)? {
        let token = &key[TOKENS_PREFIX.len()..];
        let doomed = match owners.owner_of(token) {
            Ok(owner) => owner == email,
            Err(err) => {
                debug!("event=user_cascade module=sync status=orphan_token reason={err}");
                true
            }
        };
        if doomed && reap(kv, &key, "token", &mut report) {
            report.tokens_deleted += 1;
        }
    }

    let partition = Partition::Owner(email);
    for key in kv.keys_with_prefix(&partition.prefix())? {
        let id = trailing_segment(&key);
        if reap(kv, &key, "todo", &mut report) {
            report.todos_deleted += 1;
        }
        reap(kv, &global_todo_key(id), "global_todo", &mut report);
    }

    Ok(report)
}

/// Deletes `key`, returning whether a record was removed.
fn reap(kv: &KvStore, key: &str, kind: &str, report: &mut CascadeReport) -> bool {
    match kv.delete(key) {
        Ok(()) => true,
        Err(err) if err.is_not_found() => false,
        Err(err) => {
            report.failed += 1;
            error!(
                "event=user_cascade module=sync status=error kind={kind} error_code=cascade_delete_failed error={err}"
            );
            false
        }
    }
}
