#![allow(dead_code)]

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use todostore_core::{Storage, TodoItem, TokenCodec};
use uuid::Uuid;

pub const SIGNING_KEY: &[u8] = b"test-signing-key";
const EVENTUALLY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn codec() -> TokenCodec {
    TokenCodec::new(SIGNING_KEY)
}

/// On-disk store in a private temp directory.
pub struct TestStore {
    pub storage: Storage,
    pub dir: TempDir,
}

impl TestStore {
    pub fn open() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path().join("todo"), codec()).unwrap();
        Self { storage, dir }
    }

    /// Path of the SQLite file backing `storage`.
    pub fn db_file(&self) -> PathBuf {
        self.dir.path().join("todo.db")
    }
}

pub fn item(id: &str, title: &str, due: &str, rank: i64) -> TodoItem {
    TodoItem {
        id: Uuid::parse_str(id).unwrap(),
        title: title.to_string(),
        due_date: due.parse().unwrap(),
        rank,
    }
}

/// Polls `check` with growing sleeps until it holds or the timeout passes.
pub fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let started = Instant::now();
    let mut delay = Duration::from_millis(2);
    loop {
        if check() {
            return true;
        }
        if started.elapsed() > EVENTUALLY_TIMEOUT {
            return false;
        }
        thread::sleep(delay);
        delay = (delay * 2).min(Duration::from_millis(100));
    }
}
