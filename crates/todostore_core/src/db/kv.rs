//! Ordered key-value accessor over the `kv` table.
//!
//! # Responsibility
//! - Provide get/set/delete of raw bytes, UTF-8 strings and JSON values.
//! - Provide ordered prefix iteration.
//!
//! # Invariants
//! - Every call is atomic for the single key it touches; nothing spans calls.
//! - `iterate_prefix` visits keys in byte order and stops at the first key
//!   that does not share the prefix.
//! - Callbacks never run while the connection lock is held.

use super::{DbError, DbResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

const UPSERT_SQL: &str = "INSERT INTO kv (key, value) VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value;";

/// Shared handle to the embedded key-value engine.
///
/// The store exclusively owns the SQLite connection. Repositories and sync
/// workers borrow it; only [`KvStore::close`] releases it.
pub struct KvStore {
    conn: Mutex<Connection>,
}

impl KvStore {
    /// Wraps a migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn get(&self, key: &str) -> DbResult<Vec<u8>> {
        let conn = self.lock()?;
        conn.query_row("SELECT value FROM kv WHERE key = ?1;", [key], |row| {
            row.get::<_, Vec<u8>>(0)
        })
        .optional()?
        .ok_or_else(|| DbError::KeyNotFound(key.to_string()))
    }

    /// Upserts `value` at `key`.
    pub fn set(&self, key: &str, value: &[u8]) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute(UPSERT_SQL, params![key, value])?;
        Ok(())
    }

    /// Overwrites `key` only when it already exists.
    pub fn replace(&self, key: &str, value: &[u8]) -> DbResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE kv SET value = ?2 WHERE key = ?1;",
            params![key, value],
        )?;
        if changed == 0 {
            return Err(DbError::KeyNotFound(key.to_string()));
        }
        Ok(())
    }

    /// Removes `key`; absent keys report `KeyNotFound`.
    pub fn delete(&self, key: &str) -> DbResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM kv WHERE key = ?1;", [key])?;
        if changed == 0 {
            return Err(DbError::KeyNotFound(key.to_string()));
        }
        Ok(())
    }

    pub fn get_string(&self, key: &str) -> DbResult<String> {
        let raw = self.get(key)?;
        String::from_utf8(raw).map_err(|_| DbError::InvalidUtf8(key.to_string()))
    }

    pub fn set_string(&self, key: &str, value: &str) -> DbResult<()> {
        self.set(key, value.as_bytes())
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> DbResult<T> {
        let raw = self.get(key)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> DbResult<()> {
        let raw = serde_json::to_vec(value)?;
        self.set(key, &raw)
    }

    pub fn replace_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> DbResult<()> {
        let raw = serde_json::to_vec(value)?;
        self.replace(key, &raw)
    }

    /// Copies the value stored at `src` onto `dst` in one transaction.
    ///
    /// Nothing is written when `src` is absent.
    pub fn copy(&self, src: &str, dst: &str) -> DbResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let value = tx
            .query_row("SELECT value FROM kv WHERE key = ?1;", [src], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?
            .ok_or_else(|| DbError::KeyNotFound(src.to_string()))?;
        tx.execute(UPSERT_SQL, params![dst, value])?;
        tx.commit()?;
        Ok(())
    }

    /// Visits every entry whose key starts with `prefix`, in key order.
    ///
    /// Entries are read from one consistent snapshot. The first callback
    /// error aborts the scan and is returned unchanged.
    pub fn iterate_prefix<E>(
        &self,
        prefix: &str,
        mut on_entry: impl FnMut(&str, &[u8]) -> Result<(), E>,
    ) -> Result<(), E>
    where
        E: From<DbError>,
    {
        let entries = self.scan_prefix(prefix).map_err(E::from)?;
        for (key, value) in &entries {
            on_entry(key.as_str(), value.as_slice())?;
        }
        Ok(())
    }

    /// Collects the keys under `prefix` without reading their values.
    pub fn keys_with_prefix(&self, prefix: &str) -> DbResult<Vec<String>> {
        Ok(self
            .scan_prefix(prefix)?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }

    /// Releases the underlying connection.
    pub fn close(self) -> DbResult<()> {
        let conn = self.conn.into_inner().map_err(|_| DbError::LockPoisoned)?;
        conn.close().map_err(|(_, err)| DbError::Sqlite(err))
    }

    fn scan_prefix(&self, prefix: &str) -> DbResult<Vec<(String, Vec<u8>)>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM kv WHERE key >= ?1 ORDER BY key ASC;")?;
        let mut rows = stmt.query([prefix])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push((key, row.get::<_, Vec<u8>>(1)?));
        }
        Ok(entries)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::KvStore;
    use crate::db::{open_db_in_memory, DbError};

    fn store() -> KvStore {
        KvStore::new(open_db_in_memory().unwrap())
    }

    #[test]
    fn missing_key_is_distinguished_from_other_errors() {
        let kv = store();
        let err = kv.get("/nope").unwrap_err();
        assert!(matches!(err, DbError::KeyNotFound(ref key) if key == "/nope"));
        assert!(kv.delete("/nope").unwrap_err().is_not_found());
        assert!(kv.replace("/nope", b"x").unwrap_err().is_not_found());
    }

    #[test]
    fn prefix_scan_stops_at_first_foreign_key() {
        let kv = store();
        kv.set("/a/1", b"1").unwrap();
        kv.set("/a/2", b"2").unwrap();
        kv.set("/a0", b"x").unwrap();
        kv.set("/b/1", b"3").unwrap();

        let mut seen = Vec::new();
        kv.iterate_prefix::<DbError>("/a/", |key, value| {
            seen.push((key.to_string(), value.to_vec()));
            Ok(())
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                ("/a/1".to_string(), b"1".to_vec()),
                ("/a/2".to_string(), b"2".to_vec()),
            ]
        );
    }

    #[test]
    fn callback_error_aborts_scan() {
        let kv = store();
        kv.set("/p/1", b"1").unwrap();
        kv.set("/p/2", b"2").unwrap();

        let mut visited = 0;
        let result = kv.iterate_prefix("/p/", |key, _| {
            visited += 1;
            Err(DbError::KeyNotFound(key.to_string()))
        });

        assert!(matches!(result, Err(DbError::KeyNotFound(ref key)) if key == "/p/1"));
        assert_eq!(visited, 1);
    }

    #[test]
    fn callbacks_may_reenter_the_store() {
        let kv = store();
        kv.set("/p/1", b"1").unwrap();
        kv.set("/p/2", b"2").unwrap();

        kv.iterate_prefix::<DbError>("/p/", |key, _| kv.delete(key))
            .unwrap();

        assert!(kv.keys_with_prefix("/p/").unwrap().is_empty());
    }

    #[test]
    fn copy_requires_source_and_overwrites_destination() {
        let kv = store();
        kv.set_string("/dst", "old").unwrap();
        assert!(kv.copy("/src", "/dst").unwrap_err().is_not_found());
        assert_eq!(kv.get_string("/dst").unwrap(), "old");

        kv.set_string("/src", "new").unwrap();
        kv.copy("/src", "/dst").unwrap();
        assert_eq!(kv.get_string("/dst").unwrap(), "new");
    }

    #[test]
    fn close_releases_connection() {
        let kv = store();
        kv.set_json("/k", &vec![1, 2, 3]).unwrap();
        assert_eq!(kv.get_json::<Vec<i32>>("/k").unwrap(), vec![1, 2, 3]);
        kv.close().unwrap();
    }
}
