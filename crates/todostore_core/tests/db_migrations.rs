use rusqlite::Connection;
use todostore_core::db::migrations::latest_version;
use todostore_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv");
}

#[test]
fn kv_table_is_keyed_without_rowid() {
    let conn = open_db_in_memory().unwrap();

    let sql: String = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'kv';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(sql.contains("WITHOUT ROWID"), "unexpected schema: {sql}");
    assert!(conn.prepare("SELECT rowid FROM kv;").is_err());
}

#[test]
fn kv_keys_sort_by_raw_bytes() {
    let conn = open_db_in_memory().unwrap();
    for key in ["/todos/b", "/todos/B", "/todos/a", "/todos0", "/todos/"] {
        conn.execute("INSERT INTO kv (key, value) VALUES (?1, x'');", [key])
            .unwrap();
    }

    let mut stmt = conn
        .prepare("SELECT key FROM kv WHERE key >= '/todos/' ORDER BY key;")
        .unwrap();
    let keys: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        keys,
        vec!["/todos/", "/todos/B", "/todos/a", "/todos/b", "/todos0"]
    );
}

#[test]
fn duplicate_keys_are_rejected_case_sensitively() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO kv (key, value) VALUES ('/users/a', x'');", [])
        .unwrap();

    assert!(conn
        .execute("INSERT INTO kv (key, value) VALUES ('/users/a', x'');", [])
        .is_err());
    conn.execute("INSERT INTO kv (key, value) VALUES ('/users/A', x'');", [])
        .unwrap();
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todo.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO kv (key, value) VALUES ('/users/a@b.co', x'7b7d');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let rows: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM kv;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn file_databases_use_write_ahead_logging() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("todo.db")).unwrap();

    let mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode, "wal");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
