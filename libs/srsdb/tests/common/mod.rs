//! Common test utilities and fixtures for integration tests.
//!
//! Each test gets its own temporary directory; the database file inside it is
//! created lazily by the database under test.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory holding one database path.
pub struct TestFile {
    _dir: TempDir,
    path: PathBuf,
}

impl TestFile {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("srs.db");
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Separate raw connection for inspecting what the database wrote.
    pub fn raw(&self) -> Connection {
        Connection::open(&self.path).expect("open raw connection")
    }

    pub fn count(&self, table: &str) -> i64 {
        self.raw()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("count rows")
    }

    /// Names of all non-internal tables, sorted.
    pub fn tables(&self) -> Vec<String> {
        let conn = self.raw();
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .expect("prepare table listing");
        let names = stmt
            .query_map([], |row| row.get(0))
            .expect("list tables")
            .collect::<Result<Vec<String>, _>>()
            .expect("read table names");
        names
    }

    /// Create an unrelated table with one row in it.
    pub fn add_unrelated_table(&self) {
        self.raw()
            .execute_batch(
                "CREATE TABLE unrelated_table (id INTEGER, data TEXT);
                 INSERT INTO unrelated_table VALUES (1, 'test');",
            )
            .expect("create unrelated table");
    }

    pub fn unrelated_data(&self) -> String {
        self.raw()
            .query_row("SELECT data FROM unrelated_table WHERE id = 1", [], |row| row.get(0))
            .expect("read unrelated table")
    }
}

/// Fixed reference time used across tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
}

pub fn days_after(days: i64) -> DateTime<Utc> {
    t0() + Duration::days(days)
}
