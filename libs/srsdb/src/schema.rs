//! SQLite schema definitions and the additive schema initializer.
//!
//! Each backend owns a disjoint pair of tables (`<prefix>_cards` and
//! `<prefix>_reviews`). Initialization never drops or alters anything: missing
//! tables are created, tables that already exist are checked for the columns
//! this crate reads and writes, and every other table in the file is ignored.

use crate::error::{DbError, Result};
use rusqlite::{params, Connection};

/// Tables and DDL owned by one scheduling backend.
#[derive(Debug)]
pub struct BackendSchema {
    pub name: &'static str,
    pub tables: &'static [TableSpec],
    /// Idempotent DDL creating every table and index.
    pub ddl: &'static str,
}

/// A table name together with the columns the store depends on.
#[derive(Debug)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    /// Column that must be a single-column primary key or unique index.
    pub unique_key: Option<&'static str>,
}

pub const FSRS_CARDS: &str = "fsrs_cards";
pub const FSRS_REVIEWS: &str = "fsrs_reviews";
pub const EBISU_CARDS: &str = "ebisu_cards";
pub const EBISU_REVIEWS: &str = "ebisu_reviews";

/// Schema for the FSRS backend.
pub const FSRS_SCHEMA: BackendSchema = BackendSchema {
    name: "fsrs",
    tables: &[
        TableSpec {
            name: FSRS_CARDS,
            columns: &[
                "question_key",
                "difficulty",
                "stability",
                "reps",
                "lapses",
                "state",
                "elapsed_days",
                "scheduled_days",
                "last_review",
                "due",
            ],
            unique_key: Some("question_key"),
        },
        TableSpec {
            name: FSRS_REVIEWS,
            columns: &[
                "id",
                "question_key",
                "reviewed_at",
                "correctness",
                "rating",
                "state",
                "difficulty",
                "stability",
                "elapsed_days",
                "scheduled_days",
                "due",
            ],
            unique_key: None,
        },
    ],
    ddl: r#"
-- Current FSRS memory state, one row per question
CREATE TABLE IF NOT EXISTS fsrs_cards (
    question_key TEXT PRIMARY KEY,
    difficulty REAL NOT NULL,
    stability REAL NOT NULL,
    reps INTEGER NOT NULL DEFAULT 0,
    lapses INTEGER NOT NULL DEFAULT 0,
    state INTEGER NOT NULL DEFAULT 0,
    elapsed_days REAL NOT NULL DEFAULT 0,
    scheduled_days REAL NOT NULL DEFAULT 0,
    last_review TEXT,
    due TEXT NOT NULL
);

-- Append-only FSRS answer history
CREATE TABLE IF NOT EXISTS fsrs_reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question_key TEXT NOT NULL,
    reviewed_at TEXT NOT NULL,
    correctness INTEGER NOT NULL,
    rating INTEGER NOT NULL,
    state INTEGER NOT NULL,
    difficulty REAL NOT NULL,
    stability REAL NOT NULL,
    elapsed_days REAL NOT NULL,
    scheduled_days REAL NOT NULL,
    due TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_fsrs_cards_due ON fsrs_cards(due);
CREATE INDEX IF NOT EXISTS idx_fsrs_reviews_question ON fsrs_reviews(question_key, reviewed_at);
"#,
};

/// Schema for the Ebisu backend.
pub const EBISU_SCHEMA: BackendSchema = BackendSchema {
    name: "ebisu",
    tables: &[
        TableSpec {
            name: EBISU_CARDS,
            columns: &[
                "question_key",
                "alpha",
                "beta",
                "t",
                "total_reviews",
                "last_review",
                "due",
            ],
            unique_key: Some("question_key"),
        },
        TableSpec {
            name: EBISU_REVIEWS,
            columns: &[
                "id",
                "question_key",
                "reviewed_at",
                "correctness",
                "success",
                "recall_probability",
                "alpha",
                "beta",
                "t",
                "due",
            ],
            unique_key: None,
        },
    ],
    ddl: r#"
-- Current Beta recall model, one row per question
CREATE TABLE IF NOT EXISTS ebisu_cards (
    question_key TEXT PRIMARY KEY,
    alpha REAL NOT NULL,
    beta REAL NOT NULL,
    t REAL NOT NULL,
    total_reviews INTEGER NOT NULL DEFAULT 0,
    last_review TEXT NOT NULL,
    due TEXT NOT NULL
);

-- Append-only Ebisu answer history
CREATE TABLE IF NOT EXISTS ebisu_reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question_key TEXT NOT NULL,
    reviewed_at TEXT NOT NULL,
    correctness INTEGER NOT NULL,
    success REAL NOT NULL,
    recall_probability REAL,
    alpha REAL NOT NULL,
    beta REAL NOT NULL,
    t REAL NOT NULL,
    due TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ebisu_cards_due ON ebisu_cards(due);
CREATE INDEX IF NOT EXISTS idx_ebisu_reviews_question ON ebisu_reviews(question_key, reviewed_at);
"#,
};

/// Whether a table (of any shape) with this name exists.
pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn table_columns(conn: &Connection, name: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map(params![name], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(columns)
}

/// Whether `column` alone is the primary key of `table` or carries a unique index.
fn has_unique_key(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) WHERE pk > 0")?;
    let pk = stmt
        .query_map(params![table], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    if let [only] = pk.as_slice() {
        if only.eq_ignore_ascii_case(column) {
            return Ok(true);
        }
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_index_list(?1) WHERE \"unique\" = 1")?;
    let indexes = stmt
        .query_map(params![table], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    let mut stmt = conn.prepare("SELECT name FROM pragma_index_info(?1)")?;
    for index in indexes {
        let indexed = stmt
            .query_map(params![index], |row| row.get::<_, Option<String>>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if let [Some(only)] = indexed.as_slice() {
            if only.eq_ignore_ascii_case(column) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Bring `schema` into the file behind `conn`.
///
/// Returns `true` if any table had to be created.
pub fn initialize(conn: &Connection, schema: &BackendSchema) -> Result<bool> {
    let mut missing = false;
    for table in schema.tables {
        if !table_exists(conn, table.name)? {
            missing = true;
            continue;
        }
        let present = table_columns(conn, table.name)?;
        if let Some(column) = table
            .columns
            .iter()
            .find(|column| !present.iter().any(|p| p.eq_ignore_ascii_case(column)))
        {
            return Err(DbError::SchemaConflict {
                table: table.name.to_string(),
                column: column.to_string(),
            });
        }
        if let Some(key) = table.unique_key {
            if !has_unique_key(conn, table.name, key)? {
                return Err(DbError::KeyNotUnique {
                    table: table.name.to_string(),
                    column: key.to_string(),
                });
            }
        }
    }

    if missing {
        conn.execute_batch(schema.ddl)?;
        tracing::info!(backend = schema.name, "created scheduling tables");
    } else {
        tracing::debug!(backend = schema.name, "scheduling tables already present");
    }
    Ok(missing)
}
