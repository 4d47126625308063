//! Lazily opened SQLite connection shared by the database facades.

use crate::error::Result;
use crate::schema::{self, BackendSchema};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Connection that is opened, and its backend schema brought up, on first use.
///
/// Uninitialized until the first call to [`LazyStore::connection`]; Ready for
/// the rest of its lifetime afterwards.
#[derive(Debug)]
pub(crate) struct LazyStore {
    path: PathBuf,
    schema: &'static BackendSchema,
    conn: Option<Connection>,
}

impl LazyStore {
    pub(crate) fn new<P: AsRef<Path>>(path: P, schema: &'static BackendSchema) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            schema,
            conn: None,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.conn.is_some()
    }

    /// Open the file and initialize the schema if this is the first use.
    pub(crate) fn connection(&mut self) -> Result<&mut Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                let conn = Connection::open(&self.path)?;
                schema::initialize(&conn, self.schema)?;
                tracing::debug!(path = %self.path.display(), backend = self.schema.name, "opened srs database");
                conn
            }
        };
        Ok(self.conn.insert(conn))
    }
}
