use std::fs;
use std::path::{Path, PathBuf};

use duckdb::Connection;
use tracing::debug;
use worm_core::error::{Result, WormError};
use worm_core::model::analysis::ServiceRecord;

use crate::schema::SCHEMA_SQL;

/// Handle to the result database.
///
/// No connection is held between operations: every call opens the database,
/// runs, and closes it again via [`Store::with_connection`].
#[derive(Debug, Clone)]
pub struct Store {
    db_path: PathBuf,
}

impl Store {
    /// Opens (creating if needed) the database at `path` and applies the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| WormError::Io(format!("failed to create db dir: {e}")))?;
        }

        let store = Self {
            db_path: path.to_path_buf(),
        };
        store.with_connection(|conn| {
            conn.execute_batch(SCHEMA_SQL)
                .map_err(|e| WormError::Store(format!("failed to initialize schema: {e}")))
        })?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Opens a connection, hands it to `op`, and drops it on every exit path.
    pub fn with_connection<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        debug!(db_path = %self.db_path.display(), "opening duckdb connection");
        let mut conn = Connection::open(&self.db_path)
            .map_err(|e| WormError::Store(format!("failed to open duckdb: {e}")))?;
        op(&mut conn)
    }

    pub fn list_services(&self) -> Result<Vec<ServiceRecord>> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare("SELECT service_name FROM services ORDER BY service_name")
                .map_err(|e| WormError::Store(format!("prepare list services failed: {e}")))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ServiceRecord {
                        service_name: row.get(0)?,
                    })
                })
                .map_err(|e| WormError::Store(format!("list services failed: {e}")))?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| WormError::Store(format!("read service row failed: {e}")))
        })
    }
}
