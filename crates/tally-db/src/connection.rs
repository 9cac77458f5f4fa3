//! Database connection management.
//!
//! A [`Database`] owns the single SQLite connection shared by every model client. It
//! is cheap to clone; clones share the connection, the event sink and the bulk-mutation
//! policy.

use std::{
    fs,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;
use tally_config::{BulkMutation, Config};
use tally_events::EventSinkHandle;
use tracing::{debug, info};

use crate::{
    error::{DbError, Result},
    schema::all_tables,
};

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    events: EventSinkHandle,
    bulk_mutation: BulkMutation,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("bulk_mutation", &self.bulk_mutation)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Opens the database described by `config` and creates any missing tables.
    ///
    /// File databases get their parent directory created and the configured journal
    /// mode applied.
    pub fn open(config: &Config, events: EventSinkHandle) -> Result<Self> {
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            let path = config.get_db_path()?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let conn = Connection::open(&path)?;
            let mode: String = conn.pragma_update_and_check(
                None,
                "journal_mode",
                config.journal_mode().as_pragma(),
                |row| row.get(0),
            )?;
            info!(path = %path.display(), journal_mode = %mode, "opened database");
            conn
        };

        Self::with_connection(conn, events, config.bulk_mutation())
    }

    /// Opens a private in-memory database with the default bulk-mutation policy.
    pub fn open_in_memory(events: EventSinkHandle) -> Result<Self> {
        Self::with_connection(
            Connection::open_in_memory()?,
            events,
            BulkMutation::default(),
        )
    }

    fn with_connection(
        conn: Connection,
        events: EventSinkHandle,
        bulk_mutation: BulkMutation,
    ) -> Result<Self> {
        bootstrap(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            events,
            bulk_mutation,
        })
    }

    pub fn with_bulk_mutation(mut self, bulk_mutation: BulkMutation) -> Self {
        self.bulk_mutation = bulk_mutation;
        self
    }

    pub fn events(&self) -> &EventSinkHandle {
        &self.events
    }

    pub fn bulk_mutation(&self) -> BulkMutation {
        self.bulk_mutation
    }

    /// Runs `f` on the blocking pool while holding the connection lock.
    pub(crate) async fn run<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| DbError::PoisonError)?;
            f(&mut conn)
        })
        .await?
    }
}

/// Creates every registered table that does not exist yet.
fn bootstrap(conn: &Connection) -> Result<()> {
    for table in all_tables() {
        debug!(table = table.name, "ensuring table");
        conn.execute_batch(&table.create_table_sql())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serial_test::serial;
    use tally_config::{JournalMode, IN_MEMORY};
    use tally_events::NullSink;
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_open_in_memory_bootstraps_tables() {
        let db = Database::open_in_memory(Arc::new(NullSink)).unwrap();
        let tables: Vec<String> = db
            .run(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(names)
            })
            .await
            .unwrap();
        assert_eq!(tables, ["invoice_templates", "printers", "users"]);
    }

    #[tokio::test]
    #[serial]
    async fn test_open_configured_in_memory_database() {
        std::env::remove_var("TALLY_DB");
        let config = Config {
            db_path: Some(IN_MEMORY.to_string()),
            ..Config::default_config()
        };

        let db = Database::open(&config, Arc::new(NullSink)).unwrap();
        let file: String = db
            .run(|conn| {
                Ok(conn.query_row("PRAGMA database_list", [], |row| row.get(2))?)
            })
            .await
            .unwrap();
        assert!(file.is_empty());
        assert!(!std::path::Path::new(IN_MEMORY).exists());
    }

    #[tokio::test]
    #[serial]
    async fn test_open_file_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("tally.db");
        let config = Config {
            db_path: Some(path.display().to_string()),
            journal_mode: Some(JournalMode::Wal),
            bulk_mutation: Some(BulkMutation::Deny),
        };

        let db = Database::open(&config, Arc::new(NullSink)).unwrap();
        assert!(path.exists());
        assert_eq!(db.bulk_mutation(), BulkMutation::Deny);

        let mode: String = db
            .run(|conn| Ok(conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");

        drop(db);
        // Re-opening must not fail on the existing tables.
        Database::open(&config, Arc::new(NullSink)).unwrap();
    }
}
