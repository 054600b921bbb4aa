//! SQLite-based local working store for the dashboard.
//!
//! The database lives at `~/.growthdesk/growthdesk.db` and holds the news
//! backlog, the read-history, and the book library. The contact directory is
//! deliberately NOT here: its source of truth is the external sheet store
//! behind [`crate::directory::DirectoryStore`]; SQLite only carries data this
//! app owns outright.

use std::path::PathBuf;

use rusqlite::Connection;

pub mod types;
pub use types::*;

pub struct DashboardDb {
    conn: Connection,
}

impl DashboardDb {
    /// Direct access to the connection for one-off queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one transaction: commit when it returns Ok, roll the
    /// whole batch back when it returns Err.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Self) -> Result<T, DbError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(self) {
            Ok(val) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Open the database at its canonical path, creating file and schema on
    /// first use.
    pub fn open() -> Result<Self, DbError> {
        Self::open_at(Self::db_path()?)
    }

    /// Open a specific file. Tests hand their own path in here.
    pub(crate) fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL keeps reads cheap while a scrape ingest is writing.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        crate::migrations::apply_pending(&conn).map_err(DbError::Migration)?;

        Ok(Self { conn })
    }

    fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".growthdesk").join("growthdesk.db"))
    }
}

pub mod articles;
pub mod books;

// =============================================================================
// Shared test utilities
// =============================================================================


// =============================================================================
// Tests
// =============================================================================
