// passd — SQLite Database Management
//
// Opens (or creates) the password database and bootstraps its single
// table. Bootstrap is idempotent: first run and every later run go
// through the same statement.

use std::time::Duration;

use rusqlite::Connection;

use super::StoreError;

/// How long a writer waits on SQLite's write lock before the call fails.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Wrapper around a SQLite connection holding the `passwords` table.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &std::path::Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let db = Self { conn };
        db.run_migrations()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing only).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS passwords (
                id              TEXT PRIMARY KEY,
                password_enc    BLOB NOT NULL
            );
            ",
        )?;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
