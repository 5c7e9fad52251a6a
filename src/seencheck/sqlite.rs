//! SQLite seencheck implementation

use crate::seencheck::{Seencheck, SeencheckError, SeencheckResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed seencheck store
///
/// The connection runs in WAL mode so concurrent workers get durable
/// writes without serializing on fsync for every mark.
pub struct SqliteSeencheck {
    conn: Mutex<Connection>,
}

impl SqliteSeencheck {
    /// Opens (or creates) the seencheck database at the given path
    pub fn new(path: &Path) -> SeencheckResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory store (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> SeencheckResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS seen (
            hash TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            first_seen TEXT NOT NULL
        );
    ",
    )
}

impl Seencheck for SqliteSeencheck {
    fn is_seen(&self, hash: &str) -> SeencheckResult<bool> {
        let conn = self.conn.lock().map_err(|_| SeencheckError::Poisoned)?;

        let found: Option<i64> = conn
            .query_row("SELECT 1 FROM seen WHERE hash = ?1", params![hash], |row| {
                row.get(0)
            })
            .optional()?;

        Ok(found.is_some())
    }

    fn mark(&self, hash: &str, kind: &str) -> SeencheckResult<()> {
        let conn = self.conn.lock().map_err(|_| SeencheckError::Poisoned)?;

        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT OR IGNORE INTO seen (hash, kind, first_seen) VALUES (?1, ?2, ?3)",
            params![hash, kind, now],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_hash_probes_false() {
        let store = SqliteSeencheck::new_in_memory().unwrap();
        assert!(!store.is_seen("12345").unwrap());
    }

    #[test]
    fn test_mark_then_probe() {
        let store = SqliteSeencheck::new_in_memory().unwrap();
        store.mark("12345", "seed").unwrap();
        assert!(store.is_seen("12345").unwrap());
        assert!(!store.is_seen("67890").unwrap());
    }

    #[test]
    fn test_mark_is_idempotent() {
        let store = SqliteSeencheck::new_in_memory().unwrap();
        store.mark("12345", "seed").unwrap();
        // A second mark with a different kind is a no-op on the stored value
        store.mark("12345", "asset").unwrap();

        let conn = store.conn.lock().unwrap();
        let kind: String = conn
            .query_row(
                "SELECT kind FROM seen WHERE hash = ?1",
                params!["12345"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(kind, "seed");
    }

    #[test]
    fn test_marks_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("seen.db");

        {
            let store = SqliteSeencheck::new(&db_path).unwrap();
            store.mark("42", "seed").unwrap();
        }

        let reopened = SqliteSeencheck::new(&db_path).unwrap();
        assert!(reopened.is_seen("42").unwrap());
    }
}
