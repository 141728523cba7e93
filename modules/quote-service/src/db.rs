//! SQLite-backed key-value store for the quote service.
//!
//! Entries are either durable or session scoped. Session-scoped entries are
//! wiped every time the database is opened, so they never outlive the
//! process that wrote them.

use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const QUOTES_KEY: &str = "dm_quotes_v1";
pub const SELECTED_CATEGORY_KEY: &str = "dm_selected_category";
pub const LAST_VIEWED_KEY: &str = "dm_last_viewed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Durable,
    Session,
}

pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    pub fn open(path: &str) -> SqliteResult<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.create_tables()?;
        let dropped = db.clear_session_entries()?;
        if dropped > 0 {
            log::debug!("[QUOTES] Dropped {} session entries from a previous run", dropped);
        }
        Ok(db)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create_tables(&self) -> SqliteResult<()> {
        let conn = self.lock();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                session_scoped INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;
        Ok(())
    }

    fn clear_session_entries(&self) -> SqliteResult<usize> {
        let conn = self.lock();
        conn.execute("DELETE FROM kv_entries WHERE session_scoped = 1", [])
    }

    pub fn get(&self, key: &str) -> SqliteResult<Option<String>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT value FROM kv_entries WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()
    }

    pub fn set(&self, key: &str, value: &str, scope: Scope) -> SqliteResult<()> {
        let conn = self.lock();
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO kv_entries (key, value, session_scoped, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                session_scoped = excluded.session_scoped,
                updated_at = excluded.updated_at",
            rusqlite::params![key, value, scope == Scope::Session, now],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_overwrite() {
        let db = Db::open(":memory:").unwrap();
        assert_eq!(db.get("k").unwrap(), None);
        db.set("k", "one", Scope::Durable).unwrap();
        db.set("k", "two", Scope::Durable).unwrap();
        assert_eq!(db.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_scope_can_change_on_overwrite() {
        let db = Db::open(":memory:").unwrap();
        db.set("k", "v", Scope::Session).unwrap();
        db.set("k", "v", Scope::Durable).unwrap();
        assert_eq!(db.clear_session_entries().unwrap(), 0);
        assert!(db.get("k").unwrap().is_some());
    }

    #[test]
    fn test_session_entries_do_not_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.db");
        let path = path.to_str().unwrap();

        {
            let db = Db::open(path).unwrap();
            db.set(QUOTES_KEY, "[]", Scope::Durable).unwrap();
            db.set(LAST_VIEWED_KEY, "{}", Scope::Session).unwrap();
            assert!(db.get(LAST_VIEWED_KEY).unwrap().is_some());
        }

        let db = Db::open(path).unwrap();
        assert_eq!(db.get(QUOTES_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(db.get(LAST_VIEWED_KEY).unwrap(), None);
    }
}
