//! SQLite-based local store for the workdesk entities.
//!
//! The database lives at `~/.workdesk/workdesk.db` and is the single
//! durable store: work sessions, meetings, people, projects, clients,
//! employers, reminders, notes, action items, and bookmarks. Each entity
//! has a repository file in this module with typed CRUD methods; everything
//! dynamic (filters, joins, aggregation) goes through the structured query
//! engine instead.

use std::path::PathBuf;

use rusqlite::{Connection, OpenFlags};

pub mod types;
pub use types::*;

mod action_items;
mod bookmarks;
mod clients;
mod meetings;
mod notes;
mod people;
mod projects;
mod reminders;
mod work_sessions;

pub struct WorkdeskDb {
    conn: Connection,
}

impl WorkdeskDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
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

    /// Open (or create) the database at `~/.workdesk/workdesk.db` and apply
    /// the schema.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::db_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path. Useful for testing and for a
    /// config-supplied location.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL for concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        // FK enforcement comes after migrations so table-recreation
        // migrations can run with it off.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self { conn })
    }

    /// Open an in-memory database with the full schema applied.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Open the database in read-only mode, for tooling that must not
    /// contend with the server's writes.
    pub fn open_readonly() -> Result<Self, DbError> {
        let path = Self::db_path()?;
        Self::open_readonly_at(&path)
    }

    /// Open a database at an explicit path in read-only mode.
    pub fn open_readonly_at(path: &std::path::Path) -> Result<Self, DbError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Default database path: `~/.workdesk/workdesk.db`.
    pub fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".workdesk").join("workdesk.db"))
    }
}

/// Serialize a tag list to its JSON-array storage form.
pub(crate) fn tags_to_json(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

/// Parse a stored JSON-array tag column; malformed or missing text reads
/// as no tags.
pub(crate) fn tags_from_json(raw: Option<String>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip_through_json() {
        let tags = vec!["frontend".to_string(), "react".to_string()];
        let json = tags_to_json(&tags);
        assert_eq!(tags_from_json(Some(json)), tags);
    }

    #[test]
    fn test_malformed_tags_read_as_empty() {
        assert!(tags_from_json(Some("not json".to_string())).is_empty());
        assert!(tags_from_json(None).is_empty());
    }

    #[test]
    fn test_open_at_creates_parent_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("test.db");
        let db = WorkdeskDb::open_at(path.clone()).expect("open");
        drop(db);
        assert!(path.exists());
    }
}
