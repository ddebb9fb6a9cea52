//! SQLite-backed slot store.
//!
//! # Invariants
//! - Every write is a single `INSERT .. ON CONFLICT DO UPDATE`, so a reader
//!   sees either the previous blob or the new one.
//! - The connection is only touched while holding the store mutex.

use super::{SlotError, SlotResult, SlotStore};
use crate::db::{open_db, open_db_in_memory, DbResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

pub struct SqliteSlotStore {
    conn: Mutex<Connection>,
}

impl SqliteSlotStore {
    /// Opens (and migrates) the slot database at `path`.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already bootstrapped connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Returns occupied slot names in lexical order.
    pub fn slot_names(&self) -> SlotResult<Vec<String>> {
        let conn = self.conn.lock().map_err(|_| SlotError::LockPoisoned)?;
        let mut stmt = conn.prepare("SELECT name FROM slots ORDER BY name ASC;")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

impl SlotStore for SqliteSlotStore {
    fn read(&self, slot: &str) -> SlotResult<Option<Vec<u8>>> {
        let conn = self.conn.lock().map_err(|_| SlotError::LockPoisoned)?;
        let blob = conn
            .query_row(
                "SELECT blob FROM slots WHERE name = ?1;",
                params![slot],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(blob)
    }

    fn write(&self, slot: &str, blob: &[u8]) -> SlotResult<()> {
        let conn = self.conn.lock().map_err(|_| SlotError::LockPoisoned)?;
        conn.execute(
            "INSERT INTO slots (name, blob, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(name) DO UPDATE SET
                blob = excluded.blob,
                updated_at = excluded.updated_at;",
            params![slot, blob],
        )?;
        Ok(())
    }

    fn remove(&self, slot: &str) -> SlotResult<()> {
        let conn = self.conn.lock().map_err(|_| SlotError::LockPoisoned)?;
        conn.execute("DELETE FROM slots WHERE name = ?1;", params![slot])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteSlotStore;
    use crate::slot::SlotStore;

    #[test]
    fn upsert_keeps_one_row_per_slot() {
        let store = SqliteSlotStore::open_in_memory().unwrap();
        store.write("emergencyContacts", &[1, 2, 3]).unwrap();
        store.write("emergencyContacts", &[4, 5]).unwrap();
        store.write("moodEntries", &[9]).unwrap();

        assert_eq!(
            store.read("emergencyContacts").unwrap(),
            Some(vec![4, 5])
        );
        assert_eq!(
            store.slot_names().unwrap(),
            vec!["emergencyContacts".to_string(), "moodEntries".to_string()]
        );
    }

    #[test]
    fn remove_clears_only_target_slot() {
        let store = SqliteSlotStore::open_in_memory().unwrap();
        store.write("moodEntries", &[1]).unwrap();
        store.write("parentalSharingSettings", &[2]).unwrap();

        store.remove("moodEntries").unwrap();
        store.remove("moodEntries").unwrap();

        assert!(store.read("moodEntries").unwrap().is_none());
        assert_eq!(store.read("parentalSharingSettings").unwrap(), Some(vec![2]));
    }
}
