//! Persisted key-value namespace holding one opaque blob per slot.
//!
//! # Responsibility
//! - Define the `SlotStore` capability used by `EncryptedStore`.
//! - Name the fixed slots the core persists into.
//!
//! # Invariants
//! - A slot holds at most one blob; `write` replaces it in a single step.
//! - Backends never interpret blob contents.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemorySlotStore;
pub use sqlite::SqliteSlotStore;

pub type SlotResult<T> = Result<T, SlotError>;

/// Named persisted storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotId {
    MoodEntries,
    EmergencyContacts,
    ParentalSharingSettings,
}

impl SlotId {
    pub const ALL: [SlotId; 3] = [
        SlotId::MoodEntries,
        SlotId::EmergencyContacts,
        SlotId::ParentalSharingSettings,
    ];

    /// Stable storage key. Changing these strands existing data.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MoodEntries => "moodEntries",
            Self::EmergencyContacts => "emergencyContacts",
            Self::ParentalSharingSettings => "parentalSharingSettings",
        }
    }
}

impl Display for SlotId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage backend failure.
#[derive(Debug)]
pub enum SlotError {
    Db(DbError),
    LockPoisoned,
}

impl Display for SlotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::LockPoisoned => write!(f, "slot store lock poisoned"),
        }
    }
}

impl Error for SlotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::LockPoisoned => None,
        }
    }
}

impl From<DbError> for SlotError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SlotError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Settings-style blob storage keyed by slot name.
pub trait SlotStore: Send + Sync {
    /// Returns the blob at `slot`, or `None` when nothing was ever written.
    fn read(&self, slot: &str) -> SlotResult<Option<Vec<u8>>>;
    /// Replaces the blob at `slot`.
    fn write(&self, slot: &str, blob: &[u8]) -> SlotResult<()>;
    /// Deletes the blob at `slot`. Removing an empty slot is not an error.
    fn remove(&self, slot: &str) -> SlotResult<()>;
}

#[cfg(test)]
mod tests {
    use super::SlotId;
    use std::collections::HashSet;

    #[test]
    fn slot_names_are_stable_and_unique() {
        assert_eq!(SlotId::MoodEntries.as_str(), "moodEntries");
        assert_eq!(SlotId::EmergencyContacts.as_str(), "emergencyContacts");
        assert_eq!(
            SlotId::ParentalSharingSettings.as_str(),
            "parentalSharingSettings"
        );
        let names: HashSet<_> = SlotId::ALL.iter().map(|slot| slot.as_str()).collect();
        assert_eq!(names.len(), SlotId::ALL.len());
    }
}
