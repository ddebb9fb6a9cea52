//! Process-local slot store.

use super::{SlotError, SlotResult, SlotStore};
use std::collections::HashMap;
use std::sync::Mutex;

/// Mutex-guarded in-memory slot map. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slots: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.lock().map(|slots| slots.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SlotStore for MemorySlotStore {
    fn read(&self, slot: &str) -> SlotResult<Option<Vec<u8>>> {
        let slots = self.slots.lock().map_err(|_| SlotError::LockPoisoned)?;
        Ok(slots.get(slot).cloned())
    }

    fn write(&self, slot: &str, blob: &[u8]) -> SlotResult<()> {
        let mut slots = self.slots.lock().map_err(|_| SlotError::LockPoisoned)?;
        slots.insert(slot.to_string(), blob.to_vec());
        Ok(())
    }

    fn remove(&self, slot: &str) -> SlotResult<()> {
        let mut slots = self.slots.lock().map_err(|_| SlotError::LockPoisoned)?;
        slots.remove(slot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemorySlotStore;
    use crate::slot::SlotStore;

    #[test]
    fn write_replaces_and_remove_is_idempotent() {
        let store = MemorySlotStore::new();
        assert!(store.read("moodEntries").unwrap().is_none());

        store.write("moodEntries", b"first").unwrap();
        store.write("moodEntries", b"second").unwrap();
        assert_eq!(store.read("moodEntries").unwrap().as_deref(), Some(&b"second"[..]));
        assert_eq!(store.len(), 1);

        store.remove("moodEntries").unwrap();
        store.remove("moodEntries").unwrap();
        assert!(store.is_empty());
    }
}
