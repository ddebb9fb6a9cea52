//! Ordered record collections persisted as one encrypted blob.
//!
//! # Responsibility
//! - Provide list/get/add/update/delete over an in-memory `Vec`.
//! - Re-encrypt and write the full collection after each mutation.
//!
//! # Invariants
//! - Mood entries are prepended (newest-first); contacts are appended.
//! - Ids are unique within a collection; `add` rejects a taken id.
//! - `update` and `modify` keep the record's position.
//! - `delete` of an unknown id is a successful no-op without a write.

use super::observer::{ObserverRegistry, SubscriptionId};
use super::{load_or_default, LoadIssue, RepoError, RepoResult};
use crate::crypto::EncryptedStore;
use crate::model::contact::EmergencyContact;
use crate::model::mood::MoodEntry;
use crate::model::ValidationError;
use crate::slot::SlotId;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Where `add` inserts a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Front,
    Back,
}

/// A record type stored in its own slot.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const SLOT: SlotId;
    const PLACEMENT: Placement;

    fn id(&self) -> Uuid;
    fn set_id(&mut self, id: Uuid);
    /// Normalizes and validates caller input before it is stored.
    fn prepare(&mut self) -> Result<(), ValidationError>;
}

impl Record for MoodEntry {
    const SLOT: SlotId = SlotId::MoodEntries;
    const PLACEMENT: Placement = Placement::Front;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn prepare(&mut self) -> Result<(), ValidationError> {
        self.normalize();
        Ok(())
    }
}

impl Record for EmergencyContact {
    const SLOT: SlotId = SlotId::EmergencyContacts;
    const PLACEMENT: Placement = Placement::Back;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn prepare(&mut self) -> Result<(), ValidationError> {
        self.validate()
    }
}

pub type MoodRepository = CollectionRepository<MoodEntry>;
pub type ContactRepository = CollectionRepository<EmergencyContact>;

pub struct CollectionRepository<T: Record> {
    store: Arc<EncryptedStore>,
    items: Mutex<Vec<T>>,
    observers: ObserverRegistry<[T]>,
    load_issue: Option<LoadIssue>,
}

impl<T: Record> CollectionRepository<T> {
    /// Loads the collection from its slot.
    ///
    /// A missing, undecryptable or undecodable slot yields an empty
    /// collection; see `load_issue`.
    ///
    /// # Errors
    /// - `KeyUnavailable` when the encryption key cannot be sourced.
    /// - `PersistReadFailed` when the slot backend cannot be read.
    pub fn open(store: Arc<EncryptedStore>) -> RepoResult<Self> {
        let (items, load_issue) = load_or_default::<Vec<T>>(&store, T::SLOT)?;
        Ok(Self {
            store,
            items: Mutex::new(items),
            observers: ObserverRegistry::new(),
            load_issue,
        })
    }

    /// Diagnostic recorded when construction fell back to an empty list.
    pub fn load_issue(&self) -> Option<&LoadIssue> {
        self.load_issue.as_ref()
    }

    /// Current snapshot in collection order.
    pub fn list(&self) -> Vec<T> {
        self.lock_items().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<T> {
        self.lock_items().iter().find(|item| item.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock_items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts `item` and persists the collection.
    ///
    /// A nil id is replaced by a fresh one. On a write failure the record
    /// stays in memory and the error is returned.
    ///
    /// # Errors
    /// - `Validation(DuplicateId)` when a record with the same id exists;
    ///   nothing is written.
    pub fn add(&self, mut item: T) -> RepoResult<Uuid> {
        item.prepare()?;
        if item.id().is_nil() {
            item.set_id(Uuid::new_v4());
        }
        let id = item.id();

        self.mutate("add", |items| {
            if items.iter().any(|existing| existing.id() == id) {
                return Err(ValidationError::DuplicateId(id).into());
            }
            match T::PLACEMENT {
                Placement::Front => items.insert(0, item),
                Placement::Back => items.push(item),
            }
            Ok(true)
        })?;
        Ok(id)
    }

    /// Replaces the record with the same id in place.
    ///
    /// # Errors
    /// - `NotFound` when no record has `item.id()`; nothing is written.
    pub fn update(&self, mut item: T) -> RepoResult<()> {
        item.prepare()?;
        let id = item.id();
        self.mutate("update", |items| {
            let slot = items
                .iter_mut()
                .find(|existing| existing.id() == id)
                .ok_or(RepoError::NotFound(id))?;
            *slot = item;
            Ok(true)
        })?;
        Ok(())
    }

    /// Edits the record with `id` under the collection lock.
    ///
    /// `edit` works on a copy; the result keeps the original id and position
    /// and goes through the same `prepare` step as `add`.
    ///
    /// # Errors
    /// - `NotFound` when no record has `id`; nothing is written.
    /// - `Validation` when the edited copy is rejected; the stored record is
    ///   left as it was.
    pub fn modify<F>(&self, id: Uuid, edit: F) -> RepoResult<()>
    where
        F: FnOnce(&mut T),
    {
        self.mutate("modify", |items| {
            let slot = items
                .iter_mut()
                .find(|existing| existing.id() == id)
                .ok_or(RepoError::NotFound(id))?;
            let mut edited = slot.clone();
            edit(&mut edited);
            edited.set_id(id);
            edited.prepare()?;
            *slot = edited;
            Ok(true)
        })?;
        Ok(())
    }

    /// Removes the record with `id`. Returns whether anything was removed.
    pub fn delete(&self, id: Uuid) -> RepoResult<bool> {
        self.mutate("delete", |items| {
            let before = items.len();
            items.retain(|item| item.id() != id);
            Ok(items.len() != before)
        })
    }

    /// Empties the collection and deletes its slot.
    pub fn clear(&self) -> RepoResult<()> {
        let result = {
            let mut items = self.lock_items();
            items.clear();
            let result = self.store.remove(T::SLOT);
            self.observers.stage(Vec::new());
            result
        };
        self.observers.flush();
        match result {
            Ok(()) => {
                info!("event=repo_clear module=repo status=ok slot={}", T::SLOT);
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=repo_clear module=repo status=error slot={} error_code={}",
                    T::SLOT,
                    err.kind()
                );
                Err(err.into())
            }
        }
    }

    /// Registers a callback receiving each new snapshot.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&[T]) + Send + Sync + 'static,
    {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Applies `change` under the collection lock and persists when it
    /// reports a change. The snapshot is staged before the lock is released
    /// and delivered after.
    fn mutate<F>(&self, op: &'static str, change: F) -> RepoResult<bool>
    where
        F: FnOnce(&mut Vec<T>) -> RepoResult<bool>,
    {
        let (persisted, count) = {
            let mut items = self.lock_items();
            if !change(&mut *items)? {
                return Ok(false);
            }
            let persisted = self.store.save(T::SLOT, &*items);
            self.observers.stage(items.clone());
            (persisted, items.len())
        };

        self.observers.flush();
        match persisted {
            Ok(()) => {
                info!(
                    "event=repo_{} module=repo status=ok slot={} count={}",
                    op,
                    T::SLOT,
                    count
                );
                Ok(true)
            }
            Err(err) => {
                warn!(
                    "event=repo_{} module=repo status=error slot={} error_code={} in_memory=kept",
                    op,
                    T::SLOT,
                    err.kind()
                );
                Err(err.into())
            }
        }
    }

    fn lock_items(&self) -> MutexGuard<'_, Vec<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{ContactRepository, MoodRepository};
    use crate::crypto::{EncryptedStore, KeyStore, MemoryCredentialStore};
    use crate::model::contact::EmergencyContact;
    use crate::model::mood::{MoodCategory, MoodEntry};
    use crate::model::ValidationError;
    use crate::repo::RepoError;
    use crate::slot::MemorySlotStore;
    use std::sync::Arc;
    use uuid::Uuid;

    fn encrypted_store() -> Arc<EncryptedStore> {
        Arc::new(EncryptedStore::new(
            Arc::new(KeyStore::new(Arc::new(MemoryCredentialStore::new()))),
            Arc::new(MemorySlotStore::new()),
        ))
    }

    #[test]
    fn nil_id_is_replaced_on_add() {
        let repo = MoodRepository::open(encrypted_store()).unwrap();
        let mut entry = MoodEntry::new(MoodCategory::Okay, "", Vec::new());
        entry.id = Uuid::nil();

        let id = repo.add(entry).unwrap();
        assert!(!id.is_nil());
        assert_eq!(repo.list()[0].id, id);
    }

    #[test]
    fn taken_id_is_rejected_on_add() {
        let repo = MoodRepository::open(encrypted_store()).unwrap();
        let first = repo
            .add(MoodEntry::new(MoodCategory::Happy, "first", Vec::new()))
            .unwrap();

        let mut copy = MoodEntry::new(MoodCategory::Sad, "copy", Vec::new());
        copy.id = first;
        let err = repo.add(copy).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ValidationError::DuplicateId(id)) if id == first
        ));
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.get(first).unwrap().note, "first");
    }

    #[test]
    fn contacts_append_and_reject_invalid_input() {
        let repo = ContactRepository::open(encrypted_store()).unwrap();
        let first = repo
            .add(EmergencyContact::new("Mom", "Parent", "555-0100", None))
            .unwrap();
        let second = repo
            .add(EmergencyContact::new("Coach", "Mentor", "555-0111", None))
            .unwrap();
        let ids: Vec<_> = repo.list().iter().map(|contact| contact.id).collect();
        assert_eq!(ids, vec![first, second]);

        let err = repo
            .add(EmergencyContact::new("", "Parent", "555", None))
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
        assert_eq!(repo.len(), 2);
    }
}
