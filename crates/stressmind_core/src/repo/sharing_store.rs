//! Singleton store for `ParentalSharingSettings`.
//!
//! # Invariants
//! - `get` always returns a value; an empty or unreadable slot yields the
//!   disabled default.
//! - Every `set` writes the whole record.
//! - Observers receive snapshots in mutation order; see `observer`.

use super::observer::{ObserverRegistry, SubscriptionId};
use super::{load_or_default, LoadIssue, RepoResult};
use crate::crypto::EncryptedStore;
use crate::model::sharing::{ParentalSharingSettings, SharedContact};
use crate::slot::SlotId;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const SLOT: SlotId = SlotId::ParentalSharingSettings;

pub struct SharingSettingsStore {
    store: Arc<EncryptedStore>,
    settings: Mutex<ParentalSharingSettings>,
    observers: ObserverRegistry<ParentalSharingSettings>,
    load_issue: Option<LoadIssue>,
}

impl SharingSettingsStore {
    /// Loads the settings record, defaulting when absent or unreadable.
    ///
    /// # Errors
    /// - `KeyUnavailable` when the encryption key cannot be sourced.
    /// - `PersistReadFailed` when the slot backend cannot be read.
    pub fn open(store: Arc<EncryptedStore>) -> RepoResult<Self> {
        let (settings, load_issue) = load_or_default::<ParentalSharingSettings>(&store, SLOT)?;
        Ok(Self {
            store,
            settings: Mutex::new(settings),
            observers: ObserverRegistry::new(),
            load_issue,
        })
    }

    pub fn load_issue(&self) -> Option<&LoadIssue> {
        self.load_issue.as_ref()
    }

    pub fn get(&self) -> ParentalSharingSettings {
        self.lock_settings().clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.lock_settings().enabled
    }

    /// Replaces the settings record and persists it.
    ///
    /// On a write failure the new settings stay in memory and the error is
    /// returned.
    pub fn set(&self, settings: ParentalSharingSettings) -> RepoResult<()> {
        for contact in &settings.shared_with {
            contact.validate()?;
        }
        self.replace("set", |current| *current = settings)
    }

    /// Enables sharing with exactly one contact, stamping `now`.
    pub fn enable_sharing(&self, contact: SharedContact, now: DateTime<Utc>) -> RepoResult<()> {
        contact.validate()?;
        self.replace("enable", |current| {
            *current = ParentalSharingSettings::enabled_with(contact, now)
        })
    }

    /// Disables sharing and forgets shared contacts.
    pub fn disable_sharing(&self) -> RepoResult<()> {
        self.replace("disable", ParentalSharingSettings::disable)
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ParentalSharingSettings) + Send + Sync + 'static,
    {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn replace<F>(&self, op: &'static str, change: F) -> RepoResult<()>
    where
        F: FnOnce(&mut ParentalSharingSettings),
    {
        let (persisted, enabled, shared_with) = {
            let mut settings = self.lock_settings();
            change(&mut *settings);
            let persisted = self.store.save(SLOT, &*settings);
            self.observers.stage(settings.clone());
            (persisted, settings.enabled, settings.shared_with.len())
        };

        self.observers.flush();
        match persisted {
            Ok(()) => {
                info!(
                    "event=sharing_{} module=repo status=ok enabled={} shared_with={}",
                    op, enabled, shared_with
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=sharing_{} module=repo status=error error_code={} in_memory=kept",
                    op,
                    err.kind()
                );
                Err(err.into())
            }
        }
    }

    fn lock_settings(&self) -> MutexGuard<'_, ParentalSharingSettings> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::SharingSettingsStore;
    use crate::crypto::{EncryptedStore, KeyStore, MemoryCredentialStore};
    use crate::model::sharing::{ShareMethod, SharedContact};
    use crate::repo::RepoError;
    use crate::slot::MemorySlotStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn open_store() -> SharingSettingsStore {
        let store = Arc::new(EncryptedStore::new(
            Arc::new(KeyStore::new(Arc::new(MemoryCredentialStore::new()))),
            Arc::new(MemorySlotStore::new()),
        ));
        SharingSettingsStore::open(store).unwrap()
    }

    #[test]
    fn enable_then_disable_round_trip() {
        let store = open_store();
        assert!(!store.is_enabled());

        let now = Utc.with_ymd_and_hms(2026, 5, 2, 18, 30, 0).unwrap();
        store
            .enable_sharing(SharedContact::new("Mom", "Parent", ShareMethod::Sms), now)
            .unwrap();
        let enabled = store.get();
        assert!(enabled.enabled);
        assert_eq!(enabled.enabled_at, Some(now));
        assert_eq!(enabled.shared_with.len(), 1);

        store.disable_sharing().unwrap();
        assert!(!store.is_enabled());
        assert!(store.get().shared_with.is_empty());
    }

    #[test]
    fn blank_shared_contact_name_is_rejected() {
        let store = open_store();
        let err = store
            .enable_sharing(
                SharedContact::new(" ", "Guardian", ShareMethod::Email),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
        assert!(!store.is_enabled());
    }
}
