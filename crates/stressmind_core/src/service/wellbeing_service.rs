//! Collaborator-facing wellbeing service.
//!
//! # Responsibility
//! - Wire key sourcing, encrypted slots and repositories into one handle.
//! - Expose list/add/update/delete for moods and contacts, sharing
//!   settings, analytics, export and full data deletion.
//!
//! # Invariants
//! - Construction sources the encryption key eagerly; a missing or
//!   unreadable key fails `open` instead of surfacing on first write.
//! - Analytics always read the current repository snapshot.

use crate::analytics::{self, EmergencyAlert, MoodSummary, Timeframe};
use crate::config::CoreConfig;
use crate::crypto::{CredentialStore, EncryptedStore, FileCredentialStore, KeyError, KeyStore};
use crate::db::DbError;
use crate::error::ErrorKind;
use crate::model::contact::{ContactId, EmergencyContact};
use crate::model::mood::{EntryId, MoodEntry};
use crate::model::sharing::{ParentalSharingSettings, SharedContact};
use crate::repo::{
    ContactRepository, LoadIssue, MoodRepository, RepoError, RepoResult, SharingSettingsStore,
};
use crate::slot::{SlotStore, SqliteSlotStore};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure while opening the service.
#[derive(Debug)]
pub enum ServiceError {
    Io(std::io::Error),
    Db(DbError),
    KeyUnavailable(KeyError),
    Repo(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::PersistWriteFailed,
            Self::Db(_) => ErrorKind::PersistReadFailed,
            Self::KeyUnavailable(_) => ErrorKind::KeyUnavailable,
            Self::Repo(err) => err.kind(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to prepare data directory: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::KeyUnavailable(err) => write!(f, "encryption key unavailable: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::KeyUnavailable(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<KeyError> for ServiceError {
    fn from(value: KeyError) -> Self {
        Self::KeyUnavailable(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Single entry point used by presentation layers.
pub struct WellbeingService {
    keys: Arc<KeyStore>,
    moods: MoodRepository,
    contacts: ContactRepository,
    sharing: SharingSettingsStore,
}

impl WellbeingService {
    /// Opens the on-disk service described by `config`.
    ///
    /// Creates `data_dir` when missing, opens the SQLite slot database and
    /// keeps the key under `credential_dir()`.
    pub fn open(config: &CoreConfig) -> ServiceResult<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let slots = SqliteSlotStore::open(config.db_path())?;
        let credentials = FileCredentialStore::new(config.credential_dir());
        Self::with_backends(Arc::new(credentials), Arc::new(slots))
    }

    /// Opens the service over explicit credential and slot backends.
    ///
    /// # Errors
    /// - `KeyUnavailable` when the key can be neither read nor created.
    /// - `Repo` only for the same fatal key condition seen during loading.
    pub fn with_backends(
        credentials: Arc<dyn CredentialStore>,
        slots: Arc<dyn SlotStore>,
    ) -> ServiceResult<Self> {
        let started_at = Instant::now();
        let keys = Arc::new(KeyStore::new(credentials));
        if let Err(err) = keys.get_or_create_key() {
            error!(
                "event=service_open module=service status=error error_code={}",
                ErrorKind::KeyUnavailable
            );
            return Err(err.into());
        }

        let store = Arc::new(EncryptedStore::new(keys.clone(), slots));
        let moods = MoodRepository::open(store.clone())?;
        let contacts = ContactRepository::open(store.clone())?;
        let sharing = SharingSettingsStore::open(store)?;

        let service = Self {
            keys,
            moods,
            contacts,
            sharing,
        };
        info!(
            "event=service_open module=service status=ok moods={} contacts={} load_issues={} duration_ms={}",
            service.moods.len(),
            service.contacts.len(),
            service.load_issues().len(),
            started_at.elapsed().as_millis()
        );
        Ok(service)
    }

    pub fn key_account(&self) -> &str {
        self.keys.account()
    }

    /// Load-time diagnostics of every repository that started empty.
    pub fn load_issues(&self) -> Vec<LoadIssue> {
        [
            self.moods.load_issue(),
            self.contacts.load_issue(),
            self.sharing.load_issue(),
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }

    pub fn moods(&self) -> &MoodRepository {
        &self.moods
    }

    pub fn contacts(&self) -> &ContactRepository {
        &self.contacts
    }

    pub fn sharing(&self) -> &SharingSettingsStore {
        &self.sharing
    }

    /// Newest-first.
    pub fn list_mood_entries(&self) -> Vec<MoodEntry> {
        self.moods.list()
    }

    pub fn add_mood_entry(&self, entry: MoodEntry) -> RepoResult<EntryId> {
        self.moods.add(entry)
    }

    pub fn update_mood_entry(&self, entry: MoodEntry) -> RepoResult<()> {
        self.moods.update(entry)
    }

    /// Edits one entry in place without racing other writers.
    pub fn modify_mood_entry<F>(&self, id: EntryId, edit: F) -> RepoResult<()>
    where
        F: FnOnce(&mut MoodEntry),
    {
        self.moods.modify(id, edit)
    }

    pub fn delete_mood_entry(&self, id: EntryId) -> RepoResult<bool> {
        self.moods.delete(id)
    }

    /// Insertion order.
    pub fn list_contacts(&self) -> Vec<EmergencyContact> {
        self.contacts.list()
    }

    pub fn add_contact(&self, contact: EmergencyContact) -> RepoResult<ContactId> {
        self.contacts.add(contact)
    }

    pub fn update_contact(&self, contact: EmergencyContact) -> RepoResult<()> {
        self.contacts.update(contact)
    }

    pub fn modify_contact<F>(&self, id: ContactId, edit: F) -> RepoResult<()>
    where
        F: FnOnce(&mut EmergencyContact),
    {
        self.contacts.modify(id, edit)
    }

    pub fn delete_contact(&self, id: ContactId) -> RepoResult<bool> {
        self.contacts.delete(id)
    }

    pub fn get_sharing_settings(&self) -> ParentalSharingSettings {
        self.sharing.get()
    }

    pub fn set_sharing_settings(&self, settings: ParentalSharingSettings) -> RepoResult<()> {
        self.sharing.set(settings)
    }

    pub fn enable_sharing(&self, contact: SharedContact) -> RepoResult<()> {
        self.sharing.enable_sharing(contact, Utc::now())
    }

    pub fn disable_sharing(&self) -> RepoResult<()> {
        self.sharing.disable_sharing()
    }

    pub fn summarize_mood(&self, timeframe: Timeframe) -> MoodSummary {
        self.summarize_mood_at(timeframe, Utc::now())
    }

    pub fn summarize_mood_at(&self, timeframe: Timeframe, now: DateTime<Utc>) -> MoodSummary {
        analytics::summarize_at(&self.moods.list(), timeframe, now)
    }

    /// Parent-facing summary text; never contains notes.
    pub fn shareable_summary(&self, timeframe: Timeframe) -> String {
        self.summarize_mood(timeframe).shareable_text()
    }

    pub fn check_emergency_trigger(&self) -> Option<EmergencyAlert> {
        self.check_emergency_trigger_at(Utc::now())
    }

    pub fn check_emergency_trigger_at(&self, now: DateTime<Utc>) -> Option<EmergencyAlert> {
        let alert =
            analytics::check_emergency_trigger_at(&self.moods.list(), self.sharing.is_enabled(), now);
        if let Some(alert) = &alert {
            info!(
                "event=emergency_check module=service status=ok triggered=true reason={}",
                alert.reason.code()
            );
        }
        alert
    }

    /// Human-readable dump of every decrypted record.
    pub fn export_all_data(&self) -> String {
        self.export_all_data_at(Utc::now())
    }

    pub fn export_all_data_at(&self, now: DateTime<Utc>) -> String {
        let moods = self.moods.list();
        let contacts = self.contacts.list();
        let sharing = self.sharing.get();

        let mut export = String::from("StressMind Data Export\n");
        export.push_str(&format!("Generated: {}\n\n", rfc3339(now)));

        export.push_str("=== Mood Entries ===\n");
        for entry in &moods {
            export.push_str(&format!(
                "{}: {} - {}\n",
                rfc3339(entry.timestamp),
                entry.mood.label(),
                entry.note
            ));
            if !entry.tags.is_empty() {
                export.push_str(&format!("  Tags: {}\n", entry.tags.join(", ")));
            }
        }

        export.push_str("\n=== Emergency Contacts ===\n");
        for contact in &contacts {
            export.push_str(&format!(
                "{} ({}): {}\n",
                contact.name, contact.relationship, contact.phone_number
            ));
        }

        export.push_str("\n=== Parental Sharing ===\n");
        export.push_str(&format!(
            "Enabled: {}\n",
            if sharing.enabled { "yes" } else { "no" }
        ));
        if let Some(enabled_at) = sharing.enabled_at {
            export.push_str(&format!("Enabled at: {}\n", rfc3339(enabled_at)));
        }
        for contact in &sharing.shared_with {
            export.push_str(&format!(
                "Shared with: {} ({}) via {}\n",
                contact.name,
                contact.relationship,
                contact.share_method.label()
            ));
        }

        info!(
            "event=data_export module=service status=ok moods={} contacts={}",
            moods.len(),
            contacts.len()
        );
        export
    }

    /// Clears mood entries and contacts in memory and on disk.
    ///
    /// Sharing settings are left untouched. Both collections are cleared
    /// even if the first one fails; the first error is returned.
    pub fn delete_all_data(&self) -> RepoResult<()> {
        let moods = self.moods.clear();
        let contacts = self.contacts.clear();
        match (&moods, &contacts) {
            (Ok(()), Ok(())) => info!("event=data_delete_all module=service status=ok"),
            _ => error!("event=data_delete_all module=service status=error"),
        }
        moods.and(contacts)
    }
}

fn rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}
