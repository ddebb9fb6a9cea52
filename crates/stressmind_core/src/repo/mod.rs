//! Repository layer over encrypted slots.
//!
//! # Responsibility
//! - Own the in-memory snapshot of each record collection.
//! - Persist the whole snapshot through `EncryptedStore` on every mutation.
//! - Publish new snapshots to observers.
//!
//! # Invariants
//! - Mutations are serialized per repository by one mutex guarding the
//!   collection and its slot write together.
//! - Load-time decryption/decoding failures fall back to the empty/default
//!   state and are kept as a `LoadIssue`. `KeyUnavailable` and
//!   `PersistReadFailed` abort, since a later write would replace a blob
//!   that may still be intact.
//! - Write failures are returned to the caller; the in-memory mutation is
//!   kept as the most recent view.

pub mod collection;
pub mod observer;
pub mod sharing_store;

use crate::crypto::{EncryptedStore, PersistError};
use crate::error::ErrorKind;
use crate::model::ValidationError;
use crate::slot::SlotId;
use log::{error, info};
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub use collection::{CollectionRepository, ContactRepository, MoodRepository, Placement, Record};
pub use observer::{ObserverRegistry, SubscriptionId};
pub use sharing_store::SharingSettingsStore;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    NotFound(Uuid),
    Validation(ValidationError),
    Persist(PersistError),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Persist(err) => err.kind(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Validation(err) => Some(err),
            Self::Persist(err) => Some(err),
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PersistError> for RepoError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

/// Diagnostic kept when a repository started from the default state because
/// its slot could not be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadIssue {
    pub slot: SlotId,
    pub kind: ErrorKind,
    pub message: String,
}

impl LoadIssue {
    pub(crate) fn from_error(slot: SlotId, err: &PersistError) -> Self {
        Self {
            slot,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Opens `slot`, falling back to `T::default()` when the stored blob cannot
/// be decrypted or decoded.
///
/// # Errors
/// - `PersistError::KeyUnavailable` and `PersistError::PersistReadFailed`
///   are returned; the remaining failures become a `LoadIssue`.
pub(crate) fn load_or_default<T>(
    store: &EncryptedStore,
    slot: SlotId,
) -> RepoResult<(T, Option<LoadIssue>)>
where
    T: DeserializeOwned + Default,
{
    match store.load::<T>(slot) {
        Ok(Some(value)) => {
            info!("event=repo_open module=repo status=ok slot={} present=true", slot);
            Ok((value, None))
        }
        Ok(None) => {
            info!("event=repo_open module=repo status=ok slot={} present=false", slot);
            Ok((T::default(), None))
        }
        Err(err @ (PersistError::KeyUnavailable(_) | PersistError::PersistReadFailed { .. })) => {
            error!(
                "event=repo_open module=repo status=error slot={} error_code={}",
                slot,
                err.kind()
            );
            Err(err.into())
        }
        Err(err) => {
            error!(
                "event=repo_open module=repo status=degraded slot={} error_code={} fallback=default",
                slot,
                err.kind()
            );
            Ok((T::default(), Some(LoadIssue::from_error(slot, &err))))
        }
    }
}
