//! Authenticated encryption of whole record collections into slots.
//!
//! # Responsibility
//! - Serialize a value into a versioned JSON envelope, seal it with
//!   AES-256-GCM and write `nonce || ciphertext || tag` into a slot.
//! - Read, verify, decrypt and decode the same blob back.
//!
//! # Invariants
//! - A fresh random 96-bit nonce is drawn for every `save`.
//! - The slot name is bound as associated data; a blob copied into another
//!   slot fails authentication.
//! - Authentication failures are `DecryptionFailed`; a verified plaintext
//!   that does not decode is `DecodingFailed`. The two never overlap.
//! - No plaintext outlives a single call.

use super::key_store::{KeyError, KeyStore};
use crate::error::ErrorKind;
use crate::slot::{SlotError, SlotId, SlotStore};
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use log::{debug, warn};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use zeroize::Zeroize;

/// Plaintext envelope version written by this binary.
pub const ENVELOPE_SCHEMA_VERSION: u32 = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

pub type PersistResult<T> = Result<T, PersistError>;

#[derive(Debug)]
pub enum PersistError {
    KeyUnavailable(KeyError),
    DecryptionFailed {
        slot: SlotId,
    },
    DecodingFailed {
        slot: SlotId,
        reason: String,
    },
    /// Value could not be serialized or sealed; nothing was written.
    EncodingFailed {
        slot: SlotId,
        reason: String,
    },
    PersistReadFailed {
        slot: SlotId,
        source: SlotError,
    },
    PersistWriteFailed {
        slot: SlotId,
        source: SlotError,
    },
}

impl PersistError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::KeyUnavailable(_) => ErrorKind::KeyUnavailable,
            Self::DecryptionFailed { .. } => ErrorKind::DecryptionFailed,
            Self::DecodingFailed { .. } => ErrorKind::DecodingFailed,
            Self::EncodingFailed { .. } | Self::PersistWriteFailed { .. } => {
                ErrorKind::PersistWriteFailed
            }
            Self::PersistReadFailed { .. } => ErrorKind::PersistReadFailed,
        }
    }
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeyUnavailable(err) => write!(f, "{err}"),
            Self::DecryptionFailed { slot } => {
                write!(f, "slot `{slot}` failed authentication (tampered data or wrong key)")
            }
            Self::DecodingFailed { slot, reason } => {
                write!(f, "slot `{slot}` decrypted but did not decode: {reason}")
            }
            Self::EncodingFailed { slot, reason } => {
                write!(f, "slot `{slot}` value could not be sealed: {reason}")
            }
            Self::PersistReadFailed { slot, source } => {
                write!(f, "slot `{slot}` could not be read: {source}")
            }
            Self::PersistWriteFailed { slot, source } => {
                write!(f, "slot `{slot}` could not be written: {source}")
            }
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::KeyUnavailable(err) => Some(err),
            Self::PersistReadFailed { source, .. } | Self::PersistWriteFailed { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

impl From<KeyError> for PersistError {
    fn from(value: KeyError) -> Self {
        Self::KeyUnavailable(value)
    }
}

#[derive(Serialize)]
struct EnvelopeOut<'a, T> {
    schema_version: u32,
    payload: &'a T,
}

#[derive(Deserialize)]
struct EnvelopeVersion {
    schema_version: u32,
}

#[derive(Deserialize)]
struct EnvelopeIn<T> {
    payload: T,
}

/// Seals serializable values into named slots with the `KeyStore` key.
pub struct EncryptedStore {
    keys: Arc<KeyStore>,
    slots: Arc<dyn SlotStore>,
}

impl EncryptedStore {
    pub fn new(keys: Arc<KeyStore>, slots: Arc<dyn SlotStore>) -> Self {
        Self { keys, slots }
    }

    /// Serializes, seals and writes `value` into `slot`, replacing any
    /// previous blob in one write.
    pub fn save<T: Serialize>(&self, slot: SlotId, value: &T) -> PersistResult<()> {
        let mut plaintext = serde_json::to_vec(&EnvelopeOut {
            schema_version: ENVELOPE_SCHEMA_VERSION,
            payload: value,
        })
        .map_err(|err| PersistError::EncodingFailed {
            slot,
            reason: err.to_string(),
        })?;

        let sealed = self.seal(slot, &plaintext);
        plaintext.zeroize();
        let blob = sealed?;

        self.slots.write(slot.as_str(), &blob).map_err(|source| {
            warn!(
                "event=slot_save module=crypto status=error slot={} error_code=persist_write_failed error={}",
                slot, source
            );
            PersistError::PersistWriteFailed { slot, source }
        })?;
        debug!(
            "event=slot_save module=crypto status=ok slot={} blob_bytes={}",
            slot,
            blob.len()
        );
        Ok(())
    }

    /// Reads and opens `slot`. An empty slot is `Ok(None)`, not an error.
    pub fn load<T: DeserializeOwned>(&self, slot: SlotId) -> PersistResult<Option<T>> {
        let blob = self
            .slots
            .read(slot.as_str())
            .map_err(|source| PersistError::PersistReadFailed { slot, source })?;
        let Some(blob) = blob else {
            debug!("event=slot_load module=crypto status=ok slot={} present=false", slot);
            return Ok(None);
        };

        let mut plaintext = self.open(slot, &blob)?;
        let decoded = decode_envelope::<T>(slot, &plaintext);
        plaintext.zeroize();
        let value = decoded?;
        debug!(
            "event=slot_load module=crypto status=ok slot={} present=true blob_bytes={}",
            slot,
            blob.len()
        );
        Ok(Some(value))
    }

    /// Deletes the blob at `slot`.
    pub fn remove(&self, slot: SlotId) -> PersistResult<()> {
        self.slots
            .remove(slot.as_str())
            .map_err(|source| PersistError::PersistWriteFailed { slot, source })
    }

    fn cipher(&self) -> PersistResult<Aes256Gcm> {
        let key = self.keys.get_or_create_key()?;
        Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes())))
    }

    fn seal(&self, slot: SlotId, plaintext: &[u8]) -> PersistResult<Vec<u8>> {
        let cipher = self.cipher()?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad: slot.as_str().as_bytes(),
                },
            )
            .map_err(|_| PersistError::EncodingFailed {
                slot,
                reason: "aead seal failed".to_string(),
            })?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    fn open(&self, slot: SlotId, blob: &[u8]) -> PersistResult<Vec<u8>> {
        if blob.len() < NONCE_LEN + TAG_LEN {
            warn!(
                "event=slot_load module=crypto status=error slot={} error_code=decryption_failed reason=truncated blob_bytes={}",
                slot,
                blob.len()
            );
            return Err(PersistError::DecryptionFailed { slot });
        }
        let cipher = self.cipher()?;
        let (nonce, sealed) = blob.split_at(NONCE_LEN);
        cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: slot.as_str().as_bytes(),
                },
            )
            .map_err(|_| {
                warn!(
                    "event=slot_load module=crypto status=error slot={} error_code=decryption_failed",
                    slot
                );
                PersistError::DecryptionFailed { slot }
            })
    }
}

fn decode_envelope<T: DeserializeOwned>(slot: SlotId, plaintext: &[u8]) -> PersistResult<T> {
    let decoding_failed = |reason: String| {
        warn!(
            "event=slot_load module=crypto status=error slot={} error_code=decoding_failed",
            slot
        );
        PersistError::DecodingFailed { slot, reason }
    };

    let header: EnvelopeVersion =
        serde_json::from_slice(plaintext).map_err(|err| decoding_failed(err.to_string()))?;
    if header.schema_version > ENVELOPE_SCHEMA_VERSION {
        return Err(decoding_failed(format!(
            "envelope schema version {} is newer than supported {}",
            header.schema_version, ENVELOPE_SCHEMA_VERSION
        )));
    }

    let envelope: EnvelopeIn<T> =
        serde_json::from_slice(plaintext).map_err(|err| decoding_failed(err.to_string()))?;
    Ok(envelope.payload)
}

#[cfg(test)]
mod tests {
    use super::{EncryptedStore, PersistError, ENVELOPE_SCHEMA_VERSION, NONCE_LEN};
    use crate::crypto::credential::MemoryCredentialStore;
    use crate::crypto::key_store::KeyStore;
    use crate::slot::{MemorySlotStore, SlotId, SlotStore};
    use std::sync::Arc;

    fn store_with_slots() -> (EncryptedStore, Arc<MemorySlotStore>) {
        let slots = Arc::new(MemorySlotStore::new());
        let keys = Arc::new(KeyStore::new(Arc::new(MemoryCredentialStore::new())));
        (EncryptedStore::new(keys, slots.clone()), slots)
    }

    #[test]
    fn blob_layout_is_nonce_then_ciphertext_and_tag() {
        let (store, slots) = store_with_slots();
        store
            .save(SlotId::MoodEntries, &vec!["calm".to_string()])
            .unwrap();
        let blob = slots.read("moodEntries").unwrap().unwrap();
        let plaintext_len = serde_json::to_vec(&serde_json::json!({
            "schema_version": ENVELOPE_SCHEMA_VERSION,
            "payload": ["calm"],
        }))
        .unwrap()
        .len();
        assert_eq!(blob.len(), NONCE_LEN + plaintext_len + 16);
        assert!(!String::from_utf8_lossy(&blob).contains("calm"));
    }

    #[test]
    fn nonces_differ_between_saves_of_same_value() {
        let (store, slots) = store_with_slots();
        store.save(SlotId::MoodEntries, &1u32).unwrap();
        let first = slots.read("moodEntries").unwrap().unwrap();
        store.save(SlotId::MoodEntries, &1u32).unwrap();
        let second = slots.read("moodEntries").unwrap().unwrap();
        assert_ne!(first[..NONCE_LEN], second[..NONCE_LEN]);
    }

    #[test]
    fn truncated_blob_is_decryption_failure() {
        let (store, slots) = store_with_slots();
        slots.write("moodEntries", &[0u8; 10]).unwrap();
        let err = store.load::<Vec<String>>(SlotId::MoodEntries).unwrap_err();
        assert!(matches!(err, PersistError::DecryptionFailed { .. }));
    }

    #[test]
    fn newer_envelope_version_is_decoding_failure() {
        let (store, _slots) = store_with_slots();
        let plaintext = serde_json::to_vec(&serde_json::json!({
            "schema_version": ENVELOPE_SCHEMA_VERSION + 1,
            "payload": [],
        }))
        .unwrap();
        let blob = store.seal(SlotId::MoodEntries, &plaintext).unwrap();
        let opened = store.open(SlotId::MoodEntries, &blob).unwrap();
        let err = super::decode_envelope::<Vec<String>>(SlotId::MoodEntries, &opened)
            .unwrap_err();
        assert!(matches!(err, PersistError::DecodingFailed { .. }));
    }
}
