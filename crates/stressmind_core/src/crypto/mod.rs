//! Key lifecycle and authenticated encryption of persisted slots.
//!
//! # Responsibility
//! - Source the single long-lived 256-bit key from a `CredentialStore`.
//! - Seal/open whole record collections into opaque slot blobs.
//!
//! # Invariants
//! - Raw key bytes never leave this module tree.
//! - Every sealed blob uses a fresh random nonce.

pub mod credential;
pub mod encrypted_store;
pub mod key_store;

pub use credential::{
    CredentialError, CredentialResult, CredentialStore, FileCredentialStore,
    MemoryCredentialStore,
};
pub use encrypted_store::{EncryptedStore, PersistError, PersistResult};
pub use key_store::{KeyError, KeyResult, KeyStore, SymmetricKey, KEY_ACCOUNT};
