//! Single long-lived symmetric key sourced from a `CredentialStore`.
//!
//! # Responsibility
//! - Load the 256-bit key saved under a fixed account, or generate and save
//!   one on first use.
//! - Cache the key for the process lifetime.
//!
//! # Invariants
//! - Every call after the first successful one returns the same key.
//! - There is no fallback to an unprotected key: a failing credential store
//!   is `KeyUnavailable`.
//! - Losing the stored key makes every sealed slot unrecoverable. No escrow.

use super::credential::{CredentialError, CredentialStore};
use log::{error, info};
use once_cell::sync::OnceCell;
use rand::rngs::OsRng;
use rand::RngCore;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use zeroize::Zeroize;

/// Account under which the key is kept in the credential store.
pub const KEY_ACCOUNT: &str = "com.stressmind.encryptionKey";
pub const KEY_LEN: usize = 32;

pub type KeyResult<T> = Result<T, KeyError>;

/// Key sourcing failure. Always classified as `ErrorKind::KeyUnavailable`.
#[derive(Debug)]
pub enum KeyError {
    /// Credential store could not be read or written.
    Store(CredentialError),
    /// Stored key has the wrong length.
    Malformed { len: usize },
}

impl Display for KeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "encryption key unavailable: {err}"),
            Self::Malformed { len } => write!(
                f,
                "encryption key unavailable: stored key is {len} bytes, expected {KEY_LEN}"
            ),
        }
    }
}

impl Error for KeyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Malformed { .. } => None,
        }
    }
}

impl From<CredentialError> for KeyError {
    fn from(value: CredentialError) -> Self {
        Self::Store(value)
    }
}

/// 256-bit AES key. Zeroized on drop; bytes are crate-private.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    fn from_slice(raw: &[u8]) -> KeyResult<Self> {
        if raw.len() != KEY_LEN {
            return Err(KeyError::Malformed { len: raw.len() });
        }
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(raw);
        Ok(Self(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Debug for SymmetricKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Owner of the process-wide encryption key.
pub struct KeyStore {
    credentials: Arc<dyn CredentialStore>,
    account: String,
    cached: OnceCell<SymmetricKey>,
}

impl KeyStore {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self::with_account(credentials, KEY_ACCOUNT)
    }

    /// Uses a caller-chosen account. Intended for isolated profiles and tests.
    pub fn with_account(credentials: Arc<dyn CredentialStore>, account: impl Into<String>) -> Self {
        Self {
            credentials,
            account: account.into(),
            cached: OnceCell::new(),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Returns the cached key, loading or generating it on first call.
    ///
    /// # Errors
    /// - `KeyError::Store` when the credential store fails.
    /// - `KeyError::Malformed` when the stored key has the wrong length.
    pub fn get_or_create_key(&self) -> KeyResult<&SymmetricKey> {
        self.cached.get_or_try_init(|| self.load_or_generate())
    }

    fn load_or_generate(&self) -> KeyResult<SymmetricKey> {
        match self.credentials.load(&self.account) {
            Ok(Some(mut raw)) => {
                let key = SymmetricKey::from_slice(&raw);
                raw.zeroize();
                match key {
                    Ok(key) => {
                        info!("event=key_load module=crypto status=ok source=credential_store");
                        Ok(key)
                    }
                    Err(err) => {
                        error!(
                            "event=key_load module=crypto status=error error_code=key_malformed error={}",
                            err
                        );
                        Err(err)
                    }
                }
            }
            Ok(None) => {
                let key = SymmetricKey::generate();
                if let Err(err) = self.credentials.save(&self.account, key.as_bytes()) {
                    error!(
                        "event=key_create module=crypto status=error error_code=key_save_failed error={}",
                        err
                    );
                    return Err(err.into());
                }
                info!("event=key_create module=crypto status=ok");
                Ok(key)
            }
            Err(err) => {
                error!(
                    "event=key_load module=crypto status=error error_code=credential_store_unavailable error={}",
                    err
                );
                Err(err.into())
            }
        }
    }
}
