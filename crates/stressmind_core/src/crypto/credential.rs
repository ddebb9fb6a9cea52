//! Secure credential store capability and backends.
//!
//! # Responsibility
//! - Abstract the platform keychain behind `save`/`load`.
//! - Provide an in-memory backend and a permission-restricted file backend.
//!
//! # Invariants
//! - Account names are restricted to `[A-Za-z0-9._-]` so they can be used
//!   as file names verbatim.
//! - File-backed credentials are written owner-read/write only on unix.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub type CredentialResult<T> = Result<T, CredentialError>;

#[derive(Debug)]
pub enum CredentialError {
    InvalidAccount(String),
    Io(std::io::Error),
    LockPoisoned,
}

impl Display for CredentialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAccount(account) => write!(f, "invalid credential account: `{account}`"),
            Self::Io(err) => write!(f, "credential store io error: {err}"),
            Self::LockPoisoned => write!(f, "credential store lock poisoned"),
        }
    }
}

impl Error for CredentialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CredentialError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Key-value secret storage with at-rest protection independent of the app.
pub trait CredentialStore: Send + Sync {
    /// Stores `bytes` under `account`, replacing any previous value.
    fn save(&self, account: &str, bytes: &[u8]) -> CredentialResult<()>;
    /// Returns the bytes stored under `account`, if any.
    fn load(&self, account: &str) -> CredentialResult<Option<Vec<u8>>>;
}

/// Credential store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, account: &str, bytes: &[u8]) -> CredentialResult<()> {
        validate_account(account)?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CredentialError::LockPoisoned)?;
        entries.insert(account.to_string(), bytes.to_vec());
        Ok(())
    }

    fn load(&self, account: &str) -> CredentialResult<Option<Vec<u8>>> {
        validate_account(account)?;
        let entries = self
            .entries
            .lock()
            .map_err(|_| CredentialError::LockPoisoned)?;
        Ok(entries.get(account).cloned())
    }
}

/// One file per account inside `dir`.
///
/// Desktop fallback for hosts without a wired-in keychain. Protection relies
/// on file permissions of the user's data directory.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn account_path(&self, account: &str) -> PathBuf {
        self.dir.join(account)
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, account: &str, bytes: &[u8]) -> CredentialResult<()> {
        validate_account(account)?;
        fs::create_dir_all(&self.dir)?;
        let path = self.account_path(account);
        let tmp = self.dir.join(format!("{account}.tmp"));
        write_restricted(&tmp, bytes)?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    fn load(&self, account: &str) -> CredentialResult<Option<Vec<u8>>> {
        validate_account(account)?;
        let path = self.account_path(account);
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

fn validate_account(account: &str) -> CredentialResult<()> {
    let valid = !account.is_empty()
        && account
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(CredentialError::InvalidAccount(account.to_string()))
    }
}

fn write_restricted(path: &Path, data: &[u8]) -> CredentialResult<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CredentialError, CredentialStore, FileCredentialStore, MemoryCredentialStore};

    #[test]
    fn memory_store_roundtrips_and_overwrites() {
        let store = MemoryCredentialStore::new();
        assert!(store.load("com.stressmind.encryptionKey").unwrap().is_none());
        store.save("com.stressmind.encryptionKey", &[1; 4]).unwrap();
        store.save("com.stressmind.encryptionKey", &[2; 4]).unwrap();
        assert_eq!(
            store.load("com.stressmind.encryptionKey").unwrap(),
            Some(vec![2; 4])
        );
    }

    #[test]
    fn account_names_with_path_separators_are_rejected() {
        let store = MemoryCredentialStore::new();
        let err = store.save("../escape", &[0]).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidAccount(_)));
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let first = FileCredentialStore::new(dir.path().join("keys"));
        first.save("account-a", b"secret-bytes").unwrap();

        let second = FileCredentialStore::new(dir.path().join("keys"));
        assert_eq!(
            second.load("account-a").unwrap().as_deref(),
            Some(&b"secret-bytes"[..])
        );
        assert!(second.load("account-b").unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path());
        store.save("account-a", b"k").unwrap();
        let mode = std::fs::metadata(dir.path().join("account-a"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
