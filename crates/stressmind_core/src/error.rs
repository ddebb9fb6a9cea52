//! Flat error classification shared by every core layer.
//!
//! Collaborators (FFI, CLI) map on `ErrorKind` instead of matching nested
//! error enums. Recoverability rules:
//! - `KeyUnavailable` is unrecoverable for the process.
//! - Everything else degrades the affected view to its empty/default state.

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Secure credential store inaccessible or holding an unusable key.
    KeyUnavailable,
    /// Authentication tag mismatch: wrong/rotated key or tampered blob.
    DecryptionFailed,
    /// Decryption succeeded but the structured content did not decode.
    DecodingFailed,
    /// Update referenced an unknown identifier.
    NotFound,
    /// Underlying storage could not be read.
    PersistReadFailed,
    /// Underlying storage rejected a write, or the value could not be sealed.
    PersistWriteFailed,
    /// Caller input rejected before any mutation.
    Validation,
}

impl ErrorKind {
    /// Stable snake_case code used in logs and FFI envelopes.
    pub const fn code(self) -> &'static str {
        match self {
            Self::KeyUnavailable => "key_unavailable",
            Self::DecryptionFailed => "decryption_failed",
            Self::DecodingFailed => "decoding_failed",
            Self::NotFound => "not_found",
            Self::PersistReadFailed => "persist_read_failed",
            Self::PersistWriteFailed => "persist_write_failed",
            Self::Validation => "validation",
        }
    }

    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::KeyUnavailable)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorKind;

    #[test]
    fn only_key_unavailable_is_fatal() {
        assert!(ErrorKind::KeyUnavailable.is_fatal());
        assert!(!ErrorKind::DecryptionFailed.is_fatal());
        assert!(!ErrorKind::PersistWriteFailed.is_fatal());
    }
}
