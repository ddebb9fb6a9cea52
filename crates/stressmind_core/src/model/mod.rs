//! Record types persisted by the core.
//!
//! # Responsibility
//! - Define mood entries, emergency contacts and parental sharing settings.
//! - Provide input normalization/validation applied before persistence.
//!
//! # Invariants
//! - Every collection record is identified by a stable `Uuid`.
//! - Record identifiers are never rewritten by an edit.

pub mod contact;
pub mod mood;
pub mod sharing;

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Input rejected before any mutation reaches a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyContactName,
    EmptyPhoneNumber,
    EmptySharedContactName,
    UnknownMood(String),
    UnknownShareMethod(String),
    DuplicateId(Uuid),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContactName => write!(f, "contact name cannot be empty"),
            Self::EmptyPhoneNumber => write!(f, "contact phone number cannot be empty"),
            Self::EmptySharedContactName => write!(f, "shared contact name cannot be empty"),
            Self::UnknownMood(value) => write!(f, "unknown mood: `{value}`"),
            Self::UnknownShareMethod(value) => write!(f, "unknown share method: `{value}`"),
            Self::DuplicateId(id) => write!(f, "a record with id {id} already exists"),
        }
    }
}

impl Error for ValidationError {}
