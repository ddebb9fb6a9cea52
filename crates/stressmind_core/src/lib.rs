//! Core domain logic for StressMind.
//! This crate is the single source of truth for journal privacy and
//! persistence invariants.

pub mod analytics;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod slot;

pub use analytics::{AlertReason, EmergencyAlert, MoodSummary, Timeframe, TrendDirection};
pub use config::{ConfigError, CoreConfig};
pub use crypto::{
    CredentialStore, EncryptedStore, FileCredentialStore, KeyStore, MemoryCredentialStore,
    PersistError,
};
pub use error::ErrorKind;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::contact::{ContactId, CrisisResource, EmergencyContact, CRISIS_RESOURCES};
pub use model::mood::{EntryId, MoodCategory, MoodEntry, SUGGESTED_TAGS};
pub use model::sharing::{ParentalSharingSettings, ShareMethod, SharedContact};
pub use model::ValidationError;
pub use repo::{LoadIssue, RepoError, RepoResult, SubscriptionId};
pub use service::{ServiceError, ServiceResult, WellbeingService};
pub use slot::{MemorySlotStore, SlotError, SlotId, SlotResult, SlotStore, SqliteSlotStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
