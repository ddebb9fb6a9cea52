//! Parental sharing configuration.
//!
//! # Invariants
//! - Exactly one settings record exists; the default is disabled with no
//!   shared contacts.
//! - Disabling sharing clears `shared_with`.

use super::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareMethod {
    Sms,
    Email,
    InPerson,
}

impl ShareMethod {
    pub const fn key(self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Email => "email",
            Self::InPerson => "in_person",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Sms => "Text Message",
            Self::Email => "Email",
            Self::InPerson => "In Person",
        }
    }
}

impl Display for ShareMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ShareMethod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sms" | "text message" => Ok(Self::Sms),
            "email" => Ok(Self::Email),
            "in_person" | "in-person" | "in person" => Ok(Self::InPerson),
            _ => Err(ValidationError::UnknownShareMethod(value.trim().to_string())),
        }
    }
}

/// Parent, guardian or trusted adult receiving summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedContact {
    pub name: String,
    pub relationship: String,
    pub share_method: ShareMethod,
}

impl SharedContact {
    pub fn new(
        name: impl Into<String>,
        relationship: impl Into<String>,
        share_method: ShareMethod,
    ) -> Self {
        Self {
            name: name.into(),
            relationship: relationship.into(),
            share_method,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptySharedContactName);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentalSharingSettings {
    pub enabled: bool,
    #[serde(default)]
    pub enabled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub shared_with: Vec<SharedContact>,
}

impl ParentalSharingSettings {
    /// Enabled settings sharing with exactly `contact`.
    pub fn enabled_with(contact: SharedContact, now: DateTime<Utc>) -> Self {
        Self {
            enabled: true,
            enabled_at: Some(now),
            shared_with: vec![contact],
        }
    }

    /// Turns sharing off and forgets every shared contact.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.shared_with.clear();
    }
}
