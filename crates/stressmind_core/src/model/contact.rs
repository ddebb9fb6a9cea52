//! Emergency contact model and built-in crisis resources.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ContactId = Uuid;

/// Person the user can reach in a crisis.
///
/// The phone number is stored exactly as submitted; the core does not
/// validate or canonicalize it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: ContactId,
    pub name: String,
    pub relationship: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl EmergencyContact {
    pub fn new(
        name: impl Into<String>,
        relationship: impl Into<String>,
        phone_number: impl Into<String>,
        note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            relationship: relationship.into(),
            phone_number: phone_number.into(),
            note,
        }
    }

    /// Rejects contacts the form would not allow to be submitted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyContactName);
        }
        if self.phone_number.trim().is_empty() {
            return Err(ValidationError::EmptyPhoneNumber);
        }
        Ok(())
    }
}

/// Read-only hotline shown alongside personal contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrisisResource {
    pub name: &'static str,
    pub number: &'static str,
    pub description: &'static str,
}

pub const CRISIS_RESOURCES: [CrisisResource; 3] = [
    CrisisResource {
        name: "988 Suicide & Crisis Lifeline",
        number: "988",
        description: "24/7 free support",
    },
    CrisisResource {
        name: "Crisis Text Line",
        number: "741741",
        description: "Text HOME for support",
    },
    CrisisResource {
        name: "Teen Line",
        number: "3108554673",
        description: "Teens helping teens",
    },
];
