//! Record types shared by every storage backend.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageError;

/// A validated patient intake record.
///
/// Every field is guaranteed non-empty when the value was produced by
/// [`PatientDraft::validate`] or loaded from a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub gender: String,
    pub contact_number: String,
    pub email: String,
    pub address: String,
}

/// A candidate record as received from a client, before validation.
///
/// Unknown JSON keys are ignored; absent keys deserialize to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientDraft {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl PatientDraft {
    fn slots(&self) -> [(&'static str, Option<&str>); 7] {
        [
            ("firstName", self.first_name.as_deref()),
            ("lastName", self.last_name.as_deref()),
            ("dob", self.dob.as_deref()),
            ("gender", self.gender.as_deref()),
            ("contactNumber", self.contact_number.as_deref()),
            ("email", self.email.as_deref()),
            ("address", self.address.as_deref()),
        ]
    }

    /// Returns the wire names of every absent or empty field.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.slots()
            .into_iter()
            .filter(|(_, value)| value.is_none_or(str::is_empty))
            .map(|(name, _)| name)
            .collect()
    }

    /// Validates the draft and converts it into a [`PatientRecord`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` naming every missing field.
    pub fn validate(&self) -> Result<PatientRecord, StorageError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(StorageError::validation(missing));
        }

        let take = |v: &Option<String>| v.clone().unwrap_or_default();
        Ok(PatientRecord {
            first_name: take(&self.first_name),
            last_name: take(&self.last_name),
            dob: take(&self.dob),
            gender: take(&self.gender),
            contact_number: take(&self.contact_number),
            email: take(&self.email),
            address: take(&self.address),
        })
    }
}

impl From<PatientRecord> for PatientDraft {
    fn from(record: PatientRecord) -> Self {
        Self {
            first_name: Some(record.first_name),
            last_name: Some(record.last_name),
            dob: Some(record.dob),
            gender: Some(record.gender),
            contact_number: Some(record.contact_number),
            email: Some(record.email),
            address: Some(record.address),
        }
    }
}

/// Backend-assigned identifier of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Zero-based position in an ordered file store.
    Ordinal(u64),
    /// Identifier generated by a database.
    Generated(Uuid),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordinal(n) => write!(f, "{n}"),
            Self::Generated(id) => write!(f, "{id}"),
        }
    }
}

/// A record as held by a backend, together with its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub record: PatientRecord,
}

impl StoredRecord {
    #[must_use]
    pub fn new(id: RecordId, record: PatientRecord) -> Self {
        Self { id, record }
    }
}
