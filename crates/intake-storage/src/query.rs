//! Name search semantics shared by the backends.

use crate::error::StorageError;
use crate::types::PatientRecord;

/// A validated, case-folded name search.
///
/// Matches a record when its first or last name contains the query as a
/// case-insensitive substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameQuery {
    raw: String,
    folded: String,
}

impl NameQuery {
    /// Parses a raw `name` parameter.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidQuery` when the parameter is empty.
    pub fn parse(name_part: &str) -> Result<Self, StorageError> {
        if name_part.is_empty() {
            return Err(StorageError::invalid_query(
                "name query parameter is required",
            ));
        }
        Ok(Self {
            raw: name_part.to_string(),
            folded: name_part.to_lowercase(),
        })
    }

    /// The query as supplied by the caller.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn matches(&self, record: &PatientRecord) -> bool {
        record.first_name.to_lowercase().contains(&self.folded)
            || record.last_name.to_lowercase().contains(&self.folded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(first: &str, last: &str) -> PatientRecord {
        PatientRecord {
            first_name: first.into(),
            last_name: last.into(),
            dob: "1990-01-01".into(),
            gender: "F".into(),
            contact_number: "555-0100".into(),
            email: "a@x.com".into(),
            address: "1 Main St".into(),
        }
    }

    #[test]
    fn test_empty_query_rejected() {
        assert!(matches!(
            NameQuery::parse(""),
            Err(StorageError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_matches_either_name_case_insensitively() {
        let query = NameQuery::parse("SMI").unwrap();
        assert!(query.matches(&record("John", "Smith")));
        assert!(query.matches(&record("Smitty", "Jones")));
        assert!(!query.matches(&record("Ann", "Lee")));
    }

    #[test]
    fn test_does_not_match_other_fields() {
        let query = NameQuery::parse("main").unwrap();
        assert!(!query.matches(&record("Ann", "Lee")));
    }

    #[test]
    fn test_keeps_raw_form() {
        let query = NameQuery::parse("LeE").unwrap();
        assert_eq!(query.as_str(), "LeE");
        assert!(query.matches(&record("Ann", "LEE")));
    }
}
