//! Person Name Value Object
//!
//! First or last name of a user: trimmed, non-empty, at most 50 characters.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PERSON_NAME_MAX_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonName(String);

impl PersonName {
    /// `field` names the input in error messages ("First name", "Last name")
    pub fn new(value: impl Into<String>, field: &str) -> AppResult<Self> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(AppError::bad_request(format!("{} is required", field)));
        }

        if value.chars().count() > PERSON_NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "{} must be at most {} characters",
                field, PERSON_NAME_MAX_LENGTH
            )));
        }

        if value.chars().any(char::is_control) {
            return Err(AppError::bad_request(format!(
                "{} contains invalid characters",
                field
            )));
        }

        Ok(Self(value))
    }

    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_name_trimmed() {
        let name = PersonName::new("  Ada ", "First name").unwrap();
        assert_eq!(name.as_str(), "Ada");
    }

    #[test]
    fn test_person_name_bounds() {
        assert!(PersonName::new("", "First name").is_err());
        assert!(PersonName::new("   ", "First name").is_err());
        assert!(PersonName::new("a".repeat(50), "Last name").is_ok());

        let err = PersonName::new("a".repeat(51), "Last name").unwrap_err();
        assert!(err.message().contains("Last name"));
    }

    #[test]
    fn test_person_name_counts_characters_not_bytes() {
        assert!(PersonName::new("é".repeat(50), "First name").is_ok());
    }
}
