//! Library member record.
//!
//! # Invariants
//! - `email` is unique (case-insensitive) across members.
//! - Deleting a member deletes all of their loans.

use crate::model::{require_text, ModelValidationError};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Row id of a `members` record.
pub type MemberId = i64;

/// Persisted library member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub membership_date: NaiveDate,
}

impl Member {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_member_fields(&self.name, &self.email)
    }
}

/// Input for registering a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub membership_date: NaiveDate,
}

impl NewMember {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        membership_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: None,
            membership_date,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_member_fields(&self.name, &self.email)
    }
}

/// Trims and lowercases an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_member_fields(name: &str, email: &str) -> Result<(), ModelValidationError> {
    require_text("name", name)?;
    require_text("email", email)?;
    if !EMAIL_RE.is_match(email.trim()) {
        return Err(ModelValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, NewMember};
    use crate::model::ModelValidationError;
    use chrono::NaiveDate;

    fn joined() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn accepts_plain_address() {
        NewMember::new("Ada", "ada@example.org", joined())
            .validate()
            .unwrap();
    }

    #[test]
    fn rejects_address_without_domain() {
        let err = NewMember::new("Ada", "ada@", joined())
            .validate()
            .unwrap_err();
        assert!(matches!(err, ModelValidationError::InvalidEmail(_)));
    }

    #[test]
    fn rejects_blank_email_before_format_check() {
        let err = NewMember::new("Ada", " ", joined()).validate().unwrap_err();
        assert_eq!(err, ModelValidationError::EmptyField("email"));
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Ada@Example.ORG "), "ada@example.org");
    }
}
