//! Author catalog record.

use crate::model::{require_text, ModelValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Row id of an `authors` record.
pub type AuthorId = i64;

/// Persisted author. Deleting an author deletes their books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub nationality: Option<String>,
}

/// Input for creating an author.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewAuthor {
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub nationality: Option<String>,
}

impl NewAuthor {
    /// Creates author input with only the required name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("name", &self.name)
    }
}

impl Author {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("name", &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::NewAuthor;
    use crate::model::ModelValidationError;

    #[test]
    fn blank_name_is_rejected() {
        let err = NewAuthor::new("  ").validate().unwrap_err();
        assert_eq!(err, ModelValidationError::EmptyField("name"));
    }
}
