//! Book catalog record and copy-count accounting.
//!
//! # Invariants
//! - `published_year > 0`.
//! - `0 <= available_copies <= total_copies`.
//! - New books start with every copy available.

use crate::model::author::AuthorId;
use crate::model::{require_text, ModelValidationError};
use serde::{Deserialize, Serialize};

/// Row id of a `books` record.
pub type BookId = i64;

/// Persisted book with its copy counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    /// `None` for books catalogued without an author.
    pub author_id: Option<AuthorId>,
    pub genre: Option<String>,
    pub published_year: i32,
    pub total_copies: i64,
    /// Mutated only by issue/return and total-copy adjustments.
    pub available_copies: i64,
}

impl Book {
    /// Number of copies currently out on loan.
    pub fn copies_on_loan(&self) -> i64 {
        self.total_copies - self.available_copies
    }

    /// Returns whether at least one copy can be issued.
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("title", &self.title)?;
        validate_year(self.published_year)?;
        validate_copies(self.total_copies, self.available_copies)
    }
}

/// Input for cataloguing a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author_id: Option<AuthorId>,
    pub genre: Option<String>,
    pub published_year: i32,
    pub total_copies: i64,
}

impl NewBook {
    pub fn new(title: impl Into<String>, published_year: i32, total_copies: i64) -> Self {
        Self {
            title: title.into(),
            author_id: None,
            genre: None,
            published_year,
            total_copies,
        }
    }

    /// Sets the owning author.
    pub fn by(mut self, author_id: AuthorId) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("title", &self.title)?;
        validate_year(self.published_year)?;
        validate_copies(self.total_copies, self.total_copies)
    }
}

fn validate_year(year: i32) -> Result<(), ModelValidationError> {
    if year <= 0 {
        return Err(ModelValidationError::InvalidPublishedYear(year));
    }
    Ok(())
}

pub(crate) fn validate_copies(total: i64, available: i64) -> Result<(), ModelValidationError> {
    if total < 0 {
        return Err(ModelValidationError::NegativeCopies {
            field: "total_copies",
            value: total,
        });
    }
    if available < 0 {
        return Err(ModelValidationError::NegativeCopies {
            field: "available_copies",
            value: available,
        });
    }
    if available > total {
        return Err(ModelValidationError::AvailableExceedsTotal { available, total });
    }
    Ok(())
}
