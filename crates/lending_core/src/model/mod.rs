//! Lending domain model.
//!
//! # Responsibility
//! - Define catalog records (authors, books, members) and loan records.
//! - Provide validation shared by repository write and read paths.
//!
//! # Invariants
//! - Identities are SQLite integer row ids and are never reused by the ledger.
//! - `0 <= available_copies <= total_copies` for every valid `Book`.
//! - A `Loan` without `return_date` is open; with one it is closed.

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod author;
pub mod book;
pub mod loan;
pub mod member;

/// Validation failure for a domain record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Required text field is empty or whitespace only.
    EmptyField(&'static str),
    /// Published year must be strictly positive.
    InvalidPublishedYear(i32),
    /// Copy counters cannot be negative.
    NegativeCopies { field: &'static str, value: i64 },
    /// More copies available than the book has in total.
    AvailableExceedsTotal { available: i64, total: i64 },
    /// Email does not look like `local@domain`.
    InvalidEmail(String),
    /// Loan return date precedes its issue date.
    ReturnBeforeIssue {
        issue_date: NaiveDate,
        return_date: NaiveDate,
    },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` must not be empty"),
            Self::InvalidPublishedYear(year) => {
                write!(f, "published year must be positive, got {year}")
            }
            Self::NegativeCopies { field, value } => {
                write!(f, "`{field}` must not be negative, got {value}")
            }
            Self::AvailableExceedsTotal { available, total } => write!(
                f,
                "available copies ({available}) exceed total copies ({total})"
            ),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::ReturnBeforeIssue {
                issue_date,
                return_date,
            } => write!(
                f,
                "return date {return_date} is earlier than issue date {issue_date}"
            ),
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::EmptyField(field));
    }
    Ok(())
}
