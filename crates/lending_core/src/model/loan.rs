//! Loan (borrow/return transaction) record and overdue arithmetic.
//!
//! # Responsibility
//! - Represent one issue event of one book copy to one member.
//! - Derive loan state and overdue days from an explicit `today`.
//!
//! # Invariants
//! - Open loans have `return_date == None`; closed loans have it set.
//! - `return_date >= issue_date` when set.
//! - `Closed` is terminal.

use crate::model::book::BookId;
use crate::model::member::MemberId;
use crate::model::ModelValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Row id of a `transactions` record.
pub type LoanId = i64;

/// Days a copy may stay out before the loan counts as overdue.
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Lifecycle state of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanState {
    /// Copy is checked out.
    Open,
    /// Copy has been returned.
    Closed,
}

/// Persisted loan row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub book_id: BookId,
    pub member_id: MemberId,
    pub issue_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

impl Loan {
    pub fn state(&self) -> LoanState {
        match self.return_date {
            None => LoanState::Open,
            Some(_) => LoanState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == LoanState::Open
    }

    /// Whole days between issue and `today`.
    pub fn age_in_days(&self, today: NaiveDate) -> i64 {
        (today - self.issue_date).num_days()
    }

    /// Days past the loan period, or `None` when closed or not yet overdue.
    pub fn days_overdue(&self, today: NaiveDate) -> Option<i64> {
        if !self.is_open() {
            return None;
        }
        overdue_days_for_age(self.age_in_days(today))
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        match self.return_date {
            Some(return_date) if return_date < self.issue_date => {
                Err(ModelValidationError::ReturnBeforeIssue {
                    issue_date: self.issue_date,
                    return_date,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Maps a loan age to overdue days. Exactly `LOAN_PERIOD_DAYS` is not overdue.
pub fn overdue_days_for_age(age_in_days: i64) -> Option<i64> {
    if age_in_days > LOAN_PERIOD_DAYS {
        Some(age_in_days - LOAN_PERIOD_DAYS)
    } else {
        None
    }
}

/// One line of the overdue report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueEntry {
    pub loan_id: LoanId,
    pub member_name: String,
    pub book_title: String,
    pub days_overdue: i64,
}

#[cfg(test)]
mod tests {
    use super::{overdue_days_for_age, Loan, LoanState};
    use chrono::{Duration, NaiveDate};

    fn loan_issued(issue_date: NaiveDate) -> Loan {
        Loan {
            id: 7,
            book_id: 1,
            member_id: 2,
            issue_date,
            return_date: None,
        }
    }

    #[test]
    fn overdue_boundary_is_exclusive() {
        assert_eq!(overdue_days_for_age(10), None);
        assert_eq!(overdue_days_for_age(14), None);
        assert_eq!(overdue_days_for_age(15), Some(1));
        assert_eq!(overdue_days_for_age(20), Some(6));
    }

    #[test]
    fn closed_loan_is_never_overdue() {
        let issued = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut loan = loan_issued(issued);
        let today = issued + Duration::days(30);
        assert_eq!(loan.days_overdue(today), Some(16));

        loan.return_date = Some(today);
        assert_eq!(loan.state(), LoanState::Closed);
        assert_eq!(loan.days_overdue(today), None);
    }

    #[test]
    fn return_before_issue_fails_validation() {
        let issued = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let mut loan = loan_issued(issued);
        loan.return_date = Some(issued - Duration::days(1));
        assert!(loan.validate().is_err());
    }
}
