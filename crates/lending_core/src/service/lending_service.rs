//! Lending use-case service.
//!
//! # Responsibility
//! - Expose issue, return and overdue reporting to callers.
//! - Log every transition with ids, outcome and duration.
//!
//! # Invariants
//! - The current date is always an explicit argument.
//! - Logs carry identifiers only, never member names or book titles.

use crate::model::book::BookId;
use crate::model::loan::{Loan, LoanId, OverdueEntry};
use crate::model::member::MemberId;
use crate::repo::loan_repo::{LendingError, LendingResult, LoanRepository};
use chrono::NaiveDate;
use log::{info, warn};
use std::time::Instant;

/// Use-case service wrapper for loan transitions.
pub struct LendingService<R: LoanRepository> {
    repo: R,
}

impl<R: LoanRepository> LendingService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Checks out one copy of a book.
    ///
    /// # Errors
    /// - `Unavailable` when every copy is out; nothing is written.
    /// - `BookNotFound` / `MemberNotFound` for unknown ids.
    pub fn issue(
        &self,
        book_id: BookId,
        member_id: MemberId,
        today: NaiveDate,
    ) -> LendingResult<Loan> {
        let started_at = Instant::now();
        let result = self.repo.issue(book_id, member_id, today);
        match &result {
            Ok(loan) => info!(
                "event=loan_issue module=lending status=ok loan_id={} book_id={book_id} member_id={member_id} duration_ms={}",
                loan.id,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("loan_issue", err, started_at),
        }
        result
    }

    /// Returns a loaned copy.
    ///
    /// # Errors
    /// - `NotFound` for an unknown transaction id; nothing is written.
    /// - `AlreadyReturned` when the loan is already closed.
    pub fn return_loan(&self, loan_id: LoanId, today: NaiveDate) -> LendingResult<Loan> {
        let started_at = Instant::now();
        let result = self.repo.return_loan(loan_id, today);
        match &result {
            Ok(loan) => info!(
                "event=loan_return module=lending status=ok loan_id={loan_id} book_id={} duration_ms={}",
                loan.book_id,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("loan_return", err, started_at),
        }
        result
    }

    /// Open loans older than the loan period, most overdue first.
    pub fn overdue(&self, today: NaiveDate) -> LendingResult<Vec<OverdueEntry>> {
        let started_at = Instant::now();
        let result = self.repo.overdue(today);
        match &result {
            Ok(entries) => info!(
                "event=overdue_report module=lending status=ok as_of={today} rows={} duration_ms={}",
                entries.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("overdue_report", err, started_at),
        }
        result
    }

    pub fn get_loan(&self, loan_id: LoanId) -> LendingResult<Option<Loan>> {
        self.repo.get_loan(loan_id)
    }

    pub fn open_loans_for_member(&self, member_id: MemberId) -> LendingResult<Vec<Loan>> {
        self.repo.list_open_loans_for_member(member_id)
    }

    pub fn loans_for_book(&self, book_id: BookId) -> LendingResult<Vec<Loan>> {
        self.repo.list_loans_for_book(book_id)
    }
}

fn log_failure(event: &str, err: &LendingError, started_at: Instant) {
    // Rejections are expected caller outcomes; only storage faults are warnings.
    match err {
        LendingError::Storage(_) | LendingError::InconsistentState(_) => warn!(
            "event={event} module=lending status=error error_code={} duration_ms={} error={err}",
            err.code(),
            started_at.elapsed().as_millis()
        ),
        _ => info!(
            "event={event} module=lending status=rejected error_code={} duration_ms={}",
            err.code(),
            started_at.elapsed().as_millis()
        ),
    }
}
