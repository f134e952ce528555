//! Loan repository: issue/return transitions and the overdue report.
//!
//! # Responsibility
//! - Move book copies between shelf and member as atomic SQLite transactions.
//! - Stream open loans past the loan period.
//!
//! # Invariants
//! - Issue and return run inside `BEGIN IMMEDIATE`, so the write lock is held
//!   from the availability check through the final write.
//! - Issue takes a copy with one compare-and-decrement statement; zero
//!   affected rows means no copy was available.
//! - Return never raises `available_copies` above `total_copies` and never
//!   closes a loan twice.
//! - Failed operations leave no partial state behind (transaction rollback).

use crate::db::DbError;
use crate::model::book::BookId;
use crate::model::loan::{Loan, LoanId, OverdueEntry, LOAN_PERIOD_DAYS};
use crate::model::member::MemberId;
use crate::repo::{ensure_connection_ready, row_exists, RepoError};
use chrono::NaiveDate;
use rusqlite::{
    params, Connection, OptionalExtension, Row, Statement, Transaction, TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

const LOAN_SELECT_SQL: &str =
    "SELECT id, book_id, member_id, issue_date, return_date FROM transactions";

const OVERDUE_SQL: &str = "SELECT
    t.id AS loan_id,
    m.name AS member_name,
    b.title AS book_title,
    CAST(julianday(?1) - julianday(t.issue_date) AS INTEGER) - ?2 AS days_overdue
FROM transactions t
INNER JOIN members m ON m.id = t.member_id
INNER JOIN books b ON b.id = t.book_id
WHERE t.return_date IS NULL
  AND CAST(julianday(?1) - julianday(t.issue_date) AS INTEGER) > ?2
ORDER BY days_overdue DESC, t.id ASC;";

pub type LendingResult<T> = Result<T, LendingError>;

/// Errors from issue/return and loan queries.
#[derive(Debug)]
pub enum LendingError {
    /// Book has no copy left to issue.
    Unavailable(BookId),
    /// No loan with this id.
    NotFound(LoanId),
    BookNotFound(BookId),
    MemberNotFound(MemberId),
    /// Loan was already closed by an earlier return.
    AlreadyReturned(LoanId),
    /// Return date would precede the issue date.
    ReturnBeforeIssue {
        loan_id: LoanId,
        issue_date: NaiveDate,
        return_date: NaiveDate,
    },
    /// Persisted counters disagree with the loan being processed.
    InconsistentState(String),
    /// Storage, schema or persisted-data failure.
    Storage(RepoError),
}

impl Display for LendingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(book_id) => write!(f, "no copies of book {book_id} available"),
            Self::NotFound(loan_id) => write!(f, "transaction not found: {loan_id}"),
            Self::BookNotFound(book_id) => write!(f, "book not found: {book_id}"),
            Self::MemberNotFound(member_id) => write!(f, "member not found: {member_id}"),
            Self::AlreadyReturned(loan_id) => {
                write!(f, "transaction {loan_id} has already been returned")
            }
            Self::ReturnBeforeIssue {
                loan_id,
                issue_date,
                return_date,
            } => write!(
                f,
                "transaction {loan_id} issued on {issue_date} cannot be returned on {return_date}"
            ),
            Self::InconsistentState(details) => write!(f, "inconsistent ledger state: {details}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LendingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LendingError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

impl From<rusqlite::Error> for LendingError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(RepoError::Db(DbError::Sqlite(value)))
    }
}

impl LendingError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::NotFound(_) => "not_found",
            Self::BookNotFound(_) => "book_not_found",
            Self::MemberNotFound(_) => "member_not_found",
            Self::AlreadyReturned(_) => "already_returned",
            Self::ReturnBeforeIssue { .. } => "return_before_issue",
            Self::InconsistentState(_) => "inconsistent_state",
            Self::Storage(_) => "storage",
        }
    }
}

/// Repository interface for loan transitions.
pub trait LoanRepository {
    /// Issues one copy of `book_id` to `member_id` on `today`.
    fn issue(&self, book_id: BookId, member_id: MemberId, today: NaiveDate)
        -> LendingResult<Loan>;
    /// Closes an open loan on `today` and puts the copy back on the shelf.
    fn return_loan(&self, loan_id: LoanId, today: NaiveDate) -> LendingResult<Loan>;
    fn get_loan(&self, loan_id: LoanId) -> LendingResult<Option<Loan>>;
    /// Open loans of one member, oldest first.
    fn list_open_loans_for_member(&self, member_id: MemberId) -> LendingResult<Vec<Loan>>;
    /// Every loan of one book, oldest first.
    fn list_loans_for_book(&self, book_id: BookId) -> LendingResult<Vec<Loan>>;
    /// Collects the overdue report as of `today`.
    fn overdue(&self, today: NaiveDate) -> LendingResult<Vec<OverdueEntry>>;
}

/// SQLite-backed loan repository.
pub struct SqliteLoanRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLoanRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> LendingResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Prepares the overdue report as of `today` without running it.
    pub fn overdue_report(&self, today: NaiveDate) -> LendingResult<OverdueReport<'conn>> {
        let stmt = self.conn.prepare(OVERDUE_SQL)?;
        Ok(OverdueReport { stmt, today })
    }
}

impl LoanRepository for SqliteLoanRepository<'_> {
    fn issue(
        &self,
        book_id: BookId,
        member_id: MemberId,
        today: NaiveDate,
    ) -> LendingResult<Loan> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        if !row_exists(&tx, "members", member_id)? {
            return Err(LendingError::MemberNotFound(member_id));
        }

        let taken = tx.execute(
            "UPDATE books
             SET available_copies = available_copies - 1
             WHERE id = ?1
               AND available_copies > 0;",
            [book_id],
        )?;
        if taken == 0 {
            if row_exists(&tx, "books", book_id)? {
                return Err(LendingError::Unavailable(book_id));
            }
            return Err(LendingError::BookNotFound(book_id));
        }

        tx.execute(
            "INSERT INTO transactions (book_id, member_id, issue_date, return_date)
             VALUES (?1, ?2, ?3, NULL);",
            params![book_id, member_id, today],
        )?;
        let loan_id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Loan {
            id: loan_id,
            book_id,
            member_id,
            issue_date: today,
            return_date: None,
        })
    }

    fn return_loan(&self, loan_id: LoanId, today: NaiveDate) -> LendingResult<Loan> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let loan = load_loan(&tx, loan_id)?.ok_or(LendingError::NotFound(loan_id))?;
        if !loan.is_open() {
            return Err(LendingError::AlreadyReturned(loan_id));
        }
        if today < loan.issue_date {
            return Err(LendingError::ReturnBeforeIssue {
                loan_id,
                issue_date: loan.issue_date,
                return_date: today,
            });
        }

        let closed = tx.execute(
            "UPDATE transactions
             SET return_date = ?2
             WHERE id = ?1
               AND return_date IS NULL;",
            params![loan_id, today],
        )?;
        if closed == 0 {
            return Err(LendingError::AlreadyReturned(loan_id));
        }

        let restored = tx.execute(
            "UPDATE books
             SET available_copies = available_copies + 1
             WHERE id = ?1
               AND available_copies < total_copies;",
            [loan.book_id],
        )?;
        if restored == 0 {
            return Err(LendingError::InconsistentState(format!(
                "book {} has no copy on loan for transaction {loan_id}",
                loan.book_id
            )));
        }
        tx.commit()?;

        Ok(Loan {
            return_date: Some(today),
            ..loan
        })
    }

    fn get_loan(&self, loan_id: LoanId) -> LendingResult<Option<Loan>> {
        load_loan(self.conn, loan_id)
    }

    fn list_open_loans_for_member(&self, member_id: MemberId) -> LendingResult<Vec<Loan>> {
        list_loans(
            self.conn,
            "WHERE member_id = ?1 AND return_date IS NULL",
            member_id,
        )
    }

    fn list_loans_for_book(&self, book_id: BookId) -> LendingResult<Vec<Loan>> {
        list_loans(self.conn, "WHERE book_id = ?1", book_id)
    }

    fn overdue(&self, today: NaiveDate) -> LendingResult<Vec<OverdueEntry>> {
        self.overdue_report(today)?.collect_entries()
    }
}

/// Prepared overdue query.
///
/// Each call to [`OverdueReport::rows`] re-runs the query, so the report can
/// be walked any number of times; rows are read from SQLite as the iterator
/// advances. Order is `days_overdue DESC, loan_id ASC`.
pub struct OverdueReport<'conn> {
    stmt: Statement<'conn>,
    today: NaiveDate,
}

impl OverdueReport<'_> {
    /// Reference date the report is computed against.
    pub fn as_of(&self) -> NaiveDate {
        self.today
    }

    /// Streams overdue entries.
    pub fn rows(
        &mut self,
    ) -> LendingResult<impl Iterator<Item = LendingResult<OverdueEntry>> + '_> {
        let today = self.today;
        let rows = self
            .stmt
            .query_map(params![today, LOAN_PERIOD_DAYS], parse_overdue_row)?;
        Ok(rows.map(|row| row.map_err(LendingError::from)))
    }

    pub fn collect_entries(&mut self) -> LendingResult<Vec<OverdueEntry>> {
        self.rows()?.collect()
    }
}

fn load_loan(conn: &Connection, loan_id: LoanId) -> LendingResult<Option<Loan>> {
    conn.query_row(
        &format!("{LOAN_SELECT_SQL} WHERE id = ?1;"),
        [loan_id],
        |row| Ok(parse_loan_row(row)),
    )
    .optional()?
    .transpose()
}

fn list_loans(conn: &Connection, filter: &str, id: i64) -> LendingResult<Vec<Loan>> {
    let mut stmt = conn.prepare(&format!(
        "{LOAN_SELECT_SQL} {filter} ORDER BY issue_date ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([id])?;
    let mut loans = Vec::new();
    while let Some(row) = rows.next()? {
        loans.push(parse_loan_row(row)?);
    }
    Ok(loans)
}

fn parse_loan_row(row: &Row<'_>) -> LendingResult<Loan> {
    let loan = Loan {
        id: row.get("id")?,
        book_id: row.get("book_id")?,
        member_id: row.get("member_id")?,
        issue_date: row.get("issue_date")?,
        return_date: row.get("return_date")?,
    };
    loan.validate()
        .map_err(|err| RepoError::InvalidData(format!("transactions.id={}: {err}", loan.id)))?;
    Ok(loan)
}

fn parse_overdue_row(row: &Row<'_>) -> rusqlite::Result<OverdueEntry> {
    Ok(OverdueEntry {
        loan_id: row.get("loan_id")?,
        member_name: row.get("member_name")?,
        book_title: row.get("book_title")?,
        days_overdue: row.get("days_overdue")?,
    })
}
