//! Core domain logic for the library lending ledger.
//! This crate is the single source of truth for copy-count and loan invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::LedgerConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::author::{Author, AuthorId, NewAuthor};
pub use model::book::{Book, BookId, NewBook};
pub use model::loan::{Loan, LoanId, LoanState, OverdueEntry, LOAN_PERIOD_DAYS};
pub use model::member::{Member, MemberId, NewMember};
pub use model::ModelValidationError;
pub use repo::catalog_repo::{BookListQuery, CatalogRepository, SqliteCatalogRepository};
pub use repo::loan_repo::{
    LendingError, LendingResult, LoanRepository, OverdueReport, SqliteLoanRepository,
};
pub use repo::{RepoError, RepoResult};
pub use service::catalog_service::CatalogService;
pub use service::lending_service::LendingService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
