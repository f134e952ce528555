//! Command-line front end for the lending ledger.
//!
//! # Responsibility
//! - Map subcommands onto catalog and lending services.
//! - Print results as JSON lines on stdout, errors on stderr.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use lending_core::db::open_db;
use lending_core::{
    init_logging, CatalogService, LedgerConfig, LendingService, NewAuthor, NewBook, NewMember,
    SqliteCatalogRepository, SqliteLoanRepository,
};
use log::error;
use rusqlite::Connection;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Library lending ledger", long_about = None)]
struct Cli {
    /// SQLite database file [env: LENDING_DB_PATH, default: ./lending.sqlite3]
    #[arg(long)]
    db: Option<PathBuf>,

    /// Date treated as today (YYYY-MM-DD); defaults to the local date
    #[arg(long)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check out one copy of a book to a member
    Issue { book_id: i64, member_id: i64 },
    /// Return a checked-out copy
    Return { transaction_id: i64 },
    /// List open loans past the loan period
    Overdue,
    /// Add an author
    AddAuthor {
        name: String,
        #[arg(long)]
        born: Option<NaiveDate>,
        #[arg(long)]
        nationality: Option<String>,
    },
    /// Add a book with its initial number of copies
    AddBook {
        title: String,
        #[arg(long)]
        year: i32,
        #[arg(long, default_value_t = 1)]
        copies: i64,
        #[arg(long)]
        author: Option<i64>,
        #[arg(long)]
        genre: Option<String>,
    },
    /// Register a member
    AddMember {
        name: String,
        email: String,
        #[arg(long)]
        phone: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut config = LedgerConfig::from_env();
    if let Some(db) = cli.db.clone() {
        config.db_path = db;
    }

    if let Some(log_dir) = config.log_dir.as_ref() {
        if let Err(err) = init_logging(&config.log_level, &log_dir.to_string_lossy()) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: &LedgerConfig) -> Result<(), Box<dyn Error>> {
    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    let conn = open_db(&config.db_path)?;

    match cli.command {
        Command::Issue { book_id, member_id } => {
            let loan = lending(&conn)?.issue(book_id, member_id, today)?;
            println!("{}", serde_json::to_string(&loan)?);
        }
        Command::Return { transaction_id } => {
            let loan = lending(&conn)?.return_loan(transaction_id, today)?;
            println!("{}", serde_json::to_string(&loan)?);
        }
        Command::Overdue => {
            for entry in lending(&conn)?.overdue(today)? {
                println!("{}", serde_json::to_string(&entry)?);
            }
        }
        Command::AddAuthor {
            name,
            born,
            nationality,
        } => {
            let author = catalog(&conn)?.add_author(&NewAuthor {
                name,
                birth_date: born,
                nationality,
            })?;
            println!("{}", serde_json::to_string(&author)?);
        }
        Command::AddBook {
            title,
            year,
            copies,
            author,
            genre,
        } => {
            let mut input = NewBook::new(title, year, copies);
            input.author_id = author;
            input.genre = genre;
            let book = catalog(&conn)?.add_book(&input)?;
            println!("{}", serde_json::to_string(&book)?);
        }
        Command::AddMember { name, email, phone } => {
            let mut input = NewMember::new(name, email, today);
            input.phone = phone;
            let member = catalog(&conn)?.register_member(&input)?;
            println!("{}", serde_json::to_string(&member)?);
        }
    }
    Ok(())
}

fn lending(conn: &Connection) -> Result<LendingService<SqliteLoanRepository<'_>>, Box<dyn Error>> {
    Ok(LendingService::new(SqliteLoanRepository::try_new(conn)?))
}

fn catalog(
    conn: &Connection,
) -> Result<CatalogService<SqliteCatalogRepository<'_>>, Box<dyn Error>> {
    Ok(CatalogService::new(SqliteCatalogRepository::try_new(conn)?))
}

#[cfg(test)]
mod tests {
    use super::{run, Cli, Command};
    use chrono::NaiveDate;
    use clap::Parser;
    use lending_core::db::open_db;
    use lending_core::{LedgerConfig, LoanRepository, SqliteLoanRepository};
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("lending_cli").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn global_flags_parse_into_path_and_date() {
        let cli = parse(&["--db", "/tmp/ledger.db", "--today", "2024-03-05", "overdue"]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/ledger.db")));
        assert_eq!(cli.today, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert!(matches!(cli.command, Command::Overdue));
    }

    #[test]
    fn malformed_today_is_rejected() {
        let result = Cli::try_parse_from(["lending_cli", "--today", "05/03/2024", "overdue"]);
        assert!(result.is_err());
    }

    #[test]
    fn add_book_defaults_to_one_copy() {
        let cli = parse(&["add-book", "Kindred", "--year", "1979"]);
        match cli.command {
            Command::AddBook {
                title,
                year,
                copies,
                author,
                genre,
            } => {
                assert_eq!(title, "Kindred");
                assert_eq!(year, 1979);
                assert_eq!(copies, 1);
                assert!(author.is_none());
                assert!(genre.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn issue_requires_book_and_member_ids() {
        assert!(Cli::try_parse_from(["lending_cli", "issue", "1"]).is_err());
        let cli = parse(&["issue", "1", "2"]);
        assert!(matches!(
            cli.command,
            Command::Issue {
                book_id: 1,
                member_id: 2
            }
        ));
    }

    #[test]
    fn commands_run_against_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig {
            db_path: dir.path().join("ledger.sqlite3"),
            ..LedgerConfig::default()
        };

        run(parse(&["add-book", "Kindred", "--year", "1979"]), &config).unwrap();
        run(
            parse(&["--today", "2024-01-01", "add-member", "Dana", "dana@example.org"]),
            &config,
        )
        .unwrap();
        run(parse(&["--today", "2024-01-01", "issue", "1", "1"]), &config).unwrap();
        run(parse(&["--today", "2024-02-01", "overdue"]), &config).unwrap();
        assert!(run(parse(&["--today", "2024-01-02", "issue", "1", "1"]), &config).is_err());

        let conn = open_db(&config.db_path).unwrap();
        let repo = SqliteLoanRepository::try_new(&conn).unwrap();
        let overdue = repo
            .overdue(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
            .unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].days_overdue, 17);
    }
}
