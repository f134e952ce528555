//! Catalog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `authors`, `books` and `members`.
//! - Own copy-count adjustments that are not part of the loan flow.
//!
//! # Invariants
//! - New books are stored with `available_copies = total_copies`.
//! - Member emails are stored normalized (trimmed, lowercase).
//! - Deletes rely on `ON DELETE CASCADE`: author -> books -> transactions,
//!   member -> transactions, book -> transactions.

use crate::model::author::{Author, AuthorId, NewAuthor};
use crate::model::book::{validate_copies, Book, BookId, NewBook};
use crate::model::member::{normalize_email, Member, MemberId, NewMember};
use crate::repo::{
    ensure_connection_ready, is_unique_violation, row_exists, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};

const AUTHOR_SELECT_SQL: &str = "SELECT id, name, birth_date, nationality FROM authors";

const BOOK_SELECT_SQL: &str = "SELECT
    id,
    title,
    author_id,
    genre,
    published_year,
    total_copies,
    available_copies
FROM books";

const MEMBER_SELECT_SQL: &str =
    "SELECT id, name, email, phone, membership_date FROM members";

/// Filter options for listing books.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookListQuery {
    /// Only books written by this author.
    pub author_id: Option<AuthorId>,
    /// Only books with at least one copy on the shelf.
    pub available_only: bool,
}

/// Repository interface for catalog records.
pub trait CatalogRepository {
    fn create_author(&self, author: &NewAuthor) -> RepoResult<Author>;
    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>>;
    /// Lists authors ordered by `name ASC, id ASC`.
    fn list_authors(&self) -> RepoResult<Vec<Author>>;
    /// Deletes an author together with their books and those books' loans.
    fn delete_author(&self, id: AuthorId) -> RepoResult<()>;

    fn create_book(&self, book: &NewBook) -> RepoResult<Book>;
    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;
    /// Lists books ordered by `title ASC, id ASC`.
    fn list_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>>;
    /// Changes the total copy count, shifting available copies by the same delta.
    fn set_total_copies(&self, id: BookId, total_copies: i64) -> RepoResult<Book>;
    /// Deletes a book together with its loans.
    fn delete_book(&self, id: BookId) -> RepoResult<()>;

    fn create_member(&self, member: &NewMember) -> RepoResult<Member>;
    fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>>;
    fn find_member_by_email(&self, email: &str) -> RepoResult<Option<Member>>;
    /// Lists members ordered by `name ASC, id ASC`.
    fn list_members(&self) -> RepoResult<Vec<Member>>;
    /// Deletes a member together with their loans, returning copies they
    /// still hold to the shelf.
    fn delete_member(&self, id: MemberId) -> RepoResult<()>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn create_author(&self, author: &NewAuthor) -> RepoResult<Author> {
        author.validate()?;

        self.conn.execute(
            "INSERT INTO authors (name, birth_date, nationality) VALUES (?1, ?2, ?3);",
            params![
                author.name.trim(),
                author.birth_date,
                author.nationality.as_deref(),
            ],
        )?;
        load_required_author(self.conn, self.conn.last_insert_rowid())
    }

    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>> {
        self.conn
            .query_row(
                &format!("{AUTHOR_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_author_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_authors(&self) -> RepoResult<Vec<Author>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{AUTHOR_SELECT_SQL} ORDER BY name ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut authors = Vec::new();
        while let Some(row) = rows.next()? {
            authors.push(parse_author_row(row)?);
        }
        Ok(authors)
    }

    fn delete_author(&self, id: AuthorId) -> RepoResult<()> {
        delete_by_id(self.conn, "authors", "author", id)
    }

    fn create_book(&self, book: &NewBook) -> RepoResult<Book> {
        book.validate()?;

        if let Some(author_id) = book.author_id {
            if !row_exists(self.conn, "authors", author_id)? {
                return Err(RepoError::NotFound {
                    entity: "author",
                    id: author_id,
                });
            }
        }

        self.conn.execute(
            "INSERT INTO books (
                title,
                author_id,
                genre,
                published_year,
                total_copies,
                available_copies
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5);",
            params![
                book.title.trim(),
                book.author_id,
                book.genre.as_deref(),
                book.published_year,
                book.total_copies,
            ],
        )?;
        load_required_book(self.conn, self.conn.last_insert_rowid())
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        load_book(self.conn, id)
    }

    fn list_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>> {
        let mut sql = format!("{BOOK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(author_id) = query.author_id {
            sql.push_str(" AND author_id = ?");
            bind_values.push(Value::Integer(author_id));
        }
        if query.available_only {
            sql.push_str(" AND available_copies > 0");
        }
        sql.push_str(" ORDER BY title ASC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            books.push(parse_book_row(row)?);
        }
        Ok(books)
    }

    fn set_total_copies(&self, id: BookId, total_copies: i64) -> RepoResult<Book> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let book = load_book(&tx, id)?.ok_or(RepoError::NotFound { entity: "book", id })?;

        let on_loan = book.copies_on_loan();
        if total_copies < on_loan {
            return Err(RepoError::CopiesOnLoan {
                book_id: id,
                on_loan,
                requested_total: total_copies,
            });
        }
        let available_copies = total_copies - on_loan;
        validate_copies(total_copies, available_copies)?;

        tx.execute(
            "UPDATE books
             SET total_copies = ?2,
                 available_copies = ?3
             WHERE id = ?1;",
            params![id, total_copies, available_copies],
        )?;
        tx.commit()?;

        load_required_book(self.conn, id)
    }

    fn delete_book(&self, id: BookId) -> RepoResult<()> {
        delete_by_id(self.conn, "books", "book", id)
    }

    fn create_member(&self, member: &NewMember) -> RepoResult<Member> {
        member.validate()?;
        let email = normalize_email(&member.email);

        let inserted = self.conn.execute(
            "INSERT INTO members (name, email, phone, membership_date)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                member.name.trim(),
                email.as_str(),
                member.phone.as_deref(),
                member.membership_date,
            ],
        );
        match inserted {
            Ok(_) => load_required_member(self.conn, self.conn.last_insert_rowid()),
            Err(err) if is_unique_violation(&err) => Err(RepoError::DuplicateEmail(email)),
            Err(err) => Err(err.into()),
        }
    }

    fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>> {
        self.conn
            .query_row(
                &format!("{MEMBER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_member_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn find_member_by_email(&self, email: &str) -> RepoResult<Option<Member>> {
        self.conn
            .query_row(
                &format!("{MEMBER_SELECT_SQL} WHERE email = ?1;"),
                [normalize_email(email)],
                |row| Ok(parse_member_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_members(&self) -> RepoResult<Vec<Member>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMBER_SELECT_SQL} ORDER BY name ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }

    fn delete_member(&self, id: MemberId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(RESTORE_MEMBER_COPIES_SQL, [id])?;
        delete_by_id(&tx, "members", "member", id)?;
        tx.commit()?;
        Ok(())
    }
}

/// Hands back one copy per open loan of the member before the cascade drops
/// those loans.
const RESTORE_MEMBER_COPIES_SQL: &str = "UPDATE books
SET available_copies = available_copies + (
    SELECT COUNT(*) FROM transactions
    WHERE transactions.book_id = books.id
      AND transactions.member_id = ?1
      AND transactions.return_date IS NULL
)
WHERE id IN (
    SELECT book_id FROM transactions WHERE member_id = ?1 AND return_date IS NULL
);";

fn delete_by_id(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: i64,
) -> RepoResult<()> {
    let changed = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1;"), [id])?;
    if changed == 0 {
        return Err(RepoError::NotFound { entity, id });
    }
    Ok(())
}

fn load_book(conn: &Connection, id: BookId) -> RepoResult<Option<Book>> {
    conn.query_row(
        &format!("{BOOK_SELECT_SQL} WHERE id = ?1;"),
        [id],
        |row| Ok(parse_book_row(row)),
    )
    .optional()?
    .transpose()
}

fn load_required_author(conn: &Connection, id: AuthorId) -> RepoResult<Author> {
    conn.query_row(
        &format!("{AUTHOR_SELECT_SQL} WHERE id = ?1;"),
        [id],
        |row| Ok(parse_author_row(row)),
    )?
}

fn load_required_book(conn: &Connection, id: BookId) -> RepoResult<Book> {
    load_book(conn, id)?.ok_or(RepoError::NotFound { entity: "book", id })
}

fn load_required_member(conn: &Connection, id: MemberId) -> RepoResult<Member> {
    conn.query_row(
        &format!("{MEMBER_SELECT_SQL} WHERE id = ?1;"),
        [id],
        |row| Ok(parse_member_row(row)),
    )?
}

fn parse_author_row(row: &Row<'_>) -> RepoResult<Author> {
    let author = Author {
        id: row.get("id")?,
        name: row.get("name")?,
        birth_date: row.get("birth_date")?,
        nationality: row.get("nationality")?,
    };
    author
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("authors.id={}: {err}", author.id)))?;
    Ok(author)
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let book = Book {
        id: row.get("id")?,
        title: row.get("title")?,
        author_id: row.get("author_id")?,
        genre: row.get("genre")?,
        published_year: row.get("published_year")?,
        total_copies: row.get("total_copies")?,
        available_copies: row.get("available_copies")?,
    };
    book.validate()
        .map_err(|err| RepoError::InvalidData(format!("books.id={}: {err}", book.id)))?;
    Ok(book)
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    let member = Member {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        membership_date: row.get("membership_date")?,
    };
    member
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("members.id={}: {err}", member.id)))?;
    Ok(member)
}
