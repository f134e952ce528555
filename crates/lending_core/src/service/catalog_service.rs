//! Catalog use-case service.
//!
//! # Responsibility
//! - Provide create/get/list/delete entry points for authors, books, members.
//! - Log destructive operations, which cascade into loan history.

use crate::model::author::{Author, AuthorId, NewAuthor};
use crate::model::book::{Book, BookId, NewBook};
use crate::model::member::{Member, MemberId, NewMember};
use crate::repo::catalog_repo::{BookListQuery, CatalogRepository};
use crate::repo::RepoResult;
use log::info;

/// Use-case service wrapper for catalog records.
pub struct CatalogService<R: CatalogRepository> {
    repo: R,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn add_author(&self, author: &NewAuthor) -> RepoResult<Author> {
        let created = self.repo.create_author(author)?;
        info!(
            "event=author_create module=catalog status=ok author_id={}",
            created.id
        );
        Ok(created)
    }

    pub fn author(&self, id: AuthorId) -> RepoResult<Option<Author>> {
        self.repo.get_author(id)
    }

    pub fn authors(&self) -> RepoResult<Vec<Author>> {
        self.repo.list_authors()
    }

    /// Removes an author, their books and every loan of those books.
    pub fn remove_author(&self, id: AuthorId) -> RepoResult<()> {
        self.repo.delete_author(id)?;
        info!("event=author_delete module=catalog status=ok author_id={id} cascade=books,transactions");
        Ok(())
    }

    pub fn add_book(&self, book: &NewBook) -> RepoResult<Book> {
        let created = self.repo.create_book(book)?;
        info!(
            "event=book_create module=catalog status=ok book_id={} total_copies={}",
            created.id, created.total_copies
        );
        Ok(created)
    }

    pub fn book(&self, id: BookId) -> RepoResult<Option<Book>> {
        self.repo.get_book(id)
    }

    pub fn books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>> {
        self.repo.list_books(query)
    }

    /// Adjusts stock for acquisitions or write-offs.
    pub fn set_total_copies(&self, id: BookId, total_copies: i64) -> RepoResult<Book> {
        let updated = self.repo.set_total_copies(id, total_copies)?;
        info!(
            "event=book_stock module=catalog status=ok book_id={id} total_copies={} available_copies={}",
            updated.total_copies, updated.available_copies
        );
        Ok(updated)
    }

    /// Removes a book and its loans.
    pub fn remove_book(&self, id: BookId) -> RepoResult<()> {
        self.repo.delete_book(id)?;
        info!("event=book_delete module=catalog status=ok book_id={id} cascade=transactions");
        Ok(())
    }

    pub fn register_member(&self, member: &NewMember) -> RepoResult<Member> {
        let created = self.repo.create_member(member)?;
        info!(
            "event=member_create module=catalog status=ok member_id={}",
            created.id
        );
        Ok(created)
    }

    pub fn member(&self, id: MemberId) -> RepoResult<Option<Member>> {
        self.repo.get_member(id)
    }

    pub fn member_by_email(&self, email: &str) -> RepoResult<Option<Member>> {
        self.repo.find_member_by_email(email)
    }

    pub fn members(&self) -> RepoResult<Vec<Member>> {
        self.repo.list_members()
    }

    /// Removes a member and their loans.
    pub fn remove_member(&self, id: MemberId) -> RepoResult<()> {
        self.repo.delete_member(id)?;
        info!("event=member_delete module=catalog status=ok member_id={id} cascade=transactions");
        Ok(())
    }
}
