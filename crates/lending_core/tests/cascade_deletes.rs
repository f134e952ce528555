use chrono::NaiveDate;
use lending_core::db::open_db_in_memory;
use lending_core::{
    BookListQuery, CatalogService, LendingService, NewAuthor, NewBook, NewMember,
    SqliteCatalogRepository, SqliteLoanRepository,
};
use rusqlite::Connection;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn deleting_member_deletes_their_transactions_only() {
    let conn = open_db_in_memory().unwrap();
    let catalog = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let lending = LendingService::new(SqliteLoanRepository::try_new(&conn).unwrap());

    let book = catalog.add_book(&NewBook::new("Kindred", 1979, 3)).unwrap();
    let leaving = catalog
        .register_member(&NewMember::new("Dana", "dana@example.org", today()))
        .unwrap();
    let staying = catalog
        .register_member(&NewMember::new("Kevin", "kevin@example.org", today()))
        .unwrap();
    let returned = lending.issue(book.id, leaving.id, today()).unwrap();
    lending.return_loan(returned.id, today()).unwrap();
    lending.issue(book.id, leaving.id, today()).unwrap();
    let kept = lending.issue(book.id, staying.id, today()).unwrap();

    catalog.remove_member(leaving.id).unwrap();

    assert!(catalog.member(leaving.id).unwrap().is_none());
    let remaining: Vec<_> = lending
        .loans_for_book(book.id)
        .unwrap()
        .into_iter()
        .map(|loan| loan.id)
        .collect();
    assert_eq!(remaining, vec![kept.id]);
    assert!(catalog.book(book.id).unwrap().is_some());
}

#[test]
fn deleting_author_deletes_books_and_their_transactions() {
    let conn = open_db_in_memory().unwrap();
    let catalog = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let lending = LendingService::new(SqliteLoanRepository::try_new(&conn).unwrap());

    let butler = catalog
        .add_author(&NewAuthor::new("Octavia E. Butler"))
        .unwrap();
    let jemisin = catalog.add_author(&NewAuthor::new("N. K. Jemisin")).unwrap();
    let kindred = catalog
        .add_book(&NewBook::new("Kindred", 1979, 1).by(butler.id))
        .unwrap();
    let dawn = catalog
        .add_book(&NewBook::new("Dawn", 1987, 1).by(butler.id))
        .unwrap();
    let season = catalog
        .add_book(&NewBook::new("The Fifth Season", 2015, 1).by(jemisin.id))
        .unwrap();
    let member = catalog
        .register_member(&NewMember::new("Essun", "essun@stillness.org", today()))
        .unwrap();
    lending.issue(kindred.id, member.id, today()).unwrap();
    lending.issue(dawn.id, member.id, today()).unwrap();
    let survivor = lending.issue(season.id, member.id, today()).unwrap();

    catalog.remove_author(butler.id).unwrap();

    assert!(catalog.author(butler.id).unwrap().is_none());
    assert!(catalog.book(kindred.id).unwrap().is_none());
    assert!(catalog.book(dawn.id).unwrap().is_none());
    let books = catalog.books(&BookListQuery::default()).unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].id, season.id);

    assert_eq!(count(&conn, "transactions"), 1);
    assert!(lending.get_loan(survivor.id).unwrap().is_some());
    assert!(catalog.member(member.id).unwrap().is_some());
}

#[test]
fn deleting_book_deletes_its_transactions() {
    let conn = open_db_in_memory().unwrap();
    let catalog = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let lending = LendingService::new(SqliteLoanRepository::try_new(&conn).unwrap());

    let book = catalog.add_book(&NewBook::new("Kindred", 1979, 2)).unwrap();
    let member = catalog
        .register_member(&NewMember::new("Dana", "dana@example.org", today()))
        .unwrap();
    let loan = lending.issue(book.id, member.id, today()).unwrap();

    catalog.remove_book(book.id).unwrap();

    assert!(lending.get_loan(loan.id).unwrap().is_none());
    assert!(lending.open_loans_for_member(member.id).unwrap().is_empty());
    assert_eq!(count(&conn, "members"), 1);
}

#[test]
fn deleting_member_with_open_loans_puts_copies_back() {
    let conn = open_db_in_memory().unwrap();
    let catalog = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let lending = LendingService::new(SqliteLoanRepository::try_new(&conn).unwrap());

    let single = catalog.add_book(&NewBook::new("Kindred", 1979, 1)).unwrap();
    let shared = catalog.add_book(&NewBook::new("Dawn", 1987, 3)).unwrap();
    let leaving = catalog
        .register_member(&NewMember::new("Dana", "dana@example.org", today()))
        .unwrap();
    let staying = catalog
        .register_member(&NewMember::new("Kevin", "kevin@example.org", today()))
        .unwrap();
    lending.issue(single.id, leaving.id, today()).unwrap();
    lending.issue(shared.id, leaving.id, today()).unwrap();
    lending.issue(shared.id, leaving.id, today()).unwrap();
    lending.issue(shared.id, staying.id, today()).unwrap();
    assert!(lending.issue(shared.id, leaving.id, today()).is_err());

    catalog.remove_member(leaving.id).unwrap();

    let single = catalog.book(single.id).unwrap().unwrap();
    assert_eq!(single.available_copies, 1);
    let shared = catalog.book(shared.id).unwrap().unwrap();
    assert_eq!(shared.available_copies, 2);
    assert_eq!(shared.copies_on_loan(), 1);

    lending.issue(single.id, staying.id, today()).unwrap();
    let shrunk = catalog.set_total_copies(shared.id, 1).unwrap();
    assert_eq!(shrunk.available_copies, 0);
}

#[test]
fn deleting_unknown_member_leaves_counts_untouched() {
    let conn = open_db_in_memory().unwrap();
    let catalog = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let book = catalog.add_book(&NewBook::new("Kindred", 1979, 2)).unwrap();

    assert!(catalog.remove_member(404).is_err());
    assert_eq!(catalog.book(book.id).unwrap().unwrap().available_copies, 2);
}
