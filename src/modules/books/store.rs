//! Book persistence: the `BookStore` contract and its SQLite implementation.

use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use shelf_db::{Database, DbError};
use shelf_kernel::Migration;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::models::{Book, BookId, BookInput};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("book {0} not found")]
    NotFound(BookId),

    #[error(transparent)]
    Unavailable(#[from] DbError),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(DbError::Sqlite(e))
    }
}

/// Durable table of books keyed by id.
pub trait BookStore: Send + Sync {
    /// All books in insertion order.
    fn list(&self) -> Result<Vec<Book>, StoreError>;

    fn get(&self, id: BookId) -> Result<Book, StoreError>;

    /// Persist a new book; the store assigns `id` and `created_at`.
    fn insert(&self, fields: &BookInput) -> Result<Book, StoreError>;

    /// Overwrite the text fields of an existing book and stamp `updated_at`.
    fn replace(&self, id: BookId, fields: &BookInput) -> Result<Book, StoreError>;

    /// Delete a book, returning it as it was just before deletion.
    fn remove(&self, id: BookId) -> Result<Book, StoreError>;

    fn count(&self) -> Result<usize, StoreError>;

    /// Insert the example books when the table is empty. Returns how many were added.
    fn seed_if_empty(&self) -> Result<usize, StoreError>;
}

pub const MIGRATIONS: &[Migration] = &[Migration {
    id: "001_create_books",
    up: r#"
        CREATE TABLE IF NOT EXISTS books (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL CHECK (title <> ''),
            author      TEXT NOT NULL CHECK (author <> ''),
            description TEXT,
            created_at  TEXT NOT NULL,
            updated_at  TEXT
        );
        "#,
}];

/// Example books inserted into an empty catalog: (title, author, description).
pub const SEED_BOOKS: [(&str, &str, &str); 3] = [
    (
        "The Great Gatsby",
        "F. Scott Fitzgerald",
        "A classic American novel set in the Jazz Age",
    ),
    (
        "To Kill a Mockingbird",
        "Harper Lee",
        "A novel about racial injustice in the American South",
    ),
    (
        "1984",
        "George Orwell",
        "A dystopian social science fiction novel",
    ),
];

const SELECT_BOOK: &str =
    "SELECT id, title, author, description, created_at, updated_at FROM books";

fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

fn format_timestamp(value: OffsetDateTime) -> rusqlite::Result<String> {
    value
        .format(&Rfc3339)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn row_to_book(row: &Row) -> rusqlite::Result<Book> {
    let created_at: String = row.get(4)?;
    let updated_at: Option<String> = row.get(5)?;

    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        description: row.get(3)?,
        created_at: parse_timestamp(4, &created_at)?,
        updated_at: updated_at
            .map(|value| parse_timestamp(5, &value))
            .transpose()?,
    })
}

fn fetch(conn: &Connection, id: BookId) -> rusqlite::Result<Option<Book>> {
    conn.query_row(
        &format!("{} WHERE id = ?1", SELECT_BOOK),
        params![id],
        row_to_book,
    )
    .optional()
}

fn insert_row(
    conn: &Connection,
    fields: &BookInput,
    created_at: OffsetDateTime,
) -> rusqlite::Result<BookId> {
    conn.execute(
        "INSERT INTO books (title, author, description, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            fields.title,
            fields.author,
            fields.description,
            format_timestamp(created_at)?
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn count_rows(conn: &Connection) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
    Ok(count as usize)
}

pub struct SqliteBookStore {
    db: Database,
}

impl SqliteBookStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl BookStore for SqliteBookStore {
    fn list(&self) -> Result<Vec<Book>, StoreError> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_BOOK))?;
        let books = stmt
            .query_map([], row_to_book)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(books)
    }

    fn get(&self, id: BookId) -> Result<Book, StoreError> {
        let conn = self.db.lock()?;
        fetch(&conn, id)?.ok_or(StoreError::NotFound(id))
    }

    fn insert(&self, fields: &BookInput) -> Result<Book, StoreError> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;

        let id = insert_row(&tx, fields, OffsetDateTime::now_utc())?;
        let book = fetch(&tx, id)?.ok_or(StoreError::NotFound(id))?;

        tx.commit()?;
        Ok(book)
    }

    fn replace(&self, id: BookId, fields: &BookInput) -> Result<Book, StoreError> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;

        let existing = fetch(&tx, id)?.ok_or(StoreError::NotFound(id))?;
        // updated_at never precedes created_at, even if the clock stepped back
        let updated_at = OffsetDateTime::now_utc().max(existing.created_at);

        tx.execute(
            "UPDATE books SET title = ?1, author = ?2, description = ?3, updated_at = ?4 WHERE id = ?5",
            params![
                fields.title,
                fields.author,
                fields.description,
                format_timestamp(updated_at)?,
                id
            ],
        )?;
        let book = fetch(&tx, id)?.ok_or(StoreError::NotFound(id))?;

        tx.commit()?;
        Ok(book)
    }

    fn remove(&self, id: BookId) -> Result<Book, StoreError> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;

        let existing = fetch(&tx, id)?.ok_or(StoreError::NotFound(id))?;
        tx.execute("DELETE FROM books WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(existing)
    }

    fn count(&self) -> Result<usize, StoreError> {
        let conn = self.db.lock()?;
        Ok(count_rows(&conn)?)
    }

    fn seed_if_empty(&self) -> Result<usize, StoreError> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;

        if count_rows(&tx)? > 0 {
            return Ok(0);
        }

        let created_at = OffsetDateTime::now_utc();
        for (title, author, description) in SEED_BOOKS {
            let fields = BookInput::new(title, author, Some(description.to_string()));
            insert_row(&tx, &fields, created_at)?;
        }

        tx.commit()?;
        Ok(SEED_BOOKS.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteBookStore {
        let db = Database::open_in_memory().unwrap();
        let migrations: Vec<(String, Migration)> = MIGRATIONS
            .iter()
            .map(|m| ("books".to_string(), m.clone()))
            .collect();
        db.apply_migrations(&migrations).unwrap();
        SqliteBookStore::new(db)
    }

    fn fields(title: &str, author: &str) -> BookInput {
        BookInput::new(title, author, None)
    }

    #[test]
    fn insert_assigns_id_and_created_at() {
        let store = store();
        let before = OffsetDateTime::now_utc();

        let book = store
            .insert(&BookInput::new("Dune", "Frank Herbert", Some("Spice".to_string())))
            .unwrap();

        assert!(book.id > 0);
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Frank Herbert");
        assert_eq!(book.description.as_deref(), Some("Spice"));
        assert!(book.created_at >= before);
        assert_eq!(book.updated_at, None);
        assert_eq!(store.get(book.id).unwrap(), book);
    }

    #[test]
    fn list_is_in_insertion_order() {
        let store = store();
        let first = store.insert(&fields("A", "X")).unwrap();
        let second = store.insert(&fields("B", "Y")).unwrap();

        let ids: Vec<BookId> = store.list().unwrap().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn replace_overwrites_fields_and_keeps_identity() {
        let store = store();
        let original = store
            .insert(&BookInput::new("Draft", "Anon", Some("old".to_string())))
            .unwrap();

        let updated = store.replace(original.id, &fields("Final", "Author")).unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.author, "Author");
        assert_eq!(updated.description, None);
        let updated_at = updated.updated_at.unwrap();
        assert!(updated_at >= updated.created_at);
    }

    #[test]
    fn missing_ids_are_not_found() {
        let store = store();
        assert!(matches!(store.get(42), Err(StoreError::NotFound(42))));
        assert!(matches!(
            store.replace(42, &fields("T", "A")),
            Err(StoreError::NotFound(42))
        ));
        assert!(matches!(store.remove(42), Err(StoreError::NotFound(42))));
    }

    #[test]
    fn remove_returns_the_deleted_book() {
        let store = store();
        let book = store.insert(&fields("Gone", "Soon")).unwrap();
        let count = store.count().unwrap();

        let removed = store.remove(book.id).unwrap();

        assert_eq!(removed, book);
        assert_eq!(store.count().unwrap(), count - 1);
        assert!(matches!(store.get(book.id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let store = store();
        let first = store.insert(&fields("One", "A")).unwrap();
        store.remove(first.id).unwrap();
        let second = store.insert(&fields("Two", "B")).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn seeding_is_idempotent() {
        let store = store();

        assert_eq!(store.seed_if_empty().unwrap(), 3);
        assert_eq!(store.seed_if_empty().unwrap(), 0);
        assert_eq!(store.count().unwrap(), 3);

        let titles: Vec<String> = store.list().unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(
            titles,
            vec!["The Great Gatsby", "To Kill a Mockingbird", "1984"]
        );
    }

    #[test]
    fn seeding_skips_non_empty_catalog() {
        let store = store();
        store.insert(&fields("Mine", "Me")).unwrap();
        assert_eq!(store.seed_if_empty().unwrap(), 0);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn leading_nul_is_stored_intact() {
        let store = store();

        let book = store.insert(&fields("\u{0}Dune", "\u{0}X")).unwrap();

        assert_eq!(store.get(book.id).unwrap().title, "\u{0}Dune");
        assert_eq!(book.author, "\u{0}X");
    }

    #[test]
    fn missing_table_reports_unavailable() {
        let store = SqliteBookStore::new(Database::open_in_memory().unwrap());
        assert!(matches!(store.list(), Err(StoreError::Unavailable(_))));
    }
}
