use std::sync::Arc;

use shelf_db::DbError;
use thiserror::Error;

use super::models::{Book, BookId, BookInput};
use super::store::{BookStore, StoreError};
use super::validation::{validate, ValidationErrors};

#[derive(Debug, Error)]
pub enum BookError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("book with ID {0} not found")]
    NotFound(BookId),

    #[error("storage unavailable: {0}")]
    Storage(#[source] DbError),
}

impl From<StoreError> for BookError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => BookError::NotFound(id),
            StoreError::Unavailable(source) => BookError::Storage(source),
        }
    }
}

/// The five catalog operations. Holds no state besides the store handle.
#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn BookStore>,
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    pub fn list_books(&self) -> Result<Vec<Book>, BookError> {
        tracing::info!("fetching all books");
        let books = self.store.list().inspect_err(log_failure)?;
        tracing::info!(count = books.len(), "retrieved books");
        Ok(books)
    }

    pub fn get_book(&self, id: BookId) -> Result<Book, BookError> {
        tracing::info!(id, "fetching book");
        let book = self.store.get(id).inspect_err(log_failure)?;
        tracing::info!(id, title = %book.title, "retrieved book");
        Ok(book)
    }

    pub fn create_book(&self, input: BookInput) -> Result<Book, BookError> {
        if let Err(errors) = validate(&input) {
            tracing::warn!(%errors, "rejected invalid book");
            return Err(BookError::Validation(errors));
        }

        tracing::info!(title = %input.title, "creating book");
        let book = self.store.insert(&input).inspect_err(log_failure)?;
        tracing::info!(id = book.id, "created book");
        Ok(book)
    }

    /// Validation runs before the existence check, so an invalid body for a
    /// missing id reports the validation failure.
    pub fn update_book(&self, id: BookId, input: BookInput) -> Result<Book, BookError> {
        if let Err(errors) = validate(&input) {
            tracing::warn!(id, %errors, "rejected invalid book update");
            return Err(BookError::Validation(errors));
        }

        tracing::info!(id, "updating book");
        let book = self.store.replace(id, &input).inspect_err(log_failure)?;
        tracing::info!(id, "updated book");
        Ok(book)
    }

    pub fn delete_book(&self, id: BookId) -> Result<Book, BookError> {
        tracing::info!(id, "deleting book");
        let book = self.store.remove(id).inspect_err(log_failure)?;
        tracing::info!(id, title = %book.title, "deleted book");
        Ok(book)
    }

    /// Insert the example books if the catalog is empty.
    pub fn seed(&self) -> Result<usize, BookError> {
        let inserted = self.store.seed_if_empty().inspect_err(log_failure)?;
        if inserted > 0 {
            tracing::info!(inserted, "seeded empty catalog");
        } else {
            tracing::debug!("catalog already populated, skipping seed");
        }
        Ok(inserted)
    }
}

fn log_failure(e: &StoreError) {
    match e {
        StoreError::NotFound(id) => tracing::warn!(id, "book not found"),
        StoreError::Unavailable(source) => tracing::error!(error = %source, "book storage failed"),
    }
}
