//! Client-side catalog state: cached list, current view and banners.

use std::time::{Duration, Instant};

use shelf_app::books::models::{BookId, BookInput, BookResponse};
use shelf_app::books::validation::{validate, ValidationErrors};

use crate::api::BookApi;

/// How long a success banner stays up.
pub const SUCCESS_BANNER_TTL: Duration = Duration::from_secs(3);

pub const LOAD_FAILED: &str = "Failed to load books. Please make sure the backend is running.";
pub const CREATE_FAILED: &str = "Failed to create book. Please try again.";
pub const UPDATE_FAILED: &str = "Failed to update book. Please try again.";
pub const DELETE_FAILED: &str = "Failed to delete book. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(BookId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookForm {
    pub mode: FormMode,
    pub title: String,
    pub author: String,
    pub description: String,
    pub errors: ValidationErrors,
}

impl BookForm {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            title: String::new(),
            author: String::new(),
            description: String::new(),
            errors: ValidationErrors::default(),
        }
    }

    pub fn edit(book: &BookResponse) -> Self {
        Self {
            mode: FormMode::Edit(book.id),
            title: book.title.clone(),
            author: book.author.clone(),
            description: book.description.clone().unwrap_or_default(),
            errors: ValidationErrors::default(),
        }
    }

    /// Payload to send: trimmed values, blank description left out.
    pub fn to_input(&self) -> BookInput {
        let description = self.description.trim();
        BookInput::new(
            self.title.trim(),
            self.author.trim(),
            (!description.is_empty()).then(|| description.to_string()),
        )
    }

    /// Run the shared field rules, keeping the failures on the form.
    pub fn validate(&mut self) -> bool {
        match validate(&self.to_input()) {
            Ok(()) => {
                self.errors = ValidationErrors::default();
                true
            }
            Err(errors) => {
                self.errors = errors;
                false
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    List,
    Form(BookForm),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub message: String,
    pub shown_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Client-side rules rejected the form; nothing was sent.
    Invalid,
    Saved,
    Failed,
    /// There is no open form.
    Ignored,
}

pub struct CatalogApp<A: BookApi> {
    api: A,
    books: Vec<BookResponse>,
    view: View,
    loading: bool,
    error: Option<String>,
    success: Option<Banner>,
}

impl<A: BookApi> CatalogApp<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            books: Vec::new(),
            view: View::List,
            loading: true,
            error: None,
            success: None,
        }
    }

    pub fn books(&self) -> &[BookResponse] {
        &self.books
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_ref().map(|banner| banner.message.as_str())
    }

    pub fn book(&self, id: BookId) -> Option<&BookResponse> {
        self.books.iter().find(|book| book.id == id)
    }

    /// Initial load, same as a refresh.
    pub async fn mount(&mut self) {
        self.fetch_books().await;
    }

    /// Replace the cache with the server's list.
    pub async fn fetch_books(&mut self) {
        self.loading = true;
        self.error = None;
        match self.api.get_all_books().await {
            Ok(books) => {
                tracing::debug!(count = books.len(), "fetched books");
                self.books = books;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load books");
                self.books.clear();
                self.error = Some(LOAD_FAILED.to_string());
            }
        }
        self.loading = false;
    }

    pub fn open_create_form(&mut self) {
        self.view = View::Form(BookForm::create());
        self.error = None;
    }

    /// Open the form pre-filled with a cached book. Returns false when the id is not cached.
    pub fn open_edit_form(&mut self, id: BookId) -> bool {
        let Some(form) = self.book(id).map(BookForm::edit) else {
            return false;
        };
        self.view = View::Form(form);
        self.error = None;
        true
    }

    pub fn cancel_form(&mut self) {
        self.view = View::List;
        self.error = None;
    }

    pub fn form_mut(&mut self) -> Option<&mut BookForm> {
        match &mut self.view {
            View::Form(form) => Some(form),
            View::List => None,
        }
    }

    pub async fn submit_form(&mut self, now: Instant) -> SubmitOutcome {
        let View::Form(form) = &mut self.view else {
            return SubmitOutcome::Ignored;
        };
        if !form.validate() {
            return SubmitOutcome::Invalid;
        }

        let input = form.to_input();
        let mode = form.mode;
        self.error = None;

        match mode {
            FormMode::Create => match self.api.create_book(&input).await {
                Ok(book) => {
                    self.books.push(book);
                    self.saved("Book added successfully!", now)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to create book");
                    self.error = Some(CREATE_FAILED.to_string());
                    SubmitOutcome::Failed
                }
            },
            FormMode::Edit(id) => match self.api.update_book(id, &input).await {
                Ok(updated) => {
                    for book in self.books.iter_mut().filter(|book| book.id == id) {
                        *book = updated.clone();
                    }
                    self.saved("Book updated successfully!", now)
                }
                Err(e) => {
                    tracing::warn!(id, error = %e, "failed to update book");
                    self.error = Some(UPDATE_FAILED.to_string());
                    SubmitOutcome::Failed
                }
            },
        }
    }

    fn saved(&mut self, message: &str, now: Instant) -> SubmitOutcome {
        self.view = View::List;
        self.show_success(message, now);
        SubmitOutcome::Saved
    }

    fn show_success(&mut self, message: &str, now: Instant) {
        self.success = Some(Banner {
            message: message.to_string(),
            shown_at: now,
        });
    }

    /// Confirmation question for deleting a cached book.
    pub fn delete_prompt(&self, id: BookId) -> Option<String> {
        self.book(id).map(|book| {
            format!(
                "Are you sure you want to delete \"{}\" by {}?",
                book.title, book.author
            )
        })
    }

    /// Delete a cached book once the user has confirmed. Returns true when it was removed.
    pub async fn delete_book(&mut self, id: BookId, confirmed: bool, now: Instant) -> bool {
        if !confirmed || self.book(id).is_none() {
            return false;
        }

        self.error = None;
        match self.api.delete_book(id).await {
            Ok(()) => {
                self.books.retain(|book| book.id != id);
                self.show_success("Book deleted successfully!", now);
                true
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "failed to delete book");
                self.error = Some(DELETE_FAILED.to_string());
                false
            }
        }
    }

    /// Fetch one book straight from the server, bypassing the cache.
    pub async fn show_book(&self, id: BookId) -> Result<BookResponse, crate::api::ClientError> {
        self.api.get_book_by_id(id).await
    }

    /// Expire the success banner once its time is up.
    pub fn tick(&mut self, now: Instant) {
        if let Some(banner) = &self.success {
            if now.saturating_duration_since(banner.shown_at) >= SUCCESS_BANNER_TTL {
                self.success = None;
            }
        }
    }
}
