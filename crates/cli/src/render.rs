//! Plain-text rendering of the catalog views.

use std::fmt::Write;

use shelf_app::books::models::BookResponse;
use shelf_app::books::validation::DESCRIPTION_MAX_CHARS;

use crate::api::BookApi;
use crate::app::{BookForm, CatalogApp, FormMode, View};

pub fn screen<A: BookApi>(app: &CatalogApp<A>) -> String {
    let mut out = String::new();

    if let Some(message) = app.success() {
        let _ = writeln!(out, "[ok] {}", message);
    }
    if let Some(message) = app.error() {
        let _ = writeln!(out, "[error] {}", message);
    }

    match app.view() {
        View::List => out.push_str(&list(app.books(), app.is_loading())),
        View::Form(form) => out.push_str(&form_view(form)),
    }
    out
}

pub fn list(books: &[BookResponse], loading: bool) -> String {
    if loading {
        return "Loading...\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Total Books: {}", books.len());
    if books.is_empty() {
        out.push_str("\nNo books in the library\nAdd your first book to get started!\n");
        return out;
    }

    for book in books {
        out.push('\n');
        out.push_str(&card(book));
    }
    out
}

pub fn card(book: &BookResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} {}", book.id, book.title);
    let _ = writeln!(out, "   Author: {}", book.author);
    if let Some(description) = &book.description {
        let _ = writeln!(out, "   {}", description);
    }
    let _ = write!(out, "   Added: {}", book.created_at.date());
    if let Some(updated_at) = book.updated_at {
        let _ = write!(out, "  Updated: {}", updated_at.date());
    }
    out.push('\n');
    out
}

pub fn form_view(form: &BookForm) -> String {
    let mut out = String::new();
    let heading = match form.mode {
        FormMode::Create => "Add New Book",
        FormMode::Edit(_) => "Edit Book",
    };
    let _ = writeln!(out, "{}\n", heading);

    for (field, label, value) in [
        ("title", "Title *", &form.title),
        ("author", "Author *", &form.author),
        ("description", "Description", &form.description),
    ] {
        let _ = writeln!(out, "{}: {}", label, value);
        if let Some(message) = form.errors.get(field) {
            let _ = writeln!(out, "   ! {}", message);
        }
    }
    let _ = writeln!(
        out,
        "{}/{} characters",
        form.description.chars().count(),
        DESCRIPTION_MAX_CHARS
    );
    out
}
