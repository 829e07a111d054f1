//! HTTP handlers for the books module.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderName, StatusCode},
    routing::get,
    Json, Router,
};
use shelf_http::{module_path, AppError};

use super::models::{BookId, BookInput, BookResponse, DeleteConfirmation};
use super::service::{BookError, BookService};
use super::MODULE_NAME;

pub fn router(service: BookService) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route("/{id}", get(get_book).put(update_book).delete(delete_book))
        .with_state(service)
}

/// Translate a service failure into a response, naming the attempted action.
fn failure(err: BookError, action: &str) -> AppError {
    match err {
        BookError::Validation(errors) => AppError::validation(errors.into_inner()),
        BookError::NotFound(id) => AppError::not_found(format!("Book with ID {} not found", id)),
        BookError::Storage(source) => {
            AppError::internal(format!("An error occurred while {}", action), source)
        }
    }
}

fn book_id(path: Result<Path<BookId>, PathRejection>) -> Result<BookId, AppError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

fn book_input(body: Result<Json<BookInput>, JsonRejection>) -> Result<BookInput, AppError> {
    body.map(|Json(input)| input)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(
    State(service): State<BookService>,
) -> Result<Json<Vec<BookResponse>>, AppError> {
    let books = service
        .list_books()
        .map_err(|e| failure(e, "retrieving books"))?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

async fn get_book(
    State(service): State<BookService>,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<Json<BookResponse>, AppError> {
    let id = book_id(id)?;
    let book = service
        .get_book(id)
        .map_err(|e| failure(e, "retrieving the book"))?;
    Ok(Json(book.into()))
}

async fn create_book(
    State(service): State<BookService>,
    body: Result<Json<BookInput>, JsonRejection>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<BookResponse>), AppError> {
    let input = book_input(body)?;
    let book = service
        .create_book(input)
        .map_err(|e| failure(e, "creating the book"))?;

    let location = format!("{}/{}", module_path(MODULE_NAME), book.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(book.into()),
    ))
}

async fn update_book(
    State(service): State<BookService>,
    id: Result<Path<BookId>, PathRejection>,
    body: Result<Json<BookInput>, JsonRejection>,
) -> Result<Json<BookResponse>, AppError> {
    let id = book_id(id)?;
    let input = book_input(body)?;
    let book = service
        .update_book(id, input)
        .map_err(|e| failure(e, "updating the book"))?;
    Ok(Json(book.into()))
}

async fn delete_book(
    State(service): State<BookService>,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<Json<DeleteConfirmation>, AppError> {
    let id = book_id(id)?;
    let book = service
        .delete_book(id)
        .map_err(|e| failure(e, "deleting the book"))?;
    Ok(Json(DeleteConfirmation::for_book(&book)))
}
