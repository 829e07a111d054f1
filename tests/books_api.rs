//! End-to-end tests for the books endpoints, driven through the full router.

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use shelf_app::books::models::BookResponse;
use shelf_db::Database;
use shelf_kernel::settings::Settings;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    db: Database,
}

impl TestApp {
    async fn spawn() -> Self {
        Self::with_settings(Settings::default()).await
    }

    async fn with_settings(settings: Settings) -> Self {
        let db = Database::open_in_memory().expect("Failed to open test database");
        let registry = shelf_app::prepare(&settings, &db)
            .await
            .expect("Failed to prepare modules");
        let router = shelf_http::build_router(&registry, &settings);
        Self { router, db }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, headers, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let (status, _, body) = self.send(Method::GET, uri, None).await;
        (status, body)
    }
}

#[tokio::test]
async fn fresh_catalog_is_seeded_with_three_books() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/api/books").await;

    assert_eq!(status, StatusCode::OK);
    let books: Vec<BookResponse> = serde_json::from_value(body).unwrap();
    let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["The Great Gatsby", "To Kill a Mockingbird", "1984"]
    );
}

#[tokio::test]
async fn seeding_can_be_disabled() {
    let mut settings = Settings::default();
    settings.database.seed_on_empty = false;
    let app = TestApp::with_settings(settings).await;

    let (status, body) = app.get("/api/books").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn create_returns_201_with_location() {
    let app = TestApp::spawn().await;

    let (status, headers, body) = app
        .send(
            Method::POST,
            "/api/books",
            Some(json!({ "title": "1984", "author": "G. Orwell" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();
    assert!(id > 0);
    assert_eq!(body["title"], "1984");
    assert_eq!(body["author"], "G. Orwell");
    assert!(body.get("description").is_none());
    assert!(body["createdAt"].is_string());
    assert!(body.get("updatedAt").is_none());
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        &format!("/api/books/{}", id)
    );

    let (status, fetched) = app.get(&format!("/api/books/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn create_reports_every_invalid_field() {
    let app = TestApp::spawn().await;

    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/books",
            Some(json!({
                "title": "t".repeat(201),
                "author": "",
                "description": "d".repeat(1001)
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "title": "Title cannot exceed 200 characters",
            "author": "Author is required",
            "description": "Description cannot exceed 1000 characters"
        })
    );

    let (_, list) = app.get("/api/books").await;
    assert_eq!(list.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn missing_fields_are_required() {
    let app = TestApp::spawn().await;

    let (status, _, body) = app
        .send(Method::POST, "/api/books", Some(json!({})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Title is required");
    assert_eq!(body["author"], "Author is required");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::spawn().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/books")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_book_is_404() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/api/books/999999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Book with ID 999999 not found" }));
}

#[tokio::test]
async fn non_numeric_id_is_a_bad_request() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/api/books/abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn update_of_missing_book_is_404() {
    let app = TestApp::spawn().await;

    let (status, _, body) = app
        .send(
            Method::PUT,
            "/api/books/999999",
            Some(json!({ "title": "Valid", "author": "Also Valid" })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Book with ID 999999 not found");
}

#[tokio::test]
async fn update_validates_before_existence() {
    let app = TestApp::spawn().await;

    let (status, _, body) = app
        .send(
            Method::PUT,
            "/api/books/999999",
            Some(json!({ "title": "", "author": "Someone" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "title": "Title is required" }));
}

#[tokio::test]
async fn update_replaces_fields_and_stamps_updated_at() {
    let app = TestApp::spawn().await;
    let (_, _, created) = app
        .send(
            Method::POST,
            "/api/books",
            Some(json!({ "title": "Draft", "author": "Anon", "description": "first pass" })),
        )
        .await;
    let created: BookResponse = serde_json::from_value(created).unwrap();

    let (status, _, body) = app
        .send(
            Method::PUT,
            &format!("/api/books/{}", created.id),
            Some(json!({ "title": "Final", "author": "Known Author" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let updated: BookResponse = serde_json::from_value(body).unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.author, "Known Author");
    assert_eq!(updated.description, None);
    assert!(updated.updated_at.unwrap() >= updated.created_at);
}

#[tokio::test]
async fn delete_twice_is_200_then_404() {
    let app = TestApp::spawn().await;

    let (status, _, body) = app.send(Method::DELETE, "/api/books/3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "message": "Book '1984' has been successfully deleted", "id": 3 })
    );

    let (status, _, _) = app.send(Method::DELETE, "/api/books/3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/books/3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = app.get("/api/books").await;
    assert_eq!(list.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn nul_characters_count_like_any_other() {
    let app = TestApp::spawn().await;

    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/books",
            Some(json!({ "title": "\u{0}Dune", "author": "\u{0}X" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "\u{0}Dune");
    let id = body["id"].as_i64().unwrap();

    let (status, _, body) = app
        .send(
            Method::PUT,
            &format!("/api/books/{}", id),
            Some(json!({
                "title": "\u{0}Dune Messiah",
                "author": "Frank Herbert",
                "description": format!("\u{0}{}", "d".repeat(999))
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "\u{0}Dune Messiah");
}

#[tokio::test]
async fn storage_failure_is_a_500_with_cause() {
    let app = TestApp::spawn().await;
    app.db
        .lock()
        .unwrap()
        .execute_batch("DROP TABLE books;")
        .unwrap();

    let (status, body) = app.get("/api/books").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "An error occurred while retrieving books");
    assert!(body["error"].as_str().unwrap().contains("books"));
}

#[tokio::test]
async fn reinitialization_does_not_reseed() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.database.path = dir.path().join("library.db").display().to_string();

    for _ in 0..2 {
        let db = Database::open(&settings.database).unwrap();
        shelf_app::prepare(&settings, &db).await.unwrap();
    }

    let db = Database::open(&settings.database).unwrap();
    let count: i64 = db
        .lock()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn module_health_and_openapi_are_exposed() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/api/books/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("books module is healthy"));

    let (status, spec) = app.get("/docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(spec["paths"]["/api/books"]["post"].is_object());
    assert!(spec["paths"]["/api/books/{id}"]["delete"].is_object());
    assert!(spec["components"]["schemas"]["Book"].is_object());
}
