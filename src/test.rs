use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{
    error::ErrorVerbosity,
    server::{self, ServerConfig},
    state::ApiState,
    store::{BookStore, InMemoryBookStore, StoreError},
    types::book::{Book, BookChanges, NewBook},
};

#[tokio::test]
async fn example_config_is_valid() {
    let config = ServerConfig::from_config_file("config.example.yaml")
        .await
        .expect("Example config is not parsable");

    assert!(config.database().create_schema());
}

fn seeded_book() -> NewBook {
    NewBook {
        isbn: String::from("123456789"),
        amazon_url: String::from("https://amazon.com/hello"),
        author: String::from("Tester McTesterson"),
        language: String::from("English"),
        pages: 103,
        publisher: String::from("Fake Publishers"),
        title: String::from("Testing the Tester"),
        year: 2013,
    }
}

fn update_payload() -> Value {
    json!({
        "amazon_url": "https://amazon.com/booky",
        "author": "Nobody Personton",
        "language": "English",
        "pages": 440,
        "publisher": "Test Publisher Inc.",
        "title": "What it is like being someone?",
        "year": 2017
    })
}

async fn seeded_app(verbosity: ErrorVerbosity) -> (Router, Arc<InMemoryBookStore>) {
    let store = Arc::new(InMemoryBookStore::new());
    store
        .insert(seeded_book())
        .await
        .expect("Failed to seed the store");

    let app = server::app(ApiState::new(verbosity, store.clone()), false);

    (app, store)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed");

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();

    let body = match bytes.is_empty() {
        true => Value::Null,
        false => serde_json::from_slice(&bytes).expect("Body is not JSON"),
    };

    (status, body)
}

#[tokio::test]
async fn create_book() {
    let (app, store) = seeded_app(ErrorVerbosity::Message).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({
            "isbn": "987654321",
            "amazon_url": "https://amazon.com/book",
            "author": "Nobody Person",
            "language": "English",
            "pages": 400,
            "publisher": "Test Publisher",
            "title": "What it is like being someone",
            "year": 2018
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["book"]["isbn"], "987654321");
    assert_eq!(body["book"]["pages"], 400);
    assert_eq!(store.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn create_book_with_missing_fields_is_rejected() {
    let (app, store) = seeded_app(ErrorVerbosity::Message).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "author": "testing", "year": 2014 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid book");
    assert_eq!(body["errors"].as_array().map(Vec::len), Some(6));
    assert_eq!(body["errors"][0], "\"isbn\" is required");
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_book_with_duplicate_isbn_conflicts() {
    let (app, _) = seeded_app(ErrorVerbosity::Message).await;

    let payload = serde_json::to_value(seeded_book()).unwrap();
    let (status, body) = send(&app, Method::POST, "/books", Some(payload)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "message": "Book already exists" }));
}

#[tokio::test]
async fn create_book_with_malformed_body_is_rejected() {
    let (app, _) = seeded_app(ErrorVerbosity::Message).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/books")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_books() {
    let (app, _) = seeded_app(ErrorVerbosity::Message).await;

    let (status, body) = send(&app, Method::GET, "/books", None).await;

    assert_eq!(status, StatusCode::OK);

    let books = body["books"].as_array().expect("books is not an array");
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["isbn"], "123456789");
    assert_eq!(books[0]["publisher"], "Fake Publishers");
}

#[tokio::test]
async fn get_book() {
    let (app, _) = seeded_app(ErrorVerbosity::Message).await;

    let (status, body) = send(&app, Method::GET, "/books/123456789", None).await;

    assert_eq!(status, StatusCode::OK);

    let book: Book = serde_json::from_value(body["book"].clone()).expect("Not a book");
    assert_eq!(book.isbn, "123456789");
    assert_eq!(book.author, "Tester McTesterson");
}

#[tokio::test]
async fn get_unknown_book_is_not_found() {
    let (app, _) = seeded_app(ErrorVerbosity::Message).await;

    let (status, body) = send(&app, Method::GET, "/books/99999999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Book not found" }));
}

#[tokio::test]
async fn not_found_names_the_isbn_with_full_verbosity() {
    let (app, _) = seeded_app(ErrorVerbosity::Full).await;

    let (status, body) = send(&app, Method::GET, "/books/99999999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["resource_error_type"]["book_error_type"], "NotFound");
    assert_eq!(
        body["error"]["resource_error_reason"],
        "Book with isbn 99999999 not found"
    );
}

#[tokio::test]
async fn update_book() {
    let (app, store) = seeded_app(ErrorVerbosity::Message).await;

    let (status, body) = send(&app, Method::PUT, "/books/123456789", Some(update_payload())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["isbn"], "123456789");
    assert_eq!(body["book"]["author"], "Nobody Personton");
    assert_eq!(body["book"]["pages"], 440);

    let stored = store.get("123456789").await.unwrap().unwrap();
    assert_eq!(stored.year, 2017);
}

#[tokio::test]
async fn update_book_cannot_change_isbn() {
    let (app, store) = seeded_app(ErrorVerbosity::Message).await;

    let mut payload = update_payload();
    payload["isbn"] = json!("99999999999");

    let (status, body) = send(&app, Method::PUT, "/books/123456789", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot change isbn");

    let stored = store.get("123456789").await.unwrap().unwrap();
    assert_eq!(stored.author, "Tester McTesterson");
    assert_eq!(store.get("99999999999").await.unwrap(), None);
}

#[tokio::test]
async fn update_book_rejects_isbn_even_when_unchanged() {
    let (app, _) = seeded_app(ErrorVerbosity::Message).await;

    let mut payload = update_payload();
    payload["isbn"] = json!("123456789");

    let (status, body) = send(&app, Method::PUT, "/books/123456789", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot change isbn");
}

#[tokio::test]
async fn update_book_with_invalid_fields_is_rejected() {
    let (app, _) = seeded_app(ErrorVerbosity::Message).await;

    let mut payload = update_payload();
    payload["pages"] = json!("many");

    let (status, body) = send(&app, Method::PUT, "/books/123456789", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["\"pages\" must be an integer"]));
}

#[tokio::test]
async fn update_unknown_book_is_not_found() {
    let (app, _) = seeded_app(ErrorVerbosity::Message).await;

    let (status, body) = send(&app, Method::PUT, "/books/99999999", Some(update_payload())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Book not found");
}

#[tokio::test]
async fn delete_book() {
    let (app, _) = seeded_app(ErrorVerbosity::Message).await;

    let (status, body) = send(&app, Method::DELETE, "/books/123456789", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Book deleted" }));

    let (status, _) = send(&app, Method::GET, "/books/123456789", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/books/123456789", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

struct UnavailableStore;

impl UnavailableStore {
    fn error() -> StoreError {
        StoreError::Unavailable(String::from("connection to 10.0.0.7:5432 refused"))
    }
}

#[async_trait]
impl BookStore for UnavailableStore {
    async fn insert(&self, _book: NewBook) -> Result<Book, StoreError> {
        Err(Self::error())
    }

    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        Err(Self::error())
    }

    async fn get(&self, _isbn: &str) -> Result<Option<Book>, StoreError> {
        Err(Self::error())
    }

    async fn update(&self, _isbn: &str, _changes: BookChanges) -> Result<Option<Book>, StoreError> {
        Err(Self::error())
    }

    async fn delete(&self, _isbn: &str) -> Result<bool, StoreError> {
        Err(Self::error())
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        Err(Self::error())
    }

    async fn close(&self) {}
}

fn unavailable_app(verbosity: ErrorVerbosity) -> Router {
    server::app(ApiState::new(verbosity, Arc::new(UnavailableStore)), false)
}

#[tokio::test]
async fn store_failures_do_not_leak_details() {
    let app = unavailable_app(ErrorVerbosity::Type);

    let (status, body) = send(&app, Method::GET, "/books", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "An internal server error has occurred");
    assert!(!body.to_string().contains("10.0.0.7"));
}

#[tokio::test]
async fn isbn_change_is_rejected_before_reaching_the_store() {
    let app = unavailable_app(ErrorVerbosity::Message);

    let mut payload = update_payload();
    payload["isbn"] = json!("99999999999");

    let (status, body) = send(&app, Method::PUT, "/books/123456789", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot change isbn");
}

#[tokio::test]
async fn invalid_book_is_rejected_before_reaching_the_store() {
    let app = unavailable_app(ErrorVerbosity::Message);

    let (status, _) = send(&app, Method::POST, "/books", Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (app, _) = seeded_app(ErrorVerbosity::Message).await;

    let (status, body) = send(&app, Method::GET, "/authors", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "The requested resource was not found");
}

#[tokio::test]
async fn wrong_method_is_not_allowed() {
    let (app, _) = seeded_app(ErrorVerbosity::Message).await;

    let (status, body) = send(&app, Method::PATCH, "/books/123456789", None).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["message"], "Method not allowed");
}

#[tokio::test]
async fn openapi_document_lists_book_routes() {
    let (app, _) = seeded_app(ErrorVerbosity::Message).await;

    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/books"].is_object());
    assert!(body["paths"]["/books/{isbn}"]["put"].is_object());
}

const VERBOSITIES: [ErrorVerbosity; 3] = [
    ErrorVerbosity::Message,
    ErrorVerbosity::Type,
    ErrorVerbosity::Full,
];

#[tokio::test]
async fn every_verbosity_keeps_status_and_message() {
    for verbosity in VERBOSITIES {
        let (app, store) = seeded_app(verbosity).await;

        for method in [Method::GET, Method::DELETE] {
            let (status, body) = send(&app, method.clone(), "/books/99999999", None).await;

            assert_eq!(status, StatusCode::NOT_FOUND, "{method} with {verbosity:?}");
            assert_eq!(body["message"], "Book not found", "{method} with {verbosity:?}");
        }

        let (status, body) =
            send(&app, Method::PUT, "/books/99999999", Some(update_payload())).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{verbosity:?}");
        assert_eq!(body["message"], "Book not found", "{verbosity:?}");

        let mut payload = update_payload();
        payload["isbn"] = json!("99999999999");

        let (status, body) = send(&app, Method::PUT, "/books/123456789", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{verbosity:?}");
        assert_eq!(body["message"], "Cannot change isbn", "{verbosity:?}");

        let (status, body) = send(&app, Method::POST, "/books", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{verbosity:?}");
        assert_eq!(body["message"], "Invalid book", "{verbosity:?}");
        assert!(body["errors"].is_array(), "{verbosity:?}");

        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}

/// Accepts lookups but rejects every write with an integrity constraint violation.
struct ConstraintStore;

impl ConstraintStore {
    fn error() -> StoreError {
        StoreError::Constraint(String::from("Integrity constraint 23514 violated"))
    }
}

#[async_trait]
impl BookStore for ConstraintStore {
    async fn insert(&self, _book: NewBook) -> Result<Book, StoreError> {
        Err(Self::error())
    }

    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        Ok(Vec::new())
    }

    async fn get(&self, _isbn: &str) -> Result<Option<Book>, StoreError> {
        Ok(None)
    }

    async fn update(&self, _isbn: &str, _changes: BookChanges) -> Result<Option<Book>, StoreError> {
        Err(Self::error())
    }

    async fn delete(&self, _isbn: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        Ok(0)
    }

    async fn close(&self) {}
}

#[tokio::test]
async fn constraint_violations_are_rejected_as_bad_requests() {
    let app = server::app(
        ApiState::new(ErrorVerbosity::Message, Arc::new(ConstraintStore)),
        false,
    );

    let payload = serde_json::to_value(seeded_book()).unwrap();
    let (status, body) = send(&app, Method::POST, "/books", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Book rejected by storage" }));

    let (status, body) = send(&app, Method::PUT, "/books/123456789", Some(update_payload())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Book rejected by storage" }));
}

#[tokio::test]
async fn list_books_on_an_empty_store() {
    let store = Arc::new(InMemoryBookStore::new());
    let app = server::app(ApiState::new(ErrorVerbosity::Message, store), false);

    let (status, body) = send(&app, Method::GET, "/books", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "books": [] }));
}

#[tokio::test]
async fn response_body_tracing_passes_bodies_through() {
    let store = Arc::new(InMemoryBookStore::new());
    store.insert(seeded_book()).await.unwrap();

    let traced = server::app(ApiState::new(ErrorVerbosity::Message, store.clone()), true);
    let plain = server::app(ApiState::new(ErrorVerbosity::Message, store), false);

    for uri in ["/books", "/books/123456789", "/books/99999999"] {
        let traced = send(&traced, Method::GET, uri, None).await;
        let plain = send(&plain, Method::GET, uri, None).await;

        assert_eq!(traced, plain, "{uri}");
    }

    let (status, body) = send(&traced, Method::GET, "/books/123456789", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["author"], "Tester McTesterson");
}
