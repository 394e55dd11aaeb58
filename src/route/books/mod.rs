use std::marker::PhantomData;

use axum::http::{HeaderMap, StatusCode};
use schemars::{gen::SchemaGenerator, schema::Schema, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{
        ApiError, ErrorVerbosity, InternalServerError, ResourceError, ResourceErrorProvider,
        ValidationError,
    },
    schema::Violation,
    store::StoreError,
};

pub mod app;
pub mod create_book;
pub mod delete_book;
pub mod get_book;
pub mod list_books;
pub mod update_book;

const INVALID_BOOK: &str = "Invalid book";

/// Raw JSON body, checked against the book schema by the handler instead of by serde.
///
/// Documented with the schema of `T`.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct Payload<T> {
    value: Value,
    #[serde(skip)]
    target: PhantomData<T>,
}

impl<T> Payload<T> {
    pub fn into_inner(self) -> Value {
        self.value
    }
}

impl<T: JsonSchema> JsonSchema for Payload<T> {
    fn schema_name() -> String {
        T::schema_name()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        T::json_schema(gen)
    }
}

#[derive(Debug, Deserialize)]
pub struct IsbnPath {
    pub isbn: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "book_error_type")]
pub enum BookErrorType {
    NotFound {
        #[serde(skip)]
        isbn: String,
    },
    IsbnImmutable,
    AlreadyExists {
        #[serde(skip)]
        isbn: String,
    },
    Rejected {
        #[serde(skip)]
        reason: String,
    },
}

impl ResourceErrorProvider for BookErrorType {
    fn headers(&self) -> Option<HeaderMap> {
        None
    }

    fn status_code(&self) -> StatusCode {
        match self {
            BookErrorType::NotFound { .. } => StatusCode::NOT_FOUND,
            BookErrorType::IsbnImmutable => StatusCode::BAD_REQUEST,
            BookErrorType::AlreadyExists { .. } => StatusCode::CONFLICT,
            BookErrorType::Rejected { .. } => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            BookErrorType::NotFound { .. } => "Book not found",
            BookErrorType::IsbnImmutable => "Cannot change isbn",
            BookErrorType::AlreadyExists { .. } => "Book already exists",
            BookErrorType::Rejected { .. } => "Book rejected by storage",
        }
    }

    fn reason(&self) -> String {
        match self {
            BookErrorType::NotFound { isbn } => format!("Book with isbn {isbn} not found"),
            BookErrorType::IsbnImmutable => {
                String::from("isbn must not be part of an update payload")
            }
            BookErrorType::AlreadyExists { isbn } => {
                format!("Book with isbn {isbn} already exists")
            }
            BookErrorType::Rejected { reason } => reason.clone(),
        }
    }
}

fn book_error(verbosity: ErrorVerbosity, error_type: BookErrorType) -> ApiError {
    ResourceError::new(verbosity, error_type).into()
}

fn invalid_book(verbosity: ErrorVerbosity, violations: &[Violation]) -> ApiError {
    tracing::warn!(?violations, "Invalid book");

    ValidationError::from_violations(verbosity, INVALID_BOOK, violations).into()
}

fn not_found(verbosity: ErrorVerbosity, isbn: String) -> ApiError {
    tracing::debug!(%isbn, "Book not found");

    book_error(verbosity, BookErrorType::NotFound { isbn })
}

/// Store failures other than absence. Driver details only reach the client with full verbosity.
fn store_error(verbosity: ErrorVerbosity, err: StoreError) -> ApiError {
    match err {
        StoreError::Conflict { isbn } => {
            tracing::warn!(%isbn, "Book already exists");

            book_error(verbosity, BookErrorType::AlreadyExists { isbn })
        }
        StoreError::Constraint(reason) => {
            tracing::warn!(%reason, "Book rejected by storage");

            book_error(verbosity, BookErrorType::Rejected { reason })
        }
        err @ (StoreError::Unavailable(_) | StoreError::Corrupt(_)) => {
            InternalServerError::from_generic_error(verbosity, err).into()
        }
    }
}
