use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// A persisted book, addressed by its `isbn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, ToSchema)]
pub struct Book {
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i32,
    pub publisher: String,
    pub title: String,
    pub year: i32,
}

impl Book {
    /// Builds the stored representation of a book, keeping `isbn` and replacing everything else.
    pub fn with_changes(isbn: String, changes: BookChanges) -> Self {
        Book {
            isbn,
            amazon_url: changes.amazon_url,
            author: changes.author,
            language: changes.language,
            pages: changes.pages,
            publisher: changes.publisher,
            title: changes.title,
            year: changes.year,
        }
    }
}

impl From<NewBook> for Book {
    fn from(new_book: NewBook) -> Self {
        Book {
            isbn: new_book.isbn,
            amazon_url: new_book.amazon_url,
            author: new_book.author,
            language: new_book.language,
            pages: new_book.pages,
            publisher: new_book.publisher,
            title: new_book.title,
            year: new_book.year,
        }
    }
}

/// Payload accepted by `POST /books`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, ToSchema, Validate)]
pub struct NewBook {
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub isbn: String,
    #[validate(url(message = "Must be a valid URL"))]
    pub amazon_url: String,
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub author: String,
    pub language: String,
    #[validate(range(min = 1, message = "Must be a positive number"))]
    pub pages: i32,
    pub publisher: String,
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub title: String,
    #[validate(range(min = 1000, max = 9999, message = "Must be a four-digit year"))]
    pub year: i32,
}

/// Payload accepted by `PUT /books/:isbn`.
///
/// Replaces every mutable field of the book. `isbn` is not part of it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, ToSchema, Validate)]
pub struct BookChanges {
    #[validate(url(message = "Must be a valid URL"))]
    pub amazon_url: String,
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub author: String,
    pub language: String,
    #[validate(range(min = 1, message = "Must be a positive number"))]
    pub pages: i32,
    pub publisher: String,
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub title: String,
    #[validate(range(min = 1000, max = 9999, message = "Must be a four-digit year"))]
    pub year: i32,
}
