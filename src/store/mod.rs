use async_trait::async_trait;

use crate::types::book::{Book, BookChanges, NewBook};

mod memory;
mod postgres;

pub use memory::InMemoryBookStore;
pub use postgres::PostgresBookStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Book with isbn {isbn} already exists")]
    Conflict { isbn: String },
    #[error("Constraint violated: {0}")]
    Constraint(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Stored row could not be decoded: {0}")]
    Corrupt(String),
}

/// Persistent storage for books.
///
/// Absence is reported through `Option`/`bool` results, never through [`StoreError`].
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Inserts a book and returns the stored record.
    async fn insert(&self, book: NewBook) -> Result<Book, StoreError>;

    /// Returns every book, ordered by title.
    async fn list(&self) -> Result<Vec<Book>, StoreError>;

    async fn get(&self, isbn: &str) -> Result<Option<Book>, StoreError>;

    /// Replaces the mutable fields of a book. Returns `None` if no book has that isbn.
    async fn update(&self, isbn: &str, changes: BookChanges) -> Result<Option<Book>, StoreError>;

    /// Returns `false` if no book has that isbn.
    async fn delete(&self, isbn: &str) -> Result<bool, StoreError>;

    /// Deletes every book and returns how many were removed.
    async fn clear(&self) -> Result<u64, StoreError>;

    /// Tears down the underlying connection. Calls made afterwards fail with [`StoreError::Unavailable`].
    async fn close(&self);
}
