use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BookStore, StoreError};
use crate::types::book::{Book, BookChanges, NewBook};

/// A [`BookStore`] kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryBookStore {
    books: RwLock<BTreeMap<String, Book>>,
    closed: AtomicBool,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        match self.closed.load(Ordering::Acquire) {
            true => Err(StoreError::Unavailable(String::from("Store is closed"))),
            false => Ok(()),
        }
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn insert(&self, book: NewBook) -> Result<Book, StoreError> {
        self.ensure_open()?;

        let mut books = self.books.write().await;

        if books.contains_key(&book.isbn) {
            return Err(StoreError::Conflict { isbn: book.isbn });
        }

        let book = Book::from(book);
        books.insert(book.isbn.clone(), book.clone());

        Ok(book)
    }

    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        self.ensure_open()?;

        let mut books: Vec<Book> = self.books.read().await.values().cloned().collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));

        Ok(books)
    }

    async fn get(&self, isbn: &str) -> Result<Option<Book>, StoreError> {
        self.ensure_open()?;

        Ok(self.books.read().await.get(isbn).cloned())
    }

    async fn update(&self, isbn: &str, changes: BookChanges) -> Result<Option<Book>, StoreError> {
        self.ensure_open()?;

        let mut books = self.books.write().await;

        let Some(book) = books.get_mut(isbn) else {
            return Ok(None);
        };

        *book = Book::with_changes(book.isbn.clone(), changes);

        Ok(Some(book.clone()))
    }

    async fn delete(&self, isbn: &str) -> Result<bool, StoreError> {
        self.ensure_open()?;

        Ok(self.books.write().await.remove(isbn).is_some())
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        self.ensure_open()?;

        let mut books = self.books.write().await;
        let removed = books.len() as u64;
        books.clear();

        Ok(removed)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
