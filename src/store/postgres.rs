use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::{error::SqlState, Client, NoTls, Row};

use super::{BookStore, StoreError};
use crate::types::book::{Book, BookChanges, NewBook};

const COLUMNS: &str = "isbn, amazon_url, author, language, pages, publisher, title, year";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS books (
    isbn TEXT PRIMARY KEY,
    amazon_url TEXT NOT NULL,
    author TEXT NOT NULL,
    language TEXT NOT NULL,
    pages INTEGER NOT NULL,
    publisher TEXT NOT NULL,
    title TEXT NOT NULL,
    year INTEGER NOT NULL
)";

/// A [`BookStore`] backed by the `books` table of a PostgreSQL database.
///
/// Holds a single client. Queries from concurrent requests are pipelined over its connection.
pub struct PostgresBookStore {
    client: Client,
    connection: JoinHandle<()>,
}

impl PostgresBookStore {
    #[tracing::instrument(name = "postgres_connect", skip_all)]
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let (client, connection) = tokio_postgres::connect(url, NoTls)
            .await
            .map_err(|err| StoreError::Unavailable(format!("Failed to connect: {err}")))?;

        let connection = tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::error!(%err, "Database connection failed");
            }
        });

        tracing::info!("Connected");

        Ok(Self { client, connection })
    }

    /// Creates the `books` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.client
            .batch_execute(CREATE_TABLE)
            .await
            .map_err(map_error)?;

        Ok(())
    }
}

#[async_trait]
impl BookStore for PostgresBookStore {
    async fn insert(&self, book: NewBook) -> Result<Book, StoreError> {
        let statement = format!(
            "INSERT INTO books ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {COLUMNS}"
        );

        let row = self
            .client
            .query_one(
                &statement,
                &[
                    &book.isbn,
                    &book.amazon_url,
                    &book.author,
                    &book.language,
                    &book.pages,
                    &book.publisher,
                    &book.title,
                    &book.year,
                ],
            )
            .await
            .map_err(|err| match err.code() {
                Some(code) if *code == SqlState::UNIQUE_VIOLATION => StoreError::Conflict {
                    isbn: book.isbn.clone(),
                },
                _ => map_error(err),
            })?;

        book_from_row(&row)
    }

    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let statement = format!("SELECT {COLUMNS} FROM books ORDER BY title");

        self.client
            .query(&statement, &[])
            .await
            .map_err(map_error)?
            .iter()
            .map(book_from_row)
            .collect()
    }

    async fn get(&self, isbn: &str) -> Result<Option<Book>, StoreError> {
        let statement = format!("SELECT {COLUMNS} FROM books WHERE isbn = $1");

        self.client
            .query_opt(&statement, &[&isbn])
            .await
            .map_err(map_error)?
            .as_ref()
            .map(book_from_row)
            .transpose()
    }

    async fn update(&self, isbn: &str, changes: BookChanges) -> Result<Option<Book>, StoreError> {
        let statement = format!(
            "UPDATE books SET amazon_url = $1, author = $2, language = $3, pages = $4, \
             publisher = $5, title = $6, year = $7 WHERE isbn = $8 RETURNING {COLUMNS}"
        );

        self.client
            .query_opt(
                &statement,
                &[
                    &changes.amazon_url,
                    &changes.author,
                    &changes.language,
                    &changes.pages,
                    &changes.publisher,
                    &changes.title,
                    &changes.year,
                    &isbn,
                ],
            )
            .await
            .map_err(map_error)?
            .as_ref()
            .map(book_from_row)
            .transpose()
    }

    async fn delete(&self, isbn: &str) -> Result<bool, StoreError> {
        let deleted = self
            .client
            .execute("DELETE FROM books WHERE isbn = $1", &[&isbn])
            .await
            .map_err(map_error)?;

        Ok(deleted > 0)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        self.client
            .execute("DELETE FROM books", &[])
            .await
            .map_err(map_error)
    }

    async fn close(&self) {
        self.connection.abort();

        tracing::info!("Database connection closed");
    }
}

fn book_from_row(row: &Row) -> Result<Book, StoreError> {
    let decode = |err: tokio_postgres::Error| StoreError::Corrupt(err.to_string());

    Ok(Book {
        isbn: row.try_get("isbn").map_err(decode)?,
        amazon_url: row.try_get("amazon_url").map_err(decode)?,
        author: row.try_get("author").map_err(decode)?,
        language: row.try_get("language").map_err(decode)?,
        pages: row.try_get("pages").map_err(decode)?,
        publisher: row.try_get("publisher").map_err(decode)?,
        title: row.try_get("title").map_err(decode)?,
        year: row.try_get("year").map_err(decode)?,
    })
}

/// Integrity constraint violations live in SQLSTATE class `23`.
fn map_error(err: tokio_postgres::Error) -> StoreError {
    match err.code() {
        Some(code) if *code == SqlState::UNIQUE_VIOLATION => {
            StoreError::Constraint(String::from("Unique constraint violated"))
        }
        Some(code) if code.code().starts_with("23") => {
            StoreError::Constraint(format!("Integrity constraint {} violated", code.code()))
        }
        _ => StoreError::Unavailable(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book() -> NewBook {
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

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database at DATABASE_URL"]
    async fn round_trips_through_postgres() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL is not set");
        let store = PostgresBookStore::connect(&url).await.unwrap();
        store.ensure_schema().await.unwrap();
        store.clear().await.unwrap();

        let book = store.insert(new_book()).await.unwrap();
        assert_eq!(book.author, "Tester McTesterson");

        assert!(matches!(
            store.insert(new_book()).await,
            Err(StoreError::Conflict { .. })
        ));

        assert_eq!(store.get("123456789").await.unwrap(), Some(book));
        assert_eq!(store.get("99999999").await.unwrap(), None);
        assert!(store.delete("123456789").await.unwrap());
        assert!(!store.delete("123456789").await.unwrap());

        store.close().await;
    }
}
