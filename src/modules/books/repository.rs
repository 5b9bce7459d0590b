//! Persistence for the `books` table.

use async_trait::async_trait;
use bookstore_db::Database;
use thiserror::Error;

use super::models::{Book, BookChanges};

/// Outcomes of a repository call other than success.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("no book with isbn '{isbn}'")]
    NotFound { isbn: String },

    /// The storage engine rejected the write, e.g. a duplicate ISBN.
    #[error("constraint violation for isbn '{isbn}': {message}")]
    ConstraintViolation { isbn: String, message: String },

    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    /// Classify a write failure, separating constraint rejections from
    /// infrastructure errors.
    fn from_write(isbn: &str, err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation() || db_err.is_check_violation() =>
            {
                Self::ConstraintViolation {
                    isbn: isbn.to_string(),
                    message: db_err.message().to_string(),
                }
            }
            _ => Self::Database(err),
        }
    }
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All books, in ISBN order.
    async fn list_all(&self) -> Result<Vec<Book>, RepositoryError>;

    async fn get_by_isbn(&self, isbn: &str) -> Result<Book, RepositoryError>;

    /// Insert a new book and return it as stored.
    async fn create(&self, book: &Book) -> Result<Book, RepositoryError>;

    /// Replace every non-key field of the book with the given ISBN.
    async fn update(&self, isbn: &str, changes: &BookChanges) -> Result<Book, RepositoryError>;

    async fn remove(&self, isbn: &str) -> Result<(), RepositoryError>;
}

/// [`BookRepository`] backed by the service's SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteBookRepository {
    db: Database,
}

impl SqliteBookRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

const COLUMNS: &str = "isbn, amazon_url, author, language, pages, publisher, title, year";

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn list_all(&self) -> Result<Vec<Book>, RepositoryError> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {COLUMNS} FROM books ORDER BY isbn"
        ))
        .fetch_all(self.db.pool())
        .await?;

        tracing::debug!(count = books.len(), "listed books");
        Ok(books)
    }

    async fn get_by_isbn(&self, isbn: &str) -> Result<Book, RepositoryError> {
        sqlx::query_as::<_, Book>(&format!("SELECT {COLUMNS} FROM books WHERE isbn = ?"))
            .bind(isbn)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| RepositoryError::NotFound {
                isbn: isbn.to_string(),
            })
    }

    async fn create(&self, book: &Book) -> Result<Book, RepositoryError> {
        let created = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books ({COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&book.isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| RepositoryError::from_write(&book.isbn, e))?;

        tracing::info!(isbn = %created.isbn, "book created");
        Ok(created)
    }

    async fn update(&self, isbn: &str, changes: &BookChanges) -> Result<Book, RepositoryError> {
        let updated = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books SET
                amazon_url = ?, author = ?, language = ?, pages = ?,
                publisher = ?, title = ?, year = ?
            WHERE isbn = ?
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&changes.amazon_url)
        .bind(&changes.author)
        .bind(&changes.language)
        .bind(changes.pages)
        .bind(&changes.publisher)
        .bind(&changes.title)
        .bind(changes.year)
        .bind(isbn)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| RepositoryError::from_write(isbn, e))?
        .ok_or_else(|| RepositoryError::NotFound {
            isbn: isbn.to_string(),
        })?;

        tracing::info!(isbn = %updated.isbn, "book updated");
        Ok(updated)
    }

    async fn remove(&self, isbn: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = ?")
            .bind(isbn)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                isbn: isbn.to_string(),
            });
        }

        tracing::info!(%isbn, "book deleted");
        Ok(())
    }
}
