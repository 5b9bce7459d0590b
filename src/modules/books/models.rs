use serde::{Deserialize, Serialize};

/// A catalogued book, one row of the `books` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// ISBN, the primary key; never changes after creation
    pub isbn: String,
    /// Link to the book's Amazon listing
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i64,
    pub publisher: String,
    pub title: String,
    /// Publication year
    pub year: i64,
}

/// Every non-key field of a book, as supplied to an update.
///
/// The ISBN comes from the request path, so it has no place here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookChanges {
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i64,
    pub publisher: String,
    pub title: String,
    pub year: i64,
}

impl BookChanges {
    /// Attach the key the changes apply to.
    pub fn into_book(self, isbn: impl Into<String>) -> Book {
        Book {
            isbn: isbn.into(),
            amazon_url: self.amazon_url,
            author: self.author,
            language: self.language,
            pages: self.pages,
            publisher: self.publisher,
            title: self.title,
            year: self.year,
        }
    }
}

/// Response body for a single book.
#[derive(Debug, Serialize)]
pub struct BookEnvelope {
    pub book: Book,
}

/// Response body for the book listing.
#[derive(Debug, Serialize)]
pub struct BookList {
    pub books: Vec<Book>,
}

/// Response body for operations that only confirm success.
#[derive(Debug, Serialize)]
pub struct Confirmation {
    pub message: &'static str,
}
