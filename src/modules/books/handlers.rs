//! HTTP handlers for the book resource.
//!
//! Handlers are the only place repository and validation outcomes become
//! status codes.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use bookstore_http::error::AppError;
use serde_json::Value;

use super::models::{BookEnvelope, BookList, Confirmation};
use super::repository::{BookRepository, RepositoryError};
use super::schema::{self, Violations};

pub type SharedRepository = Arc<dyn BookRepository>;

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { isbn } => {
                AppError::not_found(format!("There is no book with an isbn '{}'", isbn))
            }
            // Duplicate keys are reported like any other storage failure
            err @ RepositoryError::ConstraintViolation { .. } => AppError::Internal(err.into()),
            err @ RepositoryError::Database(_) => AppError::Internal(err.into()),
        }
    }
}

impl From<Violations> for AppError {
    fn from(violations: Violations) -> Self {
        AppError::validation(violations.into_messages())
    }
}

/// GET /books
pub async fn list_books(
    State(repo): State<SharedRepository>,
) -> Result<Json<BookList>, AppError> {
    let books = repo.list_all().await?;
    Ok(Json(BookList { books }))
}

/// GET /books/{isbn}
pub async fn get_book(
    State(repo): State<SharedRepository>,
    Path(isbn): Path<String>,
) -> Result<Json<BookEnvelope>, AppError> {
    let book = repo.get_by_isbn(&isbn).await?;
    Ok(Json(BookEnvelope { book }))
}

/// POST /books
pub async fn create_book(
    State(repo): State<SharedRepository>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<BookEnvelope>), AppError> {
    let Json(payload) = payload?;
    let new_book = schema::validate_new_book(&payload)?;

    let book = repo.create(&new_book).await?;
    Ok((StatusCode::CREATED, Json(BookEnvelope { book })))
}

/// PUT /books/{isbn}
pub async fn update_book(
    State(repo): State<SharedRepository>,
    Path(isbn): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BookEnvelope>, AppError> {
    let Json(payload) = payload?;
    let changes = schema::validate_book_changes(&payload)?;

    let book = repo.update(&isbn, &changes).await?;
    Ok(Json(BookEnvelope { book }))
}

/// DELETE /books/{isbn}
pub async fn delete_book(
    State(repo): State<SharedRepository>,
    Path(isbn): Path<String>,
) -> Result<Json<Confirmation>, AppError> {
    repo.remove(&isbn).await?;
    Ok(Json(Confirmation {
        message: "Book deleted",
    }))
}
