//! Repository Module
//!
//! Plain CRUD over the SQLite tables. Repositories are modules of free
//! functions taking a pool (or a connection, when the caller owns the
//! transaction); business rules live in the engine modules on top.

pub mod cart;
pub mod customization;
pub mod order;
pub mod product;

use shared::error::{AppError, ErrorCode};
use shared::models::InvalidValue;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<InvalidValue> for RepoError {
    fn from(err: InvalidValue) -> Self {
        // A stored enum value that no longer parses is corrupted data
        RepoError::Database(format!("corrupted row: {err}"))
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Database(msg) => AppError::database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
