//! Error type definitions for the sheet catalog
//!
//! The hierarchy mirrors the layers: repository failures are wrapped by the
//! application error, which the web layer turns into a status code.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed request input (sort clause, limit, page)
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A required path segment is missing or blank
    #[error("Missing parameter: {name}")]
    MissingParameter { name: String },

    /// Resource not found errors
    #[error("Not found: {resource} '{id}'")]
    NotFound { resource: String, id: String },

    /// Missing, malformed or expired credentials
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// A safe name that would resolve outside the asset root
    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    /// The repository refused to delete a record
    #[error("Deletion failed: {message}")]
    DeletionFailed { message: String },

    /// Repository layer errors
    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Repository layer specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database errors from SeaORM
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Constraint violations (unique, foreign key, etc.)
    #[error("Constraint violation: {constraint} - {message}")]
    ConstraintViolation { constraint: String, message: String },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a missing parameter error
    pub fn missing_parameter<S: Into<String>>(name: S) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path<S: Into<String>>(message: S) -> Self {
        Self::InvalidPath {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
