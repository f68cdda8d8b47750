//! Centralized error handling for the sheet catalog
//!
//! This module unifies the error types of every layer so that handlers can map
//! any failure to an HTTP status in one place.
//!
//! # Error Categories
//!
//! - **Validation Errors**: malformed sort clauses, limits, pages, blank path segments
//! - **Not Found**: a safe name with no record, or an asset file that is absent
//! - **Unauthorized**: missing or invalid bearer token
//! - **Invalid Path**: a safe name that would leave the asset root
//! - **Storage Errors**: repository failures other than not-found
//!
//! # Usage
//!
//! ```rust
//! use sheet_catalog::errors::{AppError, AppResult};
//!
//! fn require_page(page: u64) -> AppResult<u64> {
//!     if page == 0 {
//!         return Err(AppError::validation("page must be >= 1"));
//!     }
//!     Ok(page)
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Repository Results
pub type RepositoryResult<T> = Result<T, RepositoryError>;
