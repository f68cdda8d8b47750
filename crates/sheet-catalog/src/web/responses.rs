//! HTTP response types and utilities
//!
//! Every JSON body, success or failure, goes out in the [`ApiResponse`]
//! envelope. [`handle_error`] is the one place an [`AppError`] becomes a
//! status code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::error;
use utoipa::ToSchema;

use crate::errors::{AppError, AppResult};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Whether the operation was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
    /// Response timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create an error response
    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            details: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create an error response with details
    pub fn error_with_details(
        message: String,
        details: HashMap<String, String>,
    ) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            details: Some(details),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Helper function to convert AppResult to HTTP response
pub fn handle_result<T>(result: AppResult<T>) -> Response
where
    T: Serialize,
{
    match result {
        Ok(data) => ok(data).into_response(),
        Err(error) => handle_error(error),
    }
}

/// Status code for each error variant
pub fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation { .. } => StatusCode::BAD_REQUEST,
        AppError::MissingParameter { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AppError::InvalidPath { .. } => StatusCode::BAD_REQUEST,
        AppError::DeletionFailed { .. } => StatusCode::BAD_REQUEST,
        AppError::Storage(_) | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert AppError to appropriate HTTP response
pub fn handle_error(error: AppError) -> Response {
    let status = status_for(&error);
    let (message, details) = match &error {
        AppError::Validation { message } => (message.clone(), None),
        AppError::MissingParameter { name } => (
            format!("Missing required parameter '{name}'"),
            Some(HashMap::from([("parameter".to_string(), name.clone())])),
        ),
        AppError::NotFound { resource, id } => (
            format!("{resource} not found"),
            Some(HashMap::from([("id".to_string(), id.clone())])),
        ),
        AppError::Unauthorized { message } => (format!("Unauthorized: {message}"), None),
        AppError::InvalidPath { message } => (message.clone(), None),
        AppError::DeletionFailed { message } => (message.clone(), None),
        AppError::Storage(e) => {
            error!(error = %e, "Storage failure");
            ("Data access failed".to_string(), None)
        }
        AppError::Internal { message } => {
            error!(message = %message, "Internal failure");
            ("Internal server error".to_string(), None)
        }
    };

    let response = match details {
        Some(details) => ApiResponse::<()>::error_with_details(message, details),
        None => ApiResponse::<()>::error(message),
    };

    (status, Json(response)).into_response()
}

/// Success response helpers
pub fn ok<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

/// Error response helper for rejected request bodies
pub fn bad_request(message: &str) -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(message.to_string())),
    )
}

/// Liveness plus store reachability
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub database: DatabaseHealth,
    pub version: String,
    pub uptime_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DatabaseHealth {
    #[schema(example = "connected")]
    pub status: String,
    #[schema(example = "sqlite")]
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
