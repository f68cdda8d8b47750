//! Health check HTTP handlers

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::web::{
    AppState,
    extractors::RequestContext,
    responses::{ApiResponse, DatabaseHealth, HealthResponse, ok},
    utils::log_request,
};

/// Health check endpoint
///
/// Returns 200 when the database answers a ping, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and database are up", body = ApiResponse<HealthResponse>),
        (status = 503, description = "Database unreachable", body = ApiResponse<HealthResponse>),
    )
)]
pub async fn health_check(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    context: RequestContext,
) -> Response {
    log_request(&method, &uri, &context);

    let database = match state.database.ping().await {
        Ok(()) => DatabaseHealth {
            status: "connected".to_string(),
            backend: state.database.database_type().to_string(),
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Health check database ping failed");
            DatabaseHealth {
                status: "disconnected".to_string(),
                backend: state.database.database_type().to_string(),
                error: Some(e.to_string()),
            }
        }
    };
    let healthy = database.error.is_none();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        database,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (chrono::Utc::now() - state.start_time).num_seconds(),
    };

    if healthy {
        ok(response).into_response()
    } else {
        let body = ApiResponse {
            success: false,
            data: Some(response),
            error: Some("Database unreachable".to_string()),
            details: None,
            timestamp: chrono::Utc::now(),
        };
        (StatusCode::SERVICE_UNAVAILABLE, axum::Json(body)).into_response()
    }
}
