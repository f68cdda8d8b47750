//! Web utility functions

use axum::http::{Method, Uri};
use tracing::info;

use super::extractors::RequestContext;

/// Log an incoming HTTP request
pub fn log_request(method: &Method, uri: &Uri, context: &RequestContext) {
    info!(
        method = %method,
        uri = %uri,
        request_id = %context.request_id,
        user_agent = ?context.user_agent,
        real_ip = ?context.real_ip,
        "HTTP request"
    );
}

/// The path segment unchanged, or `None` when it is empty or whitespace
pub fn non_blank(segment: &str) -> Option<&str> {
    (!segment.trim().is_empty()).then_some(segment)
}
