//! Request extractors
//!
//! Custom extractors for request metadata, bearer credentials and the
//! form-encoded listing parameters.

use axum::{
    Form,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::CONTENT_TYPE, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::responses::bad_request;
use crate::services::RawListParams;

/// Listing parameters, all optional and validated by the pagination engine
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ListSheetsRequest {
    /// `<field> [asc|desc]`; fields are title, composer, created_at, updated_at
    #[schema(example = "updated_at desc")]
    pub sort_by: Option<String>,
    #[schema(example = "10")]
    pub limit: Option<String>,
    #[schema(example = "1")]
    pub page: Option<String>,
    /// Display or safe name of a composer
    pub composer: Option<String>,
}

impl From<ListSheetsRequest> for RawListParams {
    fn from(request: ListSheetsRequest) -> Self {
        Self {
            sort_by: request.sort_by,
            limit: request.limit,
            page: request.page,
            composer: request.composer,
        }
    }
}

/// Form body of the listing endpoint
///
/// A request without a body is the same as an empty form.
#[derive(Debug, Clone, Default)]
pub struct ListSheetsForm(pub ListSheetsRequest);

impl<S> FromRequest<S> for ListSheetsForm
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !request.headers().contains_key(CONTENT_TYPE) {
            return Ok(Self::default());
        }

        let Form(form) = Form::<ListSheetsRequest>::from_request(request, state)
            .await
            .map_err(|rejection| bad_request(&rejection.body_text()).into_response())?;
        Ok(Self(form))
    }
}

/// Bearer credential, if the request carried one
///
/// Absence is not a rejection: the deletion workflow decides what a missing
/// token means.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .typed_get::<Authorization<Bearer>>()
            .map(|auth| auth.token().to_string());
        Ok(Self(token))
    }
}

/// Request context information
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_agent: Option<String>,
    pub real_ip: Option<String>,
    pub request_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            user_agent: None,
            real_ip: None,
            request_id: Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get("user-agent")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        let real_ip = parts
            .headers
            .get("x-real-ip")
            .or_else(|| parts.headers.get("x-forwarded-for"))
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string());

        // Reuse the id assigned by the logging middleware when present
        let request_id = parts
            .headers
            .get(super::middleware::REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(Self {
            user_agent,
            real_ip,
            request_id,
            timestamp: chrono::Utc::now(),
        })
    }
}
