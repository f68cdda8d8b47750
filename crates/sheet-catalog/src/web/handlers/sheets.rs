//! Sheet HTTP handlers
//!
//! Thin wrappers around the pagination engine, resolver, locator and
//! deletion workflow. Assets are streamed, never buffered.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, Method, Uri, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use crate::errors::{AppError, AppResult};
use crate::models::{PageResult, Sheet};
use crate::services::{DeletionOutcome, RawListParams};
use crate::web::{
    AppState,
    extractors::{BearerToken, ListSheetsForm, ListSheetsRequest, RequestContext},
    responses::{ApiResponse, handle_error, handle_result},
    utils::{log_request, non_blank},
};

const PDF_CONTENT_TYPE: &str = "application/pdf";
const PNG_CONTENT_TYPE: &str = "image/png";

/// List sheets, one page at a time
#[utoipa::path(
    post,
    path = "/sheets",
    tag = "sheets",
    request_body(
        content = ListSheetsRequest,
        content_type = "application/x-www-form-urlencoded",
        description = "All fields optional"
    ),
    responses(
        (status = 200, description = "Page of sheets", body = ApiResponse<PageResult>),
        (status = 400, description = "Invalid sort_by, limit or page"),
        (status = 500, description = "Storage failure"),
    )
)]
pub async fn list_sheets(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    context: RequestContext,
    ListSheetsForm(form): ListSheetsForm,
) -> Response {
    log_request(&method, &uri, &context);

    let params = RawListParams::from(form);
    handle_result(state.pagination.list_raw(&params).await)
}

/// Get one sheet by its safe name
#[utoipa::path(
    get,
    path = "/sheet/{sheet_name}",
    tag = "sheets",
    params(
        ("sheet_name" = String, Path, description = "Safe sheet name", example = "etude-op-10-no-3"),
    ),
    responses(
        (status = 200, description = "Sheet found", body = ApiResponse<Sheet>),
        (status = 404, description = "No sheet has this name"),
        (status = 422, description = "Sheet name missing or blank"),
    )
)]
pub async fn get_sheet(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    context: RequestContext,
    Path(sheet_name): Path<String>,
) -> Response {
    log_request(&method, &uri, &context);
    handle_result(find_sheet(&state, &sheet_name).await)
}

async fn find_sheet(state: &AppState, sheet_name: &str) -> AppResult<Sheet> {
    let sheet_name =
        non_blank(sheet_name).ok_or_else(|| AppError::missing_parameter("sheet_name"))?;
    state
        .resolver
        .resolve(sheet_name)
        .await?
        .ok_or_else(|| AppError::not_found("sheet", sheet_name))
}

/// `GET /sheet/` with no name at all
pub async fn get_sheet_without_name(method: Method, uri: Uri, context: RequestContext) -> Response {
    log_request(&method, &uri, &context);
    handle_error(AppError::missing_parameter("sheet_name"))
}

/// Stream a sheet's score PDF
#[utoipa::path(
    get,
    path = "/sheet/pdf/{composer}/{sheet_name}",
    tag = "sheets",
    params(
        ("composer" = String, Path, description = "Safe composer name", example = "frederic-chopin"),
        ("sheet_name" = String, Path, description = "Safe sheet name", example = "etude-op-10-no-3"),
    ),
    responses(
        (status = 200, description = "PDF bytes", content_type = "application/pdf"),
        (status = 400, description = "Name would leave the asset root"),
        (status = 404, description = "File not found"),
    )
)]
pub async fn get_sheet_pdf(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    context: RequestContext,
    Path((composer, sheet_name)): Path<(String, String)>,
) -> Response {
    log_request(&method, &uri, &context);

    let result = async {
        let path = state.locator.locate_pdf(&composer, &sheet_name)?;
        state.locator.open(&path).await
    }
    .await;

    match result {
        Ok(file) => stream_file(file, PDF_CONTENT_TYPE).await,
        Err(e) => handle_error(e),
    }
}

/// Stream a sheet's thumbnail image
#[utoipa::path(
    get,
    path = "/sheet/thumbnail/{name}",
    tag = "sheets",
    params(
        ("name" = String, Path, description = "Safe sheet name", example = "etude-op-10-no-3"),
    ),
    responses(
        (status = 200, description = "PNG bytes", content_type = "image/png"),
        (status = 400, description = "Name would leave the asset root"),
        (status = 404, description = "File not found"),
    )
)]
pub async fn get_sheet_thumbnail(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    context: RequestContext,
    Path(name): Path<String>,
) -> Response {
    log_request(&method, &uri, &context);

    let result = async {
        let path = state.locator.locate_thumbnail(&name)?;
        state.locator.open(&path).await
    }
    .await;

    match result {
        Ok(file) => stream_file(file, PNG_CONTENT_TYPE).await,
        Err(e) => handle_error(e),
    }
}

/// Delete a sheet and its assets
#[utoipa::path(
    delete,
    path = "/sheet/{sheet_name}",
    tag = "sheets",
    params(
        ("sheet_name" = String, Path, description = "Safe sheet name", example = "etude-op-10-no-3"),
    ),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Sheet was successfully deleted", body = ApiResponse<DeletionOutcome>),
        (status = 400, description = "The store refused the delete"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Sheet not found"),
    )
)]
pub async fn delete_sheet(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    context: RequestContext,
    token: BearerToken,
    Path(sheet_name): Path<String>,
) -> Response {
    log_request(&method, &uri, &context);
    handle_result(state.deletion.delete(token.as_deref(), &sheet_name).await)
}

/// `DELETE /sheet/` with no name; authorization is still checked first
pub async fn delete_sheet_without_name(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    context: RequestContext,
    token: BearerToken,
) -> Response {
    log_request(&method, &uri, &context);
    handle_result(state.deletion.delete(token.as_deref(), "").await)
}

async fn stream_file(file: tokio::fs::File, content_type: &'static str) -> Response {
    let length = file.metadata().await.ok().map(|m| m.len());
    let body = Body::from_stream(ReaderStream::new(file));

    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );
    if let Some(length) = length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    response
}
