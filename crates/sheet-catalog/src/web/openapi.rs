//! OpenAPI documentation generation using utoipa
//!
//! Handlers carry `#[utoipa::path]` annotations; this module collects them
//! into one document served at `/api/openapi.json`.

use axum::{Json, response::IntoResponse};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sheet Catalog API",
        description = "Catalog of musical score sheets addressed by safe names. \
                       Lists are paged and sorted server-side; PDFs and thumbnails \
                       are streamed from the configured asset root."
    ),
    servers(
        (url = "/api/v1", description = "API Version 1"),
    ),
    tags(
        (name = "sheets", description = "Sheet listing, lookup, assets and deletion"),
        (name = "health", description = "Service health monitoring"),
    ),
    components(
        schemas(
            crate::models::Sheet,
            crate::models::PageResult,
            crate::models::SortField,
            crate::models::SortDirection,
            crate::web::extractors::ListSheetsRequest,
            crate::services::sheet_deletion::DeletionOutcome,
            crate::services::sheet_deletion::AssetCleanup,
            crate::services::sheet_deletion::AssetKind,
            crate::services::sheet_deletion::AssetOutcome,
            crate::web::responses::HealthResponse,
            crate::web::responses::DatabaseHealth,
        )
    ),
    paths(
        crate::web::handlers::sheets::list_sheets,
        crate::web::handlers::sheets::get_sheet,
        crate::web::handlers::sheets::get_sheet_pdf,
        crate::web::handlers::sheets::get_sheet_thumbnail,
        crate::web::handlers::sheets::delete_sheet,
        crate::web::handlers::health::health_check,
    ),
    modifiers(&BearerSecurity)
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// Serve the generated document
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_sheet_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/sheets",
            "/sheet/{sheet_name}",
            "/sheet/pdf/{composer}/{sheet_name}",
            "/sheet/thumbnail/{name}",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer"));
        assert!(components.schemas.contains_key("Sheet"));
    }
}
