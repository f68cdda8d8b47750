//! Web layer module
//!
//! Thin handlers over the service layer, a standard response envelope and
//! the middleware stack. All API routes are nested under `/api/v1`.

use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use sandboxed_assets::SandboxedRoot;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::{
    auth::TokenVerifier,
    config::Config,
    database::{Database, repositories::SheetSeaOrmRepository},
    repositories::SheetRepository,
    services::{PaginationEngine, ResourceLocator, SafeNameResolver, SheetDeletionService},
};

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod responses;
pub mod utils;

pub use extractors::RequestContext;
pub use responses::{ApiResponse, handle_error, handle_result};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub config: Config,
    pub resolver: SafeNameResolver,
    pub locator: ResourceLocator,
    pub pagination: PaginationEngine,
    pub deletion: SheetDeletionService,
    /// Application start time for uptime calculation
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Wire the services over the SeaORM repository
    pub fn new(
        config: Config,
        database: Database,
        asset_root: SandboxedRoot,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        let repository: Arc<dyn SheetRepository> =
            Arc::new(SheetSeaOrmRepository::new(database.connection()));
        Self::with_repository(config, database, repository, asset_root, verifier)
    }

    pub fn with_repository(
        config: Config,
        database: Database,
        repository: Arc<dyn SheetRepository>,
        asset_root: SandboxedRoot,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        let locator = ResourceLocator::new(asset_root);
        Self {
            resolver: SafeNameResolver::new(repository.clone()),
            pagination: PaginationEngine::new(repository.clone(), config.pagination.clone()),
            deletion: SheetDeletionService::new(repository, locator.clone(), verifier),
            locator,
            database,
            config,
            start_time: chrono::Utc::now(),
        }
    }
}

/// Create the router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let request_timeout = state.config.web.request_timeout;

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/openapi.json", get(openapi::openapi_json))
        .nest("/api/v1", api_v1_routes())
        // Middleware (applied in reverse order)
        .layer(axum::middleware::from_fn_with_state(
            request_timeout,
            middleware::timeout_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(middleware::security_headers_middleware))
        .layer(axum::middleware::from_fn(middleware::request_logging_middleware))
        .with_state(state)
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/sheets", post(handlers::sheets::list_sheets))
        .route(
            "/sheet/",
            get(handlers::sheets::get_sheet_without_name)
                .delete(handlers::sheets::delete_sheet_without_name),
        )
        .route(
            "/sheet/{sheet_name}",
            get(handlers::sheets::get_sheet).delete(handlers::sheets::delete_sheet),
        )
        .route(
            "/sheet/pdf/{composer}/{sheet_name}",
            get(handlers::sheets::get_sheet_pdf),
        )
        .route(
            "/sheet/thumbnail/{name}",
            get(handlers::sheets::get_sheet_thumbnail),
        )
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(state: AppState) -> Result<Self> {
        let addr: SocketAddr =
            format!("{}:{}", state.config.web.host, state.config.web.port).parse()?;
        Ok(Self {
            app: create_router(state),
            addr,
        })
    }

    /// Serve until SIGTERM or Ctrl+C
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.addr, e))?;
        tracing::info!(addr = %self.addr, "Sheet catalog listening");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the host address
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down gracefully"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down gracefully"),
    }
}
