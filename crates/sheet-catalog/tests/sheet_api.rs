//! HTTP API integration tests
//!
//! Drives the full router against an in-memory SQLite database and a
//! temporary asset root.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tempfile::TempDir;

use sandboxed_assets::SandboxedRoot;
use sheet_catalog::{
    auth::HmacTokenVerifier,
    config::Config,
    database::{Database, repositories::SheetSeaOrmRepository},
    models::{Sheet, SheetCreateRequest},
    services::ResourceLocator,
    web::{AppState, create_router},
};

const SECRET: &str = "integration-test-secret";

struct TestApp {
    server: TestServer,
    repository: SheetSeaOrmRepository,
    locator: ResourceLocator,
    verifier: HmacTokenVerifier,
    _assets: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let database = Database::new_in_memory()
            .await
            .expect("Failed to create test database");
        let assets = tempfile::tempdir().expect("Failed to create asset root");
        let root = SandboxedRoot::builder()
            .base_directory(assets.path())
            .create_missing(true)
            .build()
            .await
            .expect("Failed to open asset root");
        let verifier = HmacTokenVerifier::new(SECRET, Duration::from_secs(3600)).unwrap();

        let state = AppState::new(
            Config::default(),
            database.clone(),
            root.clone(),
            Arc::new(verifier.clone()),
        );

        Self {
            server: TestServer::new(create_router(state)).expect("Failed to start test server"),
            repository: SheetSeaOrmRepository::new(database.connection()),
            locator: ResourceLocator::new(root),
            verifier,
            _assets: assets,
        }
    }

    async fn seed(&self, title: &str, composer: &str, at: DateTime<Utc>) -> Sheet {
        self.repository
            .create_at(SheetCreateRequest::new(title, composer), at)
            .await
            .expect("Failed to seed sheet")
    }

    async fn seed_assets(&self, sheet: &Sheet) {
        let pdf = self
            .locator
            .locate_pdf(&sheet.safe_composer_name, &sheet.safe_sheet_name)
            .unwrap();
        self.locator.root().write(&pdf, b"%PDF-1.7 test").await.unwrap();

        let png = self.locator.locate_thumbnail(&sheet.safe_sheet_name).unwrap();
        self.locator.root().write(&png, b"\x89PNG test").await.unwrap();
    }

    fn token(&self) -> String {
        self.verifier.issue("librarian").unwrap()
    }
}

fn minute(m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, m, 0).unwrap()
}

async fn seed_many(app: &TestApp, count: u32) {
    for i in 0..count {
        app.seed(&format!("Prelude {i}"), "Johann Sebastian Bach", minute(i))
            .await;
    }
}

#[tokio::test]
async fn test_list_without_parameters_uses_defaults() {
    let app = TestApp::new().await;
    seed_many(&app, 12).await;

    let response = app.server.post("/api/v1/sheets").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    let sheets = body["data"]["sheets"].as_array().unwrap();
    assert_eq!(sheets.len(), 10);
    assert_eq!(sheets[0]["title"], "Prelude 11");
    assert_eq!(sheets[9]["title"], "Prelude 2");
    assert_eq!(body["data"]["page_current"], 1);
    assert_eq!(body["data"]["page_max"], 2);
}

#[tokio::test]
async fn test_list_with_form_parameters() {
    let app = TestApp::new().await;
    seed_many(&app, 5).await;
    app.seed("Ballade No. 1", "Frédéric Chopin", minute(30)).await;

    let response = app
        .server
        .post("/api/v1/sheets")
        .form(&[("sort_by", "title asc"), ("limit", "2"), ("page", "2")])
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let titles: Vec<&str> = body["data"]["sheets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Prelude 1", "Prelude 2"]);
    assert_eq!(body["data"]["page_max"], 3);

    let response = app
        .server
        .post("/api/v1/sheets")
        .form(&[("composer", "Frédéric Chopin")])
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["sheets"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["page_max"], 1);
}

#[tokio::test]
async fn test_page_beyond_range_is_empty() {
    let app = TestApp::new().await;
    seed_many(&app, 4).await;

    let response = app
        .server
        .post("/api/v1/sheets")
        .form(&[("limit", "2"), ("page", "7")])
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["data"]["sheets"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["page_current"], 7);
    assert_eq!(body["data"]["page_max"], 2);
}

#[tokio::test]
async fn test_invalid_listing_parameters_are_rejected() {
    let app = TestApp::new().await;
    seed_many(&app, 2).await;

    for form in [
        [("sort_by", "password desc")],
        [("sort_by", "title; DROP TABLE sheets")],
        [("limit", "0")],
        [("page", "-1")],
    ] {
        let response = app.server.post("/api/v1/sheets").form(&form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    // Table survives the injection attempt
    app.server.post("/api/v1/sheets").await.assert_status_ok();
}

#[tokio::test]
async fn test_get_sheet_by_safe_name() {
    let app = TestApp::new().await;
    app.seed("Étude Op. 10 No. 3", "Frédéric Chopin", minute(0))
        .await;

    let response = app.server.get("/api/v1/sheet/etude-op-10-no-3").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["title"], "Étude Op. 10 No. 3");
    assert_eq!(body["data"]["safe_composer_name"], "frederic-chopin");

    let response = app.server.get("/api/v1/sheet/nocturne").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "sheet not found");
}

#[tokio::test]
async fn test_get_sheet_with_blank_name_is_unprocessable() {
    let app = TestApp::new().await;

    app.server
        .get("/api/v1/sheet/")
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    app.server
        .get("/api/v1/sheet/%20%20")
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_assets_are_streamed_with_content_type() {
    let app = TestApp::new().await;
    let sheet = app.seed("Ballade No. 1", "Frédéric Chopin", minute(0)).await;
    app.seed_assets(&sheet).await;

    let response = app
        .server
        .get("/api/v1/sheet/pdf/frederic-chopin/ballade-no-1")
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/pdf");
    assert_eq!(response.as_bytes().as_ref(), b"%PDF-1.7 test");

    let response = app.server.get("/api/v1/sheet/thumbnail/ballade-no-1").await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "image/png");

    app.server
        .get("/api/v1/sheet/thumbnail/absent")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_asset_traversal_is_rejected() {
    let app = TestApp::new().await;

    for url in [
        "/api/v1/sheet/thumbnail/..%2F..%2Fetc%2Fpasswd",
        "/api/v1/sheet/thumbnail/ballade%2F..",
        "/api/v1/sheet/thumbnail/..%5C..%5Csecret",
        "/api/v1/sheet/pdf/..%2F..%2F..%2Fetc/passwd",
        "/api/v1/sheet/pdf/chopin/..%2F..%2Fconfig",
    ] {
        let response = app.server.get(url).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false, "{url}");
    }
}

#[tokio::test]
async fn test_delete_requires_valid_token() {
    let app = TestApp::new().await;
    let sheet = app.seed("Ballade No. 1", "Frédéric Chopin", minute(0)).await;
    app.seed_assets(&sheet).await;

    app.server
        .delete("/api/v1/sheet/ballade-no-1")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let forged = HmacTokenVerifier::new("another-secret", Duration::from_secs(60))
        .unwrap()
        .issue("mallory")
        .unwrap();
    app.server
        .delete("/api/v1/sheet/ballade-no-1")
        .authorization_bearer(forged)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // Nothing was touched
    app.server
        .get("/api/v1/sheet/ballade-no-1")
        .await
        .assert_status_ok();
    app.server
        .get("/api/v1/sheet/pdf/frederic-chopin/ballade-no-1")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_double_delete() {
    let app = TestApp::new().await;
    let sheet = app.seed("Ballade No. 1", "Frédéric Chopin", minute(0)).await;
    app.seed_assets(&sheet).await;
    let token = app.token();

    let response = app
        .server
        .delete("/api/v1/sheet/ballade-no-1")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["message"], "Sheet was successfully deleted");
    assert_eq!(body["data"]["assets"][0]["outcome"]["status"], "removed");
    assert_eq!(body["data"]["assets"][1]["outcome"]["status"], "removed");

    app.server
        .get("/api/v1/sheet/pdf/frederic-chopin/ballade-no-1")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = app
        .server
        .delete("/api/v1/sheet/ballade-no-1")
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "sheet not found");
}

#[tokio::test]
async fn test_delete_without_assets_still_succeeds() {
    let app = TestApp::new().await;
    app.seed("Nocturne", "Frédéric Chopin", minute(0)).await;

    let response = app
        .server
        .delete("/api/v1/sheet/nocturne")
        .authorization_bearer(app.token())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["assets"][0]["outcome"]["status"], "missing");
    assert_eq!(body["data"]["assets"][1]["outcome"]["status"], "missing");
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = TestApp::new().await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["database"]["status"], "connected");
    assert_eq!(response.header("x-frame-options"), "DENY");

    let response = app.server.get("/api/openapi.json").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["paths"]["/sheet/{sheet_name}"].is_object());
}

#[tokio::test]
async fn test_padded_name_is_not_trimmed() {
    let app = TestApp::new().await;
    app.seed("Nocturne", "Frédéric Chopin", minute(0)).await;

    app.server
        .get("/api/v1/sheet/%20nocturne%20")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .delete("/api/v1/sheet/%20nocturne%20")
        .authorization_bearer(app.token())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .get("/api/v1/sheet/nocturne")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_delete_without_name() {
    let app = TestApp::new().await;

    app.server
        .delete("/api/v1/sheet/")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .delete("/api/v1/sheet/")
        .authorization_bearer(app.token())
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["details"]["parameter"], "sheet_name");
}

#[tokio::test]
async fn test_shared_title_across_composers() {
    let app = TestApp::new().await;
    let chopin = app.seed("Etude", "Frédéric Chopin", minute(0)).await;
    let liszt = app.seed("Étude", "Franz Liszt", minute(1)).await;
    assert_eq!(chopin.safe_sheet_name, "etude");
    assert_eq!(liszt.safe_sheet_name, "etude-2");
    app.seed_assets(&chopin).await;
    app.seed_assets(&liszt).await;

    let response = app
        .server
        .delete("/api/v1/sheet/etude")
        .authorization_bearer(app.token())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["sheet"]["composer"], "Frédéric Chopin");

    let response = app.server.get("/api/v1/sheet/etude-2").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["composer"], "Franz Liszt");
    app.server
        .get("/api/v1/sheet/pdf/franz-liszt/etude-2")
        .await
        .assert_status_ok();
    app.server
        .get("/api/v1/sheet/thumbnail/etude-2")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_concurrent_deletes_remove_one_sheet_once() {
    let app = TestApp::new().await;
    let target = app.seed("Ballade No. 1", "Frédéric Chopin", minute(0)).await;
    let bystander = app.seed("Ballade No. 2", "Frédéric Chopin", minute(1)).await;
    app.seed_assets(&target).await;
    app.seed_assets(&bystander).await;
    let token = app.token();

    let server = &app.server;
    let token = token.as_str();
    let delete = move || async move {
        server
            .delete("/api/v1/sheet/ballade-no-1")
            .authorization_bearer(token)
            .await
    };
    let (first, second) = tokio::join!(delete(), delete());

    let mut statuses = vec![first.status_code(), second.status_code()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::NOT_FOUND]);

    app.server
        .get("/api/v1/sheet/ballade-no-1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .get("/api/v1/sheet/ballade-no-2")
        .await
        .assert_status_ok();
    app.server
        .get("/api/v1/sheet/pdf/frederic-chopin/ballade-no-2")
        .await
        .assert_status_ok();
}
