//! HTTP API integration tests
//!
//! Drives the full router (including the standard middleware stack) in-process
//! with in-memory collaborators.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use dataproduct_service::prelude::*;
use serde_json::{json, Value};
use tower::ServiceExt;

// ============================================================================
// Test Infrastructure
// ============================================================================

struct TestApp {
    router: Router,
    audit: InMemoryAuditSink,
    publisher: InMemoryEventPublisher,
    repository: InMemoryDataProductRepository,
}

fn test_app(config: Config) -> TestApp {
    let repository = InMemoryDataProductRepository::new();
    let audit = InMemoryAuditSink::new();
    let publisher = InMemoryEventPublisher::new();

    let shared_repository: Arc<dyn DataProductRepository> = Arc::new(repository.clone());
    let deps = PipelineDeps::from_config(
        &config,
        Arc::clone(&shared_repository),
        Arc::new(audit.clone()),
        Arc::new(publisher.clone()),
    );
    let factory = StrategyFactory::standard(
        &deps,
        VersionFallback::from(config.versioning.fallback_version),
    )
    .unwrap();
    let controller = DataProductController::new(Arc::new(factory));
    let state = AppState::new(config.clone(), controller, shared_repository);
    let router = Server::new(config).layered(router(state));

    TestApp {
        router,
        audit,
        publisher,
        repository,
    }
}

async fn make_request(
    app: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Value) {
    let request = Request::builder()
        .uri(path)
        .method(method)
        .header("Content-Type", "application/json");

    let body = match body {
        Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    (status, headers, json)
}

async fn create(app: &Router, name: &str) -> Value {
    let (status, _, body) =
        make_request(app, "POST", "/v1/data-products", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    body
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_create_then_rename_via_v1() {
    let app = test_app(Config::default());
    let created = create(&app.router, "Catalog A").await;
    let id = created["id"].as_str().unwrap();

    assert_eq!(created["status"], "ACTIVE");
    assert!(created["createdAt"].is_string());
    assert_eq!(created["createdAt"], created["updatedAt"]);

    let (status, _, updated) = make_request(
        &app.router,
        "PUT",
        &format!("/v1/data-products/{}", id),
        Some(json!({ "name": "Catalog B" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Catalog B");
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_eq!(app.audit.len().await, 2);
    assert_eq!(app.publisher.delivered().await.len(), 2);
}

#[tokio::test]
async fn test_v2_rejects_rename() {
    let app = test_app(Config::default());
    let created = create(&app.router, "Catalog A").await;
    let path = format!("/v2/data-products/{}", created["id"].as_str().unwrap());

    let (status, _, body) =
        make_request(&app.router, "PUT", &path, Some(json!({ "name": "Catalog B" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "name is immutable in v2");
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _, fetched) = make_request(&app.router, "GET", &path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Catalog A");
    assert_eq!(app.audit.len().await, 1);
}

#[tokio::test]
async fn test_v2_merges_status_change() {
    let app = test_app(Config::default());
    let created = create(&app.router, "Catalog A").await;
    let path = format!("/v2/data-products/{}", created["id"].as_str().unwrap());

    let (status, _, body) =
        make_request(&app.router, "PUT", &path, Some(json!({ "status": "INACTIVE" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Catalog A");
    assert_eq!(body["status"], "INACTIVE");
    assert_eq!(body["revision"], 2);
}

#[tokio::test]
async fn test_v2_description_update_keeps_name() {
    let app = test_app(Config::default());
    let created = create(&app.router, "Catalog A").await;
    let path = format!("/v2/data-products/{}", created["id"].as_str().unwrap());

    let (status, _, body) = make_request(
        &app.router,
        "PUT",
        &path,
        Some(json!({ "description": "new text" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Catalog A");
    assert_eq!(body["description"], "new text");
}

#[tokio::test]
async fn test_non_canonical_version_token_is_bad_request() {
    let app = test_app(Config::default());
    for path in ["/vv1/data-products", "/1/data-products"] {
        let (status, _, body) =
            make_request(&app.router, "POST", path, Some(json!({ "name": "Catalog A" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", path);
        assert_eq!(body["code"], "UNSUPPORTED_VERSION");
    }
    assert_eq!(app.repository.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unsupported_version_is_bad_request() {
    let app = test_app(Config::default());
    let (status, _, body) = make_request(
        &app.router,
        "POST",
        "/v3/data-products",
        Some(json!({ "name": "Catalog A" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UNSUPPORTED_VERSION");
    assert_eq!(app.repository.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_configured_fallback_serves_unknown_version() {
    let mut config = Config::default();
    config.versioning.fallback_version = Some(ApiVersion::V1);
    let app = test_app(config);

    let (status, _, _) = make_request(
        &app.router,
        "POST",
        "/v3/data-products",
        Some(json!({ "name": "Catalog A" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_unknown_id_is_not_found_without_side_effects() {
    let app = test_app(Config::default());
    let path = format!("/v1/data-products/{}", DataProductId::new());

    let (status, _, _) =
        make_request(&app.router, "PUT", &path, Some(json!({ "name": "Catalog B" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = make_request(&app.router, "GET", &path, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = make_request(&app.router, "DELETE", &path, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(app.audit.is_empty().await);
    assert!(app.publisher.delivered().await.is_empty());
}

#[tokio::test]
async fn test_malformed_input_is_validation_error() {
    let app = test_app(Config::default());

    let (status, _, body) =
        make_request(&app.router, "GET", "/v1/data-products/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _, body) = make_request(
        &app.router,
        "POST",
        "/v1/data-products",
        Some(json!({ "name": 42 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_client_timestamps_and_id_are_ignored() {
    let app = test_app(Config::default());
    let forged_id = DataProductId::new().to_string();

    let (status, _, body) = make_request(
        &app.router,
        "POST",
        "/v1/data-products",
        Some(json!({
            "id": forged_id,
            "name": "Catalog A",
            "createdAt": "2001-01-01T00:00:00Z"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(body["id"], forged_id);
    assert_ne!(body["createdAt"], "2001-01-01T00:00:00Z");
}

#[tokio::test]
async fn test_stale_revision_is_conflict() {
    let app = test_app(Config::default());
    let created = create(&app.router, "Catalog A").await;
    let path = format!("/v1/data-products/{}", created["id"].as_str().unwrap());

    let (status, _, _) = make_request(
        &app.router,
        "PUT",
        &path,
        Some(json!({ "name": "Catalog B", "expectedRevision": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = make_request(
        &app.router,
        "PUT",
        &path,
        Some(json!({ "name": "Catalog C", "expectedRevision": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "REVISION_CONFLICT");
}

#[tokio::test]
async fn test_delete_returns_no_content() {
    let app = test_app(Config::default());
    let created = create(&app.router, "Catalog A").await;
    let path = format!("/v2/data-products/{}", created["id"].as_str().unwrap());

    let (status, _, _) = make_request(&app.router, "DELETE", &path, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = make_request(&app.router, "GET", &path, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.audit.len().await, 2);
}

#[tokio::test]
async fn test_deprecated_version_headers() {
    let mut config = Config::default();
    config.versioning.deprecated.push(
        DeprecationInfo::new(ApiVersion::V1, ApiVersion::V2)
            .with_sunset_date("2027-06-30T23:59:59Z"),
    );
    let app = test_app(config);

    let (status, headers, _) = make_request(
        &app.router,
        "POST",
        "/v1/data-products",
        Some(json!({ "name": "Catalog A" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(headers["Deprecation"], "version=\"v1\"");
    assert_eq!(headers["Sunset"], "2027-06-30T23:59:59Z");
    assert!(headers.contains_key("x-request-id"));

    let (_, headers, _) = make_request(
        &app.router,
        "POST",
        "/v2/data-products",
        Some(json!({ "name": "Catalog B" })),
    )
    .await;
    assert!(!headers.contains_key("Deprecation"));
}

#[tokio::test]
async fn test_fail_closed_reports_side_effect_failure() {
    let mut config = Config::default();
    config.pipeline.side_effect_policy = SideEffectPolicy::FailClosed;
    let app = test_app(config);
    app.audit.set_failing(true);

    let (status, _, body) = make_request(
        &app.router,
        "POST",
        "/v1/data-products",
        Some(json!({ "name": "Catalog A" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "SIDE_EFFECT_FAILED");
    // The write committed before the audit stage ran
    assert_eq!(app.repository.count().await.unwrap(), 1);
    assert!(app.publisher.delivered().await.is_empty());
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_ids() {
    let app = test_app(Config::default());

    let requests = (0..16).map(|i| {
        let router = app.router.clone();
        async move { create(&router, &format!("Catalog {}", i)).await }
    });
    let created = futures::future::join_all(requests).await;

    let mut ids: Vec<_> = created
        .iter()
        .map(|body| body["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);
    assert_eq!(app.repository.count().await.unwrap(), 16);
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = test_app(Config::default());

    let (status, _, body) = make_request(&app.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_versions"], json!(["v1", "v2"]));

    let (status, _, _) = make_request(&app.router, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);

    app.repository.set_unavailable(true);
    let (status, _, body) = make_request(&app.router, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);
}
