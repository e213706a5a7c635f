use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use roster::roster_auth::{JwtIdentityResolver, create_access_token};
use roster::roster_config::{CorsConfig, JwtConfig, ServiceConfig, StorageBackend};
use roster::roster_core::scopes;
use roster::router::init_router;
use roster::state::AppState;
use roster::storage::{ClassStore, MemoryClassStore};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret-at-least-32-chars".to_string(),
        access_token_expiry: 3600,
    }
}

pub fn setup_test_app(store: Arc<dyn ClassStore>) -> axum::Router {
    let service_config = ServiceConfig {
        operation_timeout: Duration::from_secs(5),
        storage_backend: StorageBackend::Memory,
    };
    let identity = Arc::new(JwtIdentityResolver::new(test_jwt_config()));
    init_router(AppState::new(
        store,
        identity,
        &service_config,
        CorsConfig::default(),
    ))
}

/// App backed by a fresh in-memory store. The store handle is returned so
/// tests can inspect rows or inject faults.
#[allow(dead_code)]
pub fn memory_app() -> (axum::Router, MemoryClassStore) {
    let store = MemoryClassStore::new();
    (setup_test_app(Arc::new(store.clone())), store)
}

/// A user holding every class scope.
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestUser {
    pub fn new() -> Self {
        Self::with_scopes(&scopes::ALL)
    }

    pub fn with_scopes(granted: &[&str]) -> Self {
        let id = Uuid::new_v4();
        let token = create_access_token(
            id,
            granted.iter().map(|s| s.to_string()).collect(),
            &test_jwt_config(),
        )
        .unwrap();
        Self { id, token }
    }
}

/// Sends a request and returns the status with the JSON body (`Null` when empty).
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Creates a class as `owner` and returns its id.
#[allow(dead_code)]
pub async fn create_class(app: &axum::Router, owner: &TestUser, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/classes",
        Some(&owner.token),
        Some(serde_json::json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

#[allow(dead_code)]
pub async fn join(app: &axum::Router, user: &TestUser, class_id: &str) -> StatusCode {
    send(
        app,
        "POST",
        &format!("/api/classes/{class_id}/join"),
        Some(&user.token),
        None,
    )
    .await
    .0
}
