#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use registration_service::models::{NewRegistration, Registration};
use registration_service::services::{
    InMemoryRegistrationStore, RegistrationStore, StoreConnection,
};
use registration_service::startup::{build_router, AppState};
use service_core::error::AppError;
use std::path::PathBuf;
use tower::ServiceExt;

pub const TEST_DATABASE: &str = "dot_database";
pub const TEST_COLLECTION: &str = "registrations";

/// Store whose every operation fails, for exercising error envelopes.
pub struct FailingStore;

#[async_trait]
impl RegistrationStore for FailingStore {
    async fn insert(&self, _registration: NewRegistration) -> Result<Registration, AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!("insert refused")))
    }

    async fn list_newest_first(&self) -> Result<Vec<Registration>, AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!("cursor killed")))
    }

    async fn count(&self) -> Result<u64, AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!("count timed out")))
    }
}

pub struct TestApp {
    pub router: Router,
}

impl TestApp {
    pub fn with_store(store: StoreConnection) -> Self {
        let state = AppState {
            store,
            database: TEST_DATABASE.to_string(),
            collection: TEST_COLLECTION.to_string(),
        };
        Self {
            router: build_router(state, &static_dir()),
        }
    }

    pub fn in_memory() -> Self {
        Self::with_store(StoreConnection::connected(InMemoryRegistrationStore::new()))
    }

    pub fn disconnected() -> Self {
        Self::with_store(StoreConnection::Disconnected)
    }

    pub fn failing() -> Self {
        Self::with_store(StoreConnection::connected(FailingStore))
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        self.post_raw(uri, body.to_string()).await
    }

    pub async fn post_raw(&self, uri: &str, body: String) -> (StatusCode, serde_json::Value) {
        self.post_with_content_type(uri, "application/json", body).await
    }

    pub async fn post_with_content_type(
        &self,
        uri: &str,
        content_type: &str,
        body: String,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Raw response for non-JSON routes.
    pub async fn get_raw(&self, uri: &str) -> (StatusCode, HeaderMap, String) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        (status, headers, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).expect("Response is not JSON");
        (status, body)
    }
}

pub fn static_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static")
}
