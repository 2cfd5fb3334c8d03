//! Common test utilities for integration tests.
//!
//! These tests run against a real PostgreSQL database named by
//! `TEST_DATABASE_URL`. When the variable is unset or the database cannot be
//! reached, [`TestContext::new`] returns `None` and the test exits early.

// Not every test binary uses every helper.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use domain::services::MockImageStore;
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use studyhub_api::{app::create_app_with_image_store, config::Config};
use tower::ServiceExt;

/// A 1x1 transparent PNG, base64 encoded.
pub const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// Create a test database pool, or `None` when no test database is available.
pub async fn create_test_pool() -> Option<PgPool> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;

    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&database_url)
        .await
        .ok()
}

/// Run migrations on the test database.
pub async fn run_migrations(pool: &PgPool) {
    sqlx::migrate!("../persistence/src/migrations")
        .run(pool)
        .await
        .expect("Failed to run migrations");
}

/// Test configuration with a fixed JWT secret.
pub fn test_config() -> Config {
    Config::load_for_test(&[
        ("limits.default_page_size", "20"),
        ("storage.max_image_bytes", "65536"),
    ])
    .expect("Failed to build test config")
}

/// Generate a unique email for testing.
pub fn unique_test_email() -> String {
    format!("test_{}@example.com", uuid::Uuid::new_v4().simple())
}

/// Everything a test needs: the router, the pool and the in-memory image store.
pub struct TestContext {
    pub app: Router,
    pub pool: PgPool,
    pub images: Arc<MockImageStore>,
}

impl TestContext {
    pub async fn new() -> Option<Self> {
        Self::with_image_store(Arc::new(MockImageStore::new())).await
    }

    /// Context whose image store rejects every operation.
    pub async fn with_failing_images() -> Option<Self> {
        Self::with_image_store(Arc::new(MockImageStore::failing())).await
    }

    /// Context whose image store accepts uploads but fails every delete.
    pub async fn with_failing_image_deletes() -> Option<Self> {
        Self::with_image_store(Arc::new(MockImageStore::failing_deletes())).await
    }

    async fn with_image_store(images: Arc<MockImageStore>) -> Option<Self> {
        let pool = create_test_pool().await?;
        run_migrations(&pool).await;

        let app = create_app_with_image_store(test_config(), pool.clone(), images.clone())
            .expect("Failed to build app");

        Some(Self { app, pool, images })
    }

    /// Send a request and return the status and parsed JSON body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, parse_response_body(response).await)
    }

    /// Register a fresh user and return their id and tokens.
    pub async fn register(&self, display_name: &str) -> TestUser {
        let email = unique_test_email();
        let password = "StudyHard123".to_string();
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                json!({
                    "email": email,
                    "password": password,
                    "display_name": display_name,
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            user_id: body["user"]["id"].as_str().unwrap().to_string(),
            email,
            password,
            access_token: body["tokens"]["access_token"].as_str().unwrap().to_string(),
            refresh_token: body["tokens"]["refresh_token"]
                .as_str()
                .unwrap()
                .to_string(),
        }
    }

    /// Create a group owned by `owner` and return its id.
    pub async fn create_group(&self, owner: &TestUser, name: &str, max_members: i32) -> String {
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/v1/groups",
                Some(&owner.access_token),
                json!({
                    "name": name,
                    "description": "Exam prep",
                    "categories": ["exam"],
                    "max_members": max_members,
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create group failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Join `group_id` as `user`, asserting success.
    pub async fn join_group(&self, user: &TestUser, group_id: &str) {
        let (status, body) = self
            .send(empty_request(
                Method::POST,
                &format!("/api/v1/groups/{}/join", group_id),
                Some(&user.access_token),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "join failed: {}", body);
    }

    /// Fetch `user`'s public profile.
    pub async fn profile(&self, viewer: &TestUser, user_id: &str) -> Value {
        let (status, body) = self
            .send(empty_request(
                Method::GET,
                &format!("/api/v1/users/{}", user_id),
                Some(&viewer.access_token),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }
}

/// A registered user.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub user_id: String,
    pub email: String,
    pub password: String,
    pub access_token: String,
    pub refresh_token: String,
}

fn with_auth(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

/// Helper to create a JSON request.
pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    with_auth(Request::builder().method(method).uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Helper to create a request without a body.
pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().method(method).uri(uri), token)
        .body(Body::empty())
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}
