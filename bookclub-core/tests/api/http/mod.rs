//! HTTP API handler tests
//!
//! Each test builds the production router over a [`TestAppState`] backed by
//! the in-memory repositories and drives it with `tower::ServiceExt::oneshot`.

mod auth_http_test;
mod routing_http_test;

use super::{TestMemberRepository, TestSessionRepository, TestSketchRepository};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use bookclub_core::config::{Config, DatabaseConfig, SessionConfig, TelemetryConfig};
use bookclub_core::server::build_router;
use bookclub_core::service::{IdentityService, MemberService, SessionService, SketchService};
use bookclub_core::state::HasServices;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

// ============================================================================
// Test Configuration
// ============================================================================

pub fn test_config() -> Config {
    Config {
        http_host: "127.0.0.1".to_string(),
        http_port: 8080,
        database: DatabaseConfig {
            url: "mysql://localhost/bookclub_test".to_string(),
            max_connections: 1,
            min_connections: 0,
            run_migrations: false,
        },
        session: SessionConfig {
            cookie_secure: false,
            ..Default::default()
        },
        telemetry: TelemetryConfig::default(),
        static_assets_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/assets")
            .to_string(),
    }
}

// ============================================================================
// Test Application State
// ============================================================================

#[derive(Clone)]
pub struct TestAppState {
    pub config: Arc<Config>,
    pub member_repo: Arc<TestMemberRepository>,
    pub session_repo: Arc<TestSessionRepository>,
    pub sketch_repo: Arc<TestSketchRepository>,
    session_service: Arc<SessionService<TestSessionRepository>>,
    member_service: Arc<MemberService<TestMemberRepository>>,
    identity_service: Arc<IdentityService<TestMemberRepository, TestSessionRepository>>,
    sketch_service: Arc<SketchService<TestSketchRepository, TestMemberRepository>>,
}

impl TestAppState {
    pub fn new() -> Self {
        let config = test_config();
        let member_repo = Arc::new(TestMemberRepository::new());
        let session_repo = Arc::new(TestSessionRepository::new());
        let sketch_repo = Arc::new(TestSketchRepository::new());

        let session_service = Arc::new(SessionService::new(
            session_repo.clone(),
            chrono::Duration::seconds(config.session.ttl_secs),
        ));
        let member_service = Arc::new(MemberService::new(member_repo.clone()));
        let identity_service = Arc::new(IdentityService::new(
            member_repo.clone(),
            session_service.clone(),
        ));
        let sketch_service = Arc::new(SketchService::new(
            sketch_repo.clone(),
            member_repo.clone(),
        ));

        Self {
            config: Arc::new(config),
            member_repo,
            session_repo,
            sketch_repo,
            session_service,
            member_service,
            identity_service,
            sketch_service,
        }
    }
}

impl HasServices for TestAppState {
    type MemberRepo = TestMemberRepository;
    type SessionRepo = TestSessionRepository;
    type SketchRepo = TestSketchRepository;

    fn config(&self) -> &Config {
        &self.config
    }

    fn session_service(&self) -> &SessionService<Self::SessionRepo> {
        &self.session_service
    }

    fn member_service(&self) -> &MemberService<Self::MemberRepo> {
        &self.member_service
    }

    fn identity_service(&self) -> &IdentityService<Self::MemberRepo, Self::SessionRepo> {
        &self.identity_service
    }

    fn sketch_service(&self) -> &SketchService<Self::SketchRepo, Self::MemberRepo> {
        &self.sketch_service
    }

    async fn check_ready(&self) -> bool {
        true
    }
}

pub fn build_test_router(state: TestAppState) -> Router {
    build_router(state, None).expect("route table should build")
}

/// Fresh state plus the router serving it
pub fn test_app() -> (TestAppState, Router) {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    (state, app)
}

// ============================================================================
// HTTP Test Helpers
// ============================================================================

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("response body should be JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `Set-Cookie` line for a cookie name
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&prefix))
            .map(str::to_string)
    }

    /// Value of the `session_id` cookie set by this response
    pub fn session_token(&self) -> Option<String> {
        self.set_cookie("session_id").and_then(|line| {
            line.split(';')
                .next()
                .and_then(|pair| pair.split_once('='))
                .map(|(_, value)| value.to_string())
        })
    }
}

/// Send a request, optionally carrying a session token and a body
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    session: Option<&str>,
    body: Option<Body>,
    content_type: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = session {
        builder = builder.header(header::COOKIE, format!("session_id={}", token));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    let request = builder.body(body.unwrap_or_else(Body::empty)).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(app: &Router, uri: &str, session: Option<&str>) -> TestResponse {
    send(app, Method::GET, uri, session, None, None).await
}

pub async fn delete(app: &Router, uri: &str, session: Option<&str>) -> TestResponse {
    send(app, Method::DELETE, uri, session, None, None).await
}

pub async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    session: Option<&str>,
    body: &Value,
) -> TestResponse {
    send(
        app,
        method,
        uri,
        session,
        Some(Body::from(serde_json::to_vec(body).unwrap())),
        Some("application/json"),
    )
    .await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    session: Option<&str>,
    body: &Value,
) -> TestResponse {
    send_json(app, Method::POST, uri, session, body).await
}

pub async fn post_form(app: &Router, uri: &str, body: &str) -> TestResponse {
    send(
        app,
        Method::POST,
        uri,
        None,
        Some(Body::from(body.to_string())),
        Some("application/x-www-form-urlencoded"),
    )
    .await
}

/// Register a member and return their session token
pub async fn register(app: &Router, name: &str, password: &str) -> String {
    let response = post_json(
        app,
        "/api/auth/register",
        None,
        &json!({
            "name": name,
            "password": password,
            "confirm_password": password,
        }),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
    response
        .session_token()
        .expect("registration should set a session cookie")
}

/// Create a titled sketch owned by `name`
pub async fn create_sketch(app: &Router, token: &str, name: &str, title: &str) -> TestResponse {
    post_json(
        app,
        &format!("/api/sketches/{}/{}", name, "draft"),
        Some(token),
        &json!({
            "title": title,
            "source_code": "function setup() { createCanvas(100, 100); }",
        }),
    )
    .await
}
