//! Routing, middleware and operational endpoint tests

use super::{get, post_form, send, test_app};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

#[tokio::test]
async fn test_health() {
    let (_, app) = test_app();

    let response = get(&app, "/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("x-route-type"), Some("ops"));
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready() {
    let (_, app) = test_app();

    let response = get(&app, "/ready", None).await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_disabled() {
    let (_, app) = test_app();

    let response = get(&app, "/metrics", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.header("x-route-type"), Some("ops"));
}

#[tokio::test]
async fn test_unknown_path_is_json_not_found() {
    let (_, app) = test_app();

    let response = get(&app, "/api/nothing/here", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.header("x-route-type").is_none());
    let body: Value = response.json();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_method_mismatch_falls_through() {
    let (_, app) = test_app();

    let response = send(&app, Method::DELETE, "/api/members", None, None, None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let (_, app) = test_app();

    for path in ["/health", "/api/members", "/missing"] {
        let response = get(&app, path, None).await;
        assert_eq!(response.header("x-content-type-options"), Some("nosniff"));
        assert_eq!(response.header("x-frame-options"), Some("DENY"));
        assert_eq!(response.header("cache-control"), Some("no-store"));
    }
}

#[tokio::test]
async fn test_request_id_echoed_or_generated() {
    let (_, app) = test_app();

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");

    let generated = get(&app, "/health", None).await;
    assert!(generated.header("x-request-id").is_some());
}

#[tokio::test]
async fn test_static_assets() {
    let (_, app) = test_app();

    let response = get(&app, "/assets/css/site.css", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("x-route-type"), Some("static"));
    assert!(response.text().contains("margin: 0"));

    let missing = get(&app, "/assets/css/missing.css", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.header("x-route-type"), Some("static"));
}

#[tokio::test]
async fn test_static_assets_accept_any_method() {
    let (_, app) = test_app();

    let response = send(&app, Method::HEAD, "/assets/css/site.css", None, None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("x-route-type"), Some("static"));
}

#[tokio::test]
async fn test_set_theme() {
    let (_, app) = test_app();

    let response = post_form(
        &app,
        "/api/preferences/theme",
        "theme=dark&redirectURL=%2Fsketches%2Fada",
    )
    .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/sketches/ada"));
    let cookie = response.set_cookie("theme").unwrap();
    assert!(cookie.starts_with("theme=dark"));
    assert!(cookie.contains("SameSite=Lax"));
}

#[tokio::test]
async fn test_set_theme_system_clears_cookie() {
    let (_, app) = test_app();

    let response = post_form(&app, "/api/preferences/theme", "theme=neon").await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/"));
    assert!(response.set_cookie("theme").unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn test_set_locale_rejects_offsite_redirect() {
    let (_, app) = test_app();

    let response = post_form(
        &app,
        "/api/preferences/locale",
        "locale=fr&redirectURL=https%3A%2F%2Fevil.example",
    )
    .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header(header::LOCATION.as_str()), Some("/"));
    assert!(response.set_cookie("locale").unwrap().starts_with("locale=en"));
}

#[tokio::test]
async fn test_set_theme_rejects_backslash_redirect() {
    let (_, app) = test_app();

    let response = post_form(
        &app,
        "/api/preferences/theme",
        "theme=dark&redirectURL=%2F%5Cevil.example",
    )
    .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/"));
}

#[tokio::test]
async fn test_set_locale_control_char_redirect_goes_home() {
    let (_, app) = test_app();

    let response = post_form(
        &app,
        "/api/preferences/locale",
        "locale=en&redirectURL=%2Fa%0Ab",
    )
    .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/"));
    assert!(response.set_cookie("locale").is_some());
}
