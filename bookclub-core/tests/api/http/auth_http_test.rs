//! Auth API HTTP tests

use super::{get, post_json, register, send, test_app};
use axum::http::{Method, StatusCode};
use bookclub_core::domain::MemberSummary;
use serde_json::{json, Value};

#[tokio::test]
async fn test_register_opens_session() {
    let (state, app) = test_app();

    let response = post_json(
        &app,
        "/api/auth/register",
        None,
        &json!({"name": "ada", "password": "pixels1", "confirm_password": "pixels1"}),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let member: MemberSummary = response.json();
    assert_eq!(member.name, "ada");

    let cookie = response.set_cookie("session_id").unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/"));
    assert_eq!(response.session_token().unwrap().len(), 64);
    assert_eq!(state.session_repo.count().await, 1);
}

#[tokio::test]
async fn test_register_duplicate_name_is_conflict() {
    let (_, app) = test_app();
    register(&app, "ada", "pixels1").await;

    let response = post_json(
        &app,
        "/api/auth/register",
        None,
        &json!({"name": "ada", "password": "other12", "confirm_password": "other12"}),
    )
    .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_register_password_mismatch() {
    let (_, app) = test_app();

    let response = post_json(
        &app,
        "/api/auth/register",
        None,
        &json!({"name": "ada", "password": "pixels1", "confirm_password": "pixels2"}),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.set_cookie("session_id").is_none());
}

#[tokio::test]
async fn test_register_malformed_body() {
    let (_, app) = test_app();

    let response = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(axum::body::Body::from("{not json")),
        Some("application/json"),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_sign_in_success_and_failure() {
    let (_, app) = test_app();
    register(&app, "ada", "pixels1").await;

    let ok = post_json(
        &app,
        "/api/auth/sign-in",
        None,
        &json!({"name": "ada", "password": "pixels1"}),
    )
    .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.session_token().is_some());

    let wrong_password = post_json(
        &app,
        "/api/auth/sign-in",
        None,
        &json!({"name": "ada", "password": "nope123"}),
    )
    .await;
    let unknown_member = post_json(
        &app,
        "/api/auth/sign-in",
        None,
        &json!({"name": "grace", "password": "pixels1"}),
    )
    .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_member.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_member.body);
}

#[tokio::test]
async fn test_each_sign_in_opens_its_own_session() {
    let (state, app) = test_app();
    let first = register(&app, "ada", "pixels1").await;

    let second = post_json(
        &app,
        "/api/auth/sign-in",
        None,
        &json!({"name": "ada", "password": "pixels1"}),
    )
    .await
    .session_token()
    .unwrap();

    assert_ne!(first, second);
    assert_eq!(state.session_repo.count().await, 2);
    assert_eq!(get(&app, "/api/members/me", Some(&first)).await.status, StatusCode::OK);
    assert_eq!(get(&app, "/api/members/me", Some(&second)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_sign_out_requires_session() {
    let (_, app) = test_app();

    let response = send(&app, Method::POST, "/api/auth/sign-out", None, None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.header("x-route-type"), Some("api"));
    let body: Value = response.json();
    assert_eq!(body["error"], "authentication_required");
}

#[tokio::test]
async fn test_sign_out_deletes_session() {
    let (state, app) = test_app();
    let token = register(&app, "ada", "pixels1").await;

    let response = send(&app, Method::POST, "/api/auth/sign-out", Some(&token), None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(response.set_cookie("session_id").unwrap().contains("Max-Age=0"));
    assert_eq!(state.session_repo.count().await, 0);

    let after = get(&app, "/api/members/me", Some(&token)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let (_, app) = test_app();

    let response = send(&app, Method::POST, "/api/auth/logout", None, None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.set_cookie("session_id").is_some());
}

#[tokio::test]
async fn test_get_sign_out_redirects_home() {
    let (state, app) = test_app();
    let token = register(&app, "ada", "pixels1").await;

    let response = get(&app, "/api/auth/sign-out", Some(&token)).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/"));
    assert_eq!(state.session_repo.count().await, 0);
}

#[tokio::test]
async fn test_expired_session_is_rejected_and_purged() {
    let (state, app) = test_app();
    let token = register(&app, "ada", "pixels1").await;
    state.session_repo.expire_all().await;

    let response = get(&app, "/api/members/me", Some(&token)).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(state.session_repo.count().await, 0);
}

#[tokio::test]
async fn test_unknown_session_token_is_rejected() {
    let (_, app) = test_app();

    let response = get(&app, "/api/members/me", Some(&"f".repeat(64))).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
