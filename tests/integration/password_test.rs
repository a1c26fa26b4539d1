//! Password change and reset over HTTP.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

async fn change_password(
    app: &TestApp,
    access: &str,
    current: &str,
    new: &str,
) -> StatusCode {
    app.request(
        "POST",
        "/api/auth/change-password",
        Some(json!({ "current_password": current, "new_password": new })),
        Some(access),
    )
    .await
    .status
}

async fn forgot(app: &TestApp, email: &str) -> crate::helpers::TestResponse {
    app.request(
        "POST",
        "/api/auth/forgot-password",
        Some(json!({ "email": email })),
        None,
    )
    .await
}

async fn reset(app: &TestApp, token: &str, new_password: &str) -> StatusCode {
    app.request(
        "POST",
        "/api/auth/reset-password",
        Some(json!({ "token": token, "new_password": new_password })),
        None,
    )
    .await
    .status
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new();
    let registered = app.register("judy@example.com", "password123").await;
    let access = registered.data_str("access_token");
    let refresh = registered.data_str("refresh_token");

    assert_eq!(
        change_password(&app, &access, "password123", "password123").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        change_password(&app, &access, "wrong-current", "new-password-1").await,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        change_password(&app, &access, "password123", "new-password-1").await,
        StatusCode::OK
    );

    assert_eq!(
        app.login("judy@example.com", "password123").await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.login("judy@example.com", "new-password-1").await.status,
        StatusCode::OK
    );

    // Existing sessions survive a voluntary change.
    assert_eq!(app.refresh(&refresh).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_change_password_requires_bearer() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/change-password",
            Some(json!({ "current_password": "a", "new_password": "b" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forgot_password_does_not_reveal_accounts() {
    let app = TestApp::new();
    app.register("ken@example.com", "password123").await;

    let known = forgot(&app, "KEN@example.com").await;
    let unknown = forgot(&app, "nobody@example.com").await;

    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(known.body, unknown.body);

    assert!(app.notifier.last_reset_token("ken@example.com").is_some());
    assert!(app.notifier.last_reset_token("nobody@example.com").is_none());
}

#[tokio::test]
async fn test_reset_password_is_single_use_and_revokes_sessions() {
    let app = TestApp::new();
    let registered = app.register("lena@example.com", "password123").await;
    let refresh = registered.data_str("refresh_token");

    forgot(&app, "lena@example.com").await;
    let token = app.notifier.last_reset_token("lena@example.com").unwrap();

    assert_eq!(reset(&app, &token, "brand-new-pass").await, StatusCode::OK);
    assert_eq!(
        reset(&app, &token, "another-new-pass").await,
        StatusCode::BAD_REQUEST
    );

    assert_eq!(app.refresh(&refresh).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.login("lena@example.com", "password123").await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.login("lena@example.com", "brand-new-pass").await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_reset_password_rejects_superseded_and_unknown_tokens() {
    let app = TestApp::new();
    app.register("mike@example.com", "password123").await;

    forgot(&app, "mike@example.com").await;
    let stale = app.notifier.last_reset_token("mike@example.com").unwrap();
    forgot(&app, "mike@example.com").await;
    let fresh = app.notifier.last_reset_token("mike@example.com").unwrap();
    assert_ne!(stale, fresh);

    assert_eq!(
        reset(&app, &stale, "new-password-1").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        reset(&app, "made-up-token", "new-password-1").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(reset(&app, &fresh, "new-password-1").await, StatusCode::OK);
}

#[tokio::test]
async fn test_reset_password_validates_new_password_first() {
    let app = TestApp::new();
    app.register("nina@example.com", "password123").await;
    forgot(&app, "nina@example.com").await;
    let token = app.notifier.last_reset_token("nina@example.com").unwrap();

    assert_eq!(reset(&app, &token, "short").await, StatusCode::BAD_REQUEST);
    // The token was not consumed by the rejected attempt.
    assert_eq!(reset(&app, &token, "long-enough-now").await, StatusCode::OK);
}

#[tokio::test]
async fn test_deadline_exceeded_returns_503_without_side_effects() {
    let app = TestApp::builder()
        .request_timeout(Duration::from_millis(1))
        .build();

    let response = app.register("olga@example.com", "password123").await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(app.identities.is_empty().await);
    assert!(app.ledger.is_empty().await);
}
