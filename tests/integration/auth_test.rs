//! Registration, login, refresh rotation and logout over HTTP.

use axum::http::{StatusCode, header};
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_register_returns_tokens_and_public_user() {
    let app = TestApp::new();

    let response = app.register("  Alice@Example.COM ", "correct-horse").await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["success"], true);
    let data = response.data();
    assert_eq!(data["token_type"], "Bearer");
    assert!(data["access_token"].is_string());
    assert!(data["refresh_token"].is_string());
    assert_eq!(data["user"]["email"], "alice@example.com");
    assert!(data["user"].get("password_hash").is_none());
    assert_eq!(app.ledger.len().await, 1);
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = TestApp::new();
    app.register("bob@example.com", "password123").await;

    let response = app.register("BOB@example.com", "another-pass").await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(app.identities.len().await, 1);
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let app = TestApp::new();

    let bad_email = app.register("not-an-email", "password123").await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);

    let short = app.register("carol@example.com", "short").await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);

    let long = app.register("carol@example.com", &"x".repeat(73)).await;
    assert_eq!(long.status, StatusCode::BAD_REQUEST);

    assert!(app.identities.is_empty().await);
}

#[tokio::test]
async fn test_login_success_and_failures() {
    let app = TestApp::new();
    app.register("dave@example.com", "password123").await;

    let ok = app.login("DAVE@example.com", "password123").await;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.data()["user"]["last_login_at"].is_string());

    let wrong = app.login("dave@example.com", "wrong-password").await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        wrong.headers.get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );

    let unknown = app.login("nobody@example.com", "password123").await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.body["message"], wrong.body["message"]);
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_replay() {
    let app = TestApp::new();
    let registered = app.register("erin@example.com", "password123").await;
    let first = registered.data_str("refresh_token");

    let rotated = app.refresh(&first).await;
    assert_eq!(rotated.status, StatusCode::OK);
    let second = rotated.data_str("refresh_token");
    assert_ne!(first, second);

    let replay = app.refresh(&first).await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);

    let next = app.refresh(&second).await;
    assert_eq!(next.status, StatusCode::OK);
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let app = TestApp::new();
    let registered = app.register("frank@example.com", "password123").await;
    let access = registered.data_str("access_token");

    let response = app.refresh(&access).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let garbage = app.refresh("not.a.jwt").await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_has_one_winner() {
    let app = TestApp::new();
    let registered = app.register("grace@example.com", "password123").await;
    let token = registered.data_str("refresh_token");

    let mut handles = Vec::new();
    for _ in 0..6 {
        let app = app.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move { app.refresh(&token).await.status }));
    }

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }

    let wins = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    assert_eq!(wins, 1, "statuses: {statuses:?}");
    assert!(
        statuses
            .iter()
            .all(|s| *s == StatusCode::OK || *s == StatusCode::UNAUTHORIZED)
    );
}

#[tokio::test]
async fn test_logout_revokes_every_session() {
    let app = TestApp::new();
    let first = app.register("heidi@example.com", "password123").await;
    let second = app.login("heidi@example.com", "password123").await;
    let access = second.data_str("access_token");

    let unauthenticated = app.request("POST", "/api/auth/logout", None, None).await;
    assert_eq!(unauthenticated.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request("POST", "/api/auth/logout", None, Some(&access))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    for session in [&first, &second] {
        let refresh = app.refresh(&session.data_str("refresh_token")).await;
        assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "ivan@example.com" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_reports_ok() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
    assert!(response.data().get("database").is_none());
}
