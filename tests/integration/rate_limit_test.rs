//! Per-address admission control in front of the auth routes.

use std::time::Duration;

use axum::http::{StatusCode, header};
use serde_json::json;

use crate::helpers::TestApp;

async fn bad_refresh(app: &TestApp, addr: &str) -> crate::helpers::TestResponse {
    app.request_from(
        addr,
        "POST",
        "/api/auth/refresh",
        Some(json!({ "refresh_token": "not-a-token" })),
        None,
    )
    .await
}

#[tokio::test]
async fn test_eleventh_request_is_limited() {
    let app = TestApp::builder()
        .rate_limit(10, Duration::from_secs(60))
        .build();

    for _ in 0..10 {
        let response = bad_refresh(&app, "203.0.113.5").await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let limited = bad_refresh(&app, "203.0.113.5").await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = limited
        .headers
        .get(header::RETRY_AFTER)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));

    let other = bad_refresh(&app, "203.0.113.6").await;
    assert_eq!(other.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_not_limited() {
    let app = TestApp::builder()
        .rate_limit(1, Duration::from_secs(60))
        .build();

    bad_refresh(&app, "203.0.113.7").await;
    assert_eq!(
        bad_refresh(&app, "203.0.113.7").await.status,
        StatusCode::TOO_MANY_REQUESTS
    );

    for _ in 0..3 {
        let response = app
            .request_from("203.0.113.7", "GET", "/api/health", None, None)
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }
}
