//! Shared test helpers for integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use gatehouse_api::{AppState, build_app};
use gatehouse_auth::{
    AuthRateLimiter, LifecycleSettings, Notifier, NotifyError, SessionLifecycle, TokenCodec,
};
use gatehouse_core::config::CorsConfig;
use gatehouse_database::{MemoryIdentityStore, MemoryRefreshTokenLedger};

/// Address used when a test does not pick one.
pub const DEFAULT_ADDR: &str = "198.51.100.10";

const TEST_SECRET: &[u8] = b"integration-test-secret-with-enough-entropy";

/// Notifier that keeps every reset token it is asked to deliver.
#[derive(Debug, Default)]
pub struct CapturingNotifier {
    resets: Mutex<Vec<(String, String)>>,
}

impl CapturingNotifier {
    /// Most recent reset token sent to `email`.
    pub fn last_reset_token(&self, email: &str) -> Option<String> {
        self.resets
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, token)| token.clone())
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn send_password_reset(&self, email: &str, token: &str) -> Result<(), NotifyError> {
        self.resets
            .lock()
            .unwrap()
            .push((email.to_string(), token.to_string()));
        Ok(())
    }

    async fn send_password_changed(&self, _email: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Test application context
#[derive(Clone)]
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Identity storage behind the router
    pub identities: MemoryIdentityStore,
    /// Refresh-token ledger behind the router
    pub ledger: MemoryRefreshTokenLedger,
    /// Captured notifications
    pub notifier: Arc<CapturingNotifier>,
}

/// Test response wrapper
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body as JSON (`Value::Null` when empty)
    pub body: Value,
}

impl TestResponse {
    /// The `data` payload of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// A string field of the `data` payload.
    pub fn data_str(&self, field: &str) -> String {
        self.body["data"][field]
            .as_str()
            .unwrap_or_else(|| panic!("missing `{field}` in {}", self.body))
            .to_string()
    }
}

/// Builder for a [`TestApp`].
pub struct TestAppBuilder {
    rate_limiter: Option<AuthRateLimiter>,
    request_timeout: Duration,
}

impl TestAppBuilder {
    /// Put a limiter in front of the auth routes.
    pub fn rate_limit(mut self, max_requests: u32, window: Duration) -> Self {
        self.rate_limiter = Some(AuthRateLimiter::new(max_requests, window));
        self
    }

    /// Override the per-request deadline.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Assemble the application.
    pub fn build(self) -> TestApp {
        let identities = MemoryIdentityStore::new();
        let ledger = MemoryRefreshTokenLedger::new();
        let notifier = Arc::new(CapturingNotifier::default());

        let codec = Arc::new(TokenCodec::new(
            TEST_SECRET,
            "gatehouse-test",
            chrono::Duration::minutes(15),
            chrono::Duration::days(7),
        ));
        let lifecycle = SessionLifecycle::new(
            Arc::new(identities.clone()),
            Arc::new(ledger.clone()),
            codec,
            LifecycleSettings::default(),
        )
        .with_notifier(notifier.clone());

        let mut state = AppState::new(Arc::new(lifecycle), self.request_timeout);
        if let Some(limiter) = self.rate_limiter {
            state = state.with_rate_limiter(limiter);
        }

        TestApp {
            router: build_app(state, &CorsConfig::default()),
            identities,
            ledger,
            notifier,
        }
    }
}

impl TestApp {
    /// Create a test application without rate limiting
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a test application
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            rate_limiter: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Make an HTTP request from the default address
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        self.request_from(DEFAULT_ADDR, method, path, body, token)
            .await
    }

    /// Make an HTTP request that appears to come from `addr`
    pub async fn request_from(
        &self,
        addr: &str,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("x-forwarded-for", addr)
            .header("user-agent", "gatehouse-integration");

        if let Some(t) = token {
            builder = builder.header("authorization", format!("Bearer {t}"));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Register an account and return the response
    pub async fn register(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/auth/register",
            Some(serde_json::json!({ "email": email, "password": password })),
            None,
        )
        .await
    }

    /// Log in and return the response
    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "email": email, "password": password })),
            None,
        )
        .await
    }

    /// Exchange a refresh token and return the response
    pub async fn refresh(&self, refresh_token: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/auth/refresh",
            Some(serde_json::json!({ "refresh_token": refresh_token })),
            None,
        )
        .await
    }
}
