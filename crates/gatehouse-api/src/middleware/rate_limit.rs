//! Fixed-window rate limiting for the auth routes.

use std::net::{IpAddr, Ipv4Addr};

use axum::extract::{Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use gatehouse_auth::RateDecision;
use gatehouse_core::error::AppError;

use crate::error::ApiError;
use crate::extractors::client_ip;
use crate::state::AppState;

/// Admits or rejects the request based on its source address.
///
/// Requests whose address cannot be determined share one bucket.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return next.run(request).await;
    };

    let addr = client_ip(request.extensions(), request.headers())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    match limiter.check(addr) {
        RateDecision::Allowed { .. } => next.run(request).await,
        RateDecision::Limited { retry_after } => {
            let seconds = retry_after
                .as_secs()
                .saturating_add(u64::from(retry_after.subsec_nanos() > 0))
                .max(1);

            warn!(
                addr = %addr,
                path = %request.uri().path(),
                retry_after = seconds,
                "Auth rate limit exceeded"
            );

            let mut response =
                ApiError::from(AppError::rate_limited("Too many requests")).into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
            response
        }
    }
}
