//! `AuthUser` extractor: pulls the bearer access token from the
//! Authorization header and validates it.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use uuid::Uuid;

use gatehouse_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// The caller identified by a valid access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Identity id from the token.
    pub user_id: Uuid,
    /// Email from the token.
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid Authorization header format"))?;

        let claims = state.lifecycle.codec().validate_access(token).map_err(|e| {
            tracing::debug!(error = %e, "Access token rejected");
            AppError::unauthorized("Invalid or expired access token")
        })?;

        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.email,
        })
    }
}
