//! Auth handlers: register, login, refresh, logout, and the password flows.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use gatehouse_auth::SessionLifecycle;

use crate::dto::request::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RefreshRequest, RegisterRequest,
    ResetPasswordRequest,
};
use crate::dto::response::{ApiResponse, AuthResponse, MessageResponse, TokenResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ClientInfo, ValidatedJson};
use crate::state::AppState;

/// Sent for every forgot-password request, whether or not the account exists.
const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for that email, a password reset link has been sent";

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let session = SessionLifecycle::with_deadline(
        state.request_timeout,
        state.lifecycle.register(&req.email, &req.password, &client),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(session.into()))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let session = SessionLifecycle::with_deadline(
        state.request_timeout,
        state.lifecycle.login(&req.email, &req.password, &client),
    )
    .await?;

    Ok(Json(ApiResponse::ok(session.into())))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let tokens = SessionLifecycle::with_deadline(
        state.request_timeout,
        state.lifecycle.refresh(&req.refresh_token, &client),
    )
    .await?;

    Ok(Json(ApiResponse::ok(tokens.into())))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    SessionLifecycle::with_deadline(state.request_timeout, state.lifecycle.logout(auth.user_id))
        .await?;

    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Logged out successfully",
    ))))
}

/// POST /api/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    SessionLifecycle::with_deadline(
        state.request_timeout,
        state.lifecycle.forgot_password(&req.email),
    )
    .await?;

    Ok(Json(ApiResponse::ok(MessageResponse::new(
        FORGOT_PASSWORD_MESSAGE,
    ))))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    SessionLifecycle::with_deadline(
        state.request_timeout,
        state.lifecycle.reset_password(&req.token, &req.new_password),
    )
    .await?;

    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Password has been reset",
    ))))
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    SessionLifecycle::with_deadline(
        state.request_timeout,
        state
            .lifecycle
            .change_password(auth.user_id, &req.current_password, &req.new_password),
    )
    .await?;

    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Password changed",
    ))))
}
