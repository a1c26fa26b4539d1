//! # gatehouse-api
//!
//! HTTP API layer for Gatehouse built on Axum.
//!
//! Exposes the authentication entry points under `/api/auth`, a health
//! endpoint, the per-address rate limiter in front of the auth routes, and
//! the mapping from domain errors to HTTP responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
