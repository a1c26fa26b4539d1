//! End-to-end tests driving the HTTP router over in-memory stores.

mod auth_test;
mod helpers;
mod password_test;
mod rate_limit_test;
