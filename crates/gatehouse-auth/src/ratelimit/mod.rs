//! Admission control for the network-facing auth entry points.

pub mod limiter;

pub use limiter::{AuthRateLimiter, RateDecision};
