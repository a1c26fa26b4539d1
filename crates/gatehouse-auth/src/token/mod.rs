//! Opaque random tokens and digests.

pub mod generator;

pub use generator::{SecureTokenError, SecureTokenGenerator};
