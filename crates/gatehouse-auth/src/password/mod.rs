//! Password hashing and length policy.

pub mod hasher;

pub use hasher::{PasswordError, PasswordHasher};
