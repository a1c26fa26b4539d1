//! Argon2id password hashing and verification.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use thiserror::Error;

/// Shortest accepted password, in bytes.
pub const MIN_PASSWORD_BYTES: usize = 8;

/// Longest accepted password, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Reasons a password cannot be hashed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    /// The password is empty.
    #[error("password must not be empty")]
    Empty,
    /// The password is shorter than [`MIN_PASSWORD_BYTES`].
    #[error("password must be at least {MIN_PASSWORD_BYTES} bytes")]
    TooShort,
    /// The password is longer than [`MAX_PASSWORD_BYTES`].
    #[error("password must be at most {MAX_PASSWORD_BYTES} bytes")]
    TooLong,
    /// The underlying hash function failed.
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Handles password hashing and verification using Argon2id.
///
/// Both operations are CPU-bound; async callers should run them on the
/// blocking pool.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Creates a new password hasher instance.
    pub fn new() -> Self {
        Self
    }

    /// Checks the length bounds without hashing.
    pub fn validate(password: &str) -> Result<(), PasswordError> {
        match password.len() {
            0 => Err(PasswordError::Empty),
            n if n < MIN_PASSWORD_BYTES => Err(PasswordError::TooShort),
            n if n > MAX_PASSWORD_BYTES => Err(PasswordError::TooLong),
            _ => Ok(()),
        }
    }

    /// Hashes a plaintext password with a random salt.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        Self::validate(password)?;

        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// Verifies a plaintext password against a stored hash.
    ///
    /// Malformed hashes and empty inputs verify as `false`.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        if password.is_empty() || digest.is_empty() {
            return false;
        }
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
