//! Cryptographically random opaque tokens and their SHA-256 digests.
//!
//! Used for password-reset tokens and for indexing refresh tokens at rest.
//! Independent of the JWT codec.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Default entropy of generated tokens, in bytes.
pub const DEFAULT_TOKEN_BYTES: usize = 32;

/// Token generation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SecureTokenError {
    /// A zero byte length was requested.
    #[error("token length must be positive")]
    NonPositiveLength,
}

/// Generates and digests opaque tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureTokenGenerator;

impl SecureTokenGenerator {
    /// Draws `byte_len` bytes from the thread CSPRNG and encodes them as
    /// URL-safe base64 without padding.
    pub fn generate(byte_len: usize) -> Result<String, SecureTokenError> {
        if byte_len == 0 {
            return Err(SecureTokenError::NonPositiveLength);
        }
        let mut bytes = vec![0u8; byte_len];
        rand::rng().fill_bytes(&mut bytes);
        Ok(URL_SAFE_NO_PAD.encode(&bytes))
    }

    /// Hex SHA-256 digest of `raw`.
    pub fn hash(raw: &str) -> String {
        format!("{:x}", Sha256::digest(raw.as_bytes()))
    }

    /// Recomputes the digest of `raw` and compares it to `digest` in
    /// constant time. Empty inputs never verify.
    pub fn verify(raw: &str, digest: &str) -> bool {
        if raw.is_empty() || digest.is_empty() {
            return false;
        }
        constant_time_eq(Self::hash(raw).as_bytes(), digest.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
