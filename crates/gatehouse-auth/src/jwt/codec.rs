//! HS256 token issuance and validation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use gatehouse_core::config::AuthConfig;

use super::claims::{Claims, TokenKind, WireClaims};

/// Token validation and signing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Malformed, tampered, wrongly signed, wrong issuer, not yet valid,
    /// or of the wrong kind.
    #[error("invalid token")]
    Invalid,
    /// Well-formed and correctly signed, but past its expiry.
    #[error("token expired")]
    Expired,
    /// The token could not be signed.
    #[error("failed to sign token")]
    Signing,
}

/// Signs and validates access and refresh tokens with one HMAC secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenCodec {
    /// Creates a codec with explicit lifetimes.
    pub fn new(
        secret: &[u8],
        issuer: impl Into<String>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        let issuer = issuer.into();

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by hand so that `exp == now` counts as expired.
        validation.validate_exp = false;
        validation.validate_nbf = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss", "sub", "nbf"]);
        validation.set_issuer(&[issuer.as_str()]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Creates a codec from auth configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        // Out-of-range lifetimes saturate; `issue` then reports `Signing`.
        Self::new(
            config.jwt_secret.as_bytes(),
            config.jwt_issuer.clone(),
            Duration::try_minutes(config.access_token_ttl_minutes).unwrap_or(Duration::MAX),
            Duration::try_hours(config.refresh_token_ttl_hours).unwrap_or(Duration::MAX),
        )
    }

    /// The issuer stamped on every token.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issues a short-lived access token.
    pub fn issue_access_token(
        &self,
        user_id: Uuid,
        email: &str,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        self.issue(user_id, email, TokenKind::Access, self.access_ttl, None)
    }

    /// Issues a long-lived refresh token with a unique `jti`.
    pub fn issue_refresh_token(
        &self,
        user_id: Uuid,
        email: &str,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let jti = Uuid::new_v4().to_string();
        self.issue(user_id, email, TokenKind::Refresh, self.refresh_ttl, Some(jti))
    }

    fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        kind: TokenKind,
        ttl: Duration,
        jti: Option<String>,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            debug!(ttl_seconds = ttl.num_seconds(), "Token lifetime overflows the calendar");
            TokenError::Signing
        })?;

        let claims = WireClaims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            token_type: kind,
            jti,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                debug!(error = %e, "Failed to encode token");
                TokenError::Signing
            })?;

        Ok((token, expires_at))
    }

    /// Validates a token of either kind.
    ///
    /// Signature, issuer and not-before are checked first, then expiry, then
    /// the shape of the identity claims.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Invalid);
        }

        let data = decode::<WireClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                match e.kind() {
                    JwtErrorKind::InvalidSignature => debug!("Token signature mismatch"),
                    JwtErrorKind::InvalidAlgorithm => debug!("Token algorithm rejected"),
                    JwtErrorKind::InvalidIssuer => debug!("Token issuer rejected"),
                    JwtErrorKind::ImmatureSignature => debug!("Token not yet valid"),
                    _ => debug!(error = %e, "Token rejected"),
                }
                TokenError::Invalid
            },
        )?;
        let wire = data.claims;

        if wire.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        let user_id = Uuid::parse_str(&wire.user_id).map_err(|_| TokenError::Invalid)?;
        if wire.sub != wire.user_id {
            return Err(TokenError::Invalid);
        }

        Ok(Claims {
            user_id,
            email: wire.email,
            issuer: wire.iss,
            issued_at: wire.iat,
            not_before: wire.nbf,
            expires_at: wire.exp,
            kind: wire.token_type,
            jti: wire.jti,
        })
    }

    /// Validates an access token. A refresh token is `Invalid` here.
    pub fn validate_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_kind(token, TokenKind::Access)
    }

    /// Validates a refresh token. An access token is `Invalid` here.
    pub fn validate_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_kind(token, TokenKind::Refresh)
    }

    fn validate_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.validate(token)?;
        if claims.kind != kind {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-that-is-long-enough-32b";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, "service", Duration::minutes(15), Duration::days(7))
    }

    fn sign(claims: &WireClaims, header: &Header, secret: &[u8]) -> String {
        encode(header, claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn wire(user_id: &str) -> WireClaims {
        let now = Utc::now().timestamp();
        WireClaims {
            user_id: user_id.to_string(),
            email: "alice@example.com".to_string(),
            iss: "service".to_string(),
            sub: user_id.to_string(),
            iat: now,
            nbf: now,
            exp: now + 600,
            token_type: TokenKind::Access,
            jti: None,
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let (token, expires_at) = codec.issue_access_token(user_id, "alice@example.com").unwrap();

        let claims = codec.validate(&token).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.issuer, "service");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.expires_at, expires_at.timestamp());
        assert!(claims.jti.is_none());
    }

    #[test]
    fn test_zero_and_negative_ttl_are_expired() {
        let zero = TokenCodec::new(SECRET, "service", Duration::zero(), Duration::zero());
        let (token, _) = zero.issue_access_token(Uuid::new_v4(), "a@b.io").unwrap();
        assert_eq!(zero.validate(&token), Err(TokenError::Expired));

        let negative =
            TokenCodec::new(SECRET, "service", Duration::minutes(-5), Duration::minutes(-5));
        let (token, _) = negative.issue_refresh_token(Uuid::new_v4(), "a@b.io").unwrap();
        assert_eq!(negative.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_overlong_ttl_is_a_signing_error() {
        let config = AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            refresh_token_ttl_hours: 3_000_000_000,
            access_token_ttl_minutes: i64::MAX,
            ..AuthConfig::default()
        };
        let codec = TokenCodec::from_config(&config);

        assert_eq!(
            codec.issue_refresh_token(Uuid::new_v4(), "a@b.io").unwrap_err(),
            TokenError::Signing
        );
        assert_eq!(
            codec.issue_access_token(Uuid::new_v4(), "a@b.io").unwrap_err(),
            TokenError::Signing
        );
    }

    #[test]
    fn test_tampered_or_foreign_tokens_are_invalid() {
        let codec = codec();
        let (token, _) = codec.issue_access_token(Uuid::new_v4(), "a@b.io").unwrap();

        // Graft another token's payload onto this token's signature.
        let (other_token, _) = codec.issue_access_token(Uuid::new_v4(), "eve@b.io").unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other_token.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);
        assert_eq!(codec.validate(&tampered), Err(TokenError::Invalid));

        let other = TokenCodec::new(
            b"another-secret-that-is-long-enough",
            "service",
            Duration::minutes(15),
            Duration::days(7),
        );
        assert_eq!(other.validate(&token), Err(TokenError::Invalid));

        assert_eq!(codec.validate(""), Err(TokenError::Invalid));
        assert_eq!(codec.validate("not.a.jwt"), Err(TokenError::Invalid));
    }

    #[test]
    fn test_wrong_issuer_is_invalid() {
        let token = sign(
            &WireClaims {
                iss: "someone-else".to_string(),
                ..wire(&Uuid::new_v4().to_string())
            },
            &Header::new(Algorithm::HS256),
            SECRET,
        );
        assert_eq!(codec().validate(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_other_algorithm_is_invalid() {
        let token = sign(
            &wire(&Uuid::new_v4().to_string()),
            &Header::new(Algorithm::HS512),
            SECRET,
        );
        assert_eq!(codec().validate(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_not_yet_valid_is_invalid() {
        let future = Utc::now().timestamp() + 3600;
        let token = sign(
            &WireClaims {
                nbf: future,
                exp: future + 600,
                ..wire(&Uuid::new_v4().to_string())
            },
            &Header::new(Algorithm::HS256),
            SECRET,
        );
        assert_eq!(codec().validate(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_non_uuid_user_id_is_invalid() {
        let token = sign(&wire("user-42"), &Header::new(Algorithm::HS256), SECRET);
        assert_eq!(codec().validate(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_kind_must_match() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let (access, _) = codec.issue_access_token(user_id, "a@b.io").unwrap();
        let (refresh, _) = codec.issue_refresh_token(user_id, "a@b.io").unwrap();

        assert!(codec.validate_access(&access).is_ok());
        assert!(codec.validate_refresh(&refresh).is_ok());
        assert_eq!(codec.validate_refresh(&access), Err(TokenError::Invalid));
        assert_eq!(codec.validate_access(&refresh), Err(TokenError::Invalid));
    }

    #[test]
    fn test_refresh_tokens_in_same_second_differ() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let (a, _) = codec.issue_refresh_token(user_id, "a@b.io").unwrap();
        let (b, _) = codec.issue_refresh_token(user_id, "a@b.io").unwrap();
        assert_ne!(a, b);

        let ca = codec.validate_refresh(&a).unwrap();
        let cb = codec.validate_refresh(&b).unwrap();
        assert!(ca.jti.is_some());
        assert_ne!(ca.jti, cb.jti);
    }
}
