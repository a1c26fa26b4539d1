//! # gatehouse-auth
//!
//! The authentication core of Gatehouse.
//!
//! ## Modules
//!
//! - `password`: Argon2id password hashing with length bounds
//! - `jwt`: HS256 access and refresh token issuance and validation
//! - `token`: opaque random tokens and their SHA-256 digests
//! - `session`: the register/login/refresh/logout/reset lifecycle and ledger cleanup
//! - `ratelimit`: per-address fixed-window admission for auth endpoints
//! - `notify`: the outbound notification seam

pub mod jwt;
pub mod notify;
pub mod password;
pub mod ratelimit;
pub mod session;
pub mod token;

pub use jwt::{Claims, TokenCodec, TokenError, TokenKind};
pub use notify::{LogNotifier, NotifyError, Notifier};
pub use password::{PasswordError, PasswordHasher};
pub use ratelimit::{AuthRateLimiter, RateDecision};
pub use session::{
    AuthSession, LedgerCleanup, LifecycleError, LifecycleSettings, SessionLifecycle, TokenPair,
};
pub use token::{SecureTokenError, SecureTokenGenerator};
