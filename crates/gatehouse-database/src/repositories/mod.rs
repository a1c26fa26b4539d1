//! PostgreSQL implementations of the store traits.

pub mod identity;
pub mod refresh_token;

pub use identity::PgIdentityRepository;
pub use refresh_token::PgRefreshTokenLedger;
