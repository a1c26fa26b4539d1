//! JWT token encoding, decoding, and claims.

pub mod claims;
pub mod codec;

pub use claims::{Claims, TokenKind};
pub use codec::{TokenCodec, TokenError};
