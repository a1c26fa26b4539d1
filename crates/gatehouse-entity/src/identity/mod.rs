//! Identity domain entities.

pub mod model;

pub use model::{CreateIdentity, Identity, PublicIdentity, normalize_email};
