//! Persistence contracts consumed by the authentication core.

pub mod identity;
pub mod ledger;

pub use identity::IdentityStore;
pub use ledger::{LedgerError, RefreshTokenLedger};
