//! Session lifecycle: credential flows, refresh rotation, and ledger upkeep.

pub mod cleanup;
pub mod error;
pub mod lifecycle;

pub use cleanup::LedgerCleanup;
pub use error::LifecycleError;
pub use lifecycle::{AuthSession, LifecycleSettings, SessionLifecycle, TokenPair};
