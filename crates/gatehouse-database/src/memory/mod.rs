//! In-memory store implementations for tests and single-node development.
//!
//! Each store keeps its state behind one Tokio mutex, so every conditional
//! update is a single critical section.

pub mod identity;
pub mod ledger;

pub use identity::MemoryIdentityStore;
pub use ledger::MemoryRefreshTokenLedger;
