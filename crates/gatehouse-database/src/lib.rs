//! # gatehouse-database
//!
//! PostgreSQL connection management, the persistence contracts used by the
//! authentication core, and their PostgreSQL and in-memory implementations.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod traits;

pub use connection::{DatabaseHealth, DatabasePool};
pub use memory::{MemoryIdentityStore, MemoryRefreshTokenLedger};
pub use repositories::{PgIdentityRepository, PgRefreshTokenLedger};
pub use traits::{IdentityStore, LedgerError, RefreshTokenLedger};
