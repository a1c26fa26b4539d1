//! # gatehouse-core
//!
//! Core crate for Gatehouse. Contains configuration schemas and the
//! unified infrastructure error.
//!
//! This crate has **no** internal dependencies on other Gatehouse crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
