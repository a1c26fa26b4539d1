//! # gatehouse-entity
//!
//! Domain entity models for Gatehouse. Every struct in this crate
//! represents a database table row or a domain value object. Database
//! entities derive `sqlx::FromRow`.

pub mod identity;
pub mod token;
