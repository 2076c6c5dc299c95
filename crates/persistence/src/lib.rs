//! Persistence layer for the Battery ERP backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - Embedded SQL migrations (src/migrations)

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
