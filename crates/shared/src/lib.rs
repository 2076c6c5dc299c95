//! Shared utilities and common types for the Battery ERP backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic digests (token hashing, payload checksums)
//! - Password hashing with Argon2id
//! - JWT issue and validation
//! - Common validation logic
//! - Cursor pagination

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
