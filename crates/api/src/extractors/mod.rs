//! Custom Axum extractors.
//!
//! Extractors for parsing and validating request data.

pub mod user_auth;

pub use user_auth::UserAuth;
