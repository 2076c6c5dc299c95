//! Application services that sit between the HTTP layer and persistence.

pub mod admin_bootstrap;
pub mod auth;

#[allow(unused_imports)] // Used in routes
pub use auth::AuthService;
