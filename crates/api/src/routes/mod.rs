//! HTTP route handlers.

pub mod auth;
pub mod batteries;
pub mod customers;
pub mod health;
pub mod invoices;
pub mod permissions;
pub mod settings;
pub mod users;
