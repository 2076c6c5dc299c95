//! Domain layer for the Battery ERP backend.
//!
//! This crate contains:
//! - Domain models (BatteryRecord, Customer, Invoice, User)
//! - The battery lifecycle engine and QR binding codec
//! - Domain error types

pub mod models;
pub mod services;
