//! Domain models for the Battery ERP backend.

pub mod battery;
pub mod customer;
pub mod invoice;
pub mod permission;
pub mod settings;
pub mod user;

pub use battery::{BatteryRecord, BatteryStatus, StatusEntry};
pub use customer::{Customer, CustomerType};
pub use invoice::{Invoice, InvoiceItem, ItemType, PaymentMethod, PaymentStatus};
pub use permission::{Permission, PermissionCategory};
pub use settings::ShopSettings;
pub use user::{StaffRole, User};
