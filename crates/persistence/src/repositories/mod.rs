//! Repository implementations for database operations.

pub mod battery;
pub mod customer;
pub mod invoice;
pub mod settings;
pub mod user;

pub use battery::{BatteryListFilter, BatteryRepository};
pub use customer::{CustomerChanges, CustomerRepository, NewCustomer};
pub use invoice::{InvoiceRepository, NewInvoice};
pub use settings::{SettingsChanges, SettingsRepository};
pub use user::{NewUser, UserChanges, UserRepository};
