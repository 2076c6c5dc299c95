//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod battery;
pub mod customer;
pub mod invoice;
pub mod settings;
pub mod user;

pub use battery::{BatteryEntity, BatteryStatusDb, StatusHistoryEntity};
pub use customer::{CustomerEntity, CustomerTypeDb};
pub use invoice::{
    InvoiceEntity, InvoiceItemEntity, ItemTypeDb, PaymentMethodDb, PaymentStatusDb,
};
pub use settings::ShopSettingsEntity;
pub use user::{StaffRoleDb, UserEntity};
