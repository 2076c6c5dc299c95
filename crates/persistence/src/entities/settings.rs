//! Shop settings entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::settings::ShopSettings;

/// Database row mapping for the single-row shop_settings table.
#[derive(Debug, Clone, FromRow)]
pub struct ShopSettingsEntity {
    pub shop_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub invoice_prefix: String,
    pub next_invoice_number: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<ShopSettingsEntity> for ShopSettings {
    fn from(entity: ShopSettingsEntity) -> Self {
        Self {
            shop_name: entity.shop_name,
            address: entity.address,
            phone: entity.phone,
            invoice_prefix: entity.invoice_prefix,
            next_invoice_number: entity.next_invoice_number,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_entity_to_domain() {
        let entity = ShopSettingsEntity {
            shop_name: "PowerCell Battery Works".to_string(),
            address: Some("14 MG Road, Pune".to_string()),
            phone: Some("9876543210".to_string()),
            invoice_prefix: "INV".to_string(),
            next_invoice_number: 43,
            updated_at: Utc::now(),
        };

        let settings: ShopSettings = entity.clone().into();
        assert_eq!(settings.shop_name, entity.shop_name);
        assert_eq!(settings.invoice_prefix, "INV");
        assert_eq!(settings.next_invoice_number, 43);
    }
}
