//! Shop settings repository for database operations.
//!
//! The settings table has exactly one row, seeded by the initial migration.
//! Invoice number allocation against this row happens inside the invoice
//! creation transaction, not here.

use chrono::Utc;
use sqlx::PgPool;

use crate::entities::ShopSettingsEntity;
use crate::metrics::QueryTimer;

/// Partial update for the shop settings. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct SettingsChanges {
    pub shop_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub invoice_prefix: Option<String>,
}

/// Repository for shop settings operations.
#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Fetch the settings row.
    pub async fn get(&self) -> Result<ShopSettingsEntity, sqlx::Error> {
        let timer = QueryTimer::new("get_shop_settings");
        let result = sqlx::query_as::<_, ShopSettingsEntity>(
            r#"
            SELECT shop_name, address, phone, invoice_prefix,
                   next_invoice_number, updated_at
            FROM shop_settings
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partial update of the settings row. The invoice counter is not
    /// touched here.
    pub async fn update(
        &self,
        changes: SettingsChanges,
    ) -> Result<ShopSettingsEntity, sqlx::Error> {
        let timer = QueryTimer::new("update_shop_settings");
        let result = sqlx::query_as::<_, ShopSettingsEntity>(
            r#"
            UPDATE shop_settings
            SET shop_name = COALESCE($1, shop_name),
                address = COALESCE($2, address),
                phone = COALESCE($3, phone),
                invoice_prefix = COALESCE($4, invoice_prefix),
                updated_at = $5
            WHERE id = 1
            RETURNING shop_name, address, phone, invoice_prefix,
                      next_invoice_number, updated_at
            "#,
        )
        .bind(&changes.shop_name)
        .bind(&changes.address)
        .bind(&changes.phone)
        .bind(&changes.invoice_prefix)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_changes_default_is_noop() {
        let changes = SettingsChanges::default();
        assert!(changes.shop_name.is_none());
        assert!(changes.invoice_prefix.is_none());
    }
}
