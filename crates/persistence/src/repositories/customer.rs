//! Customer repository for database operations.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{CustomerEntity, CustomerTypeDb};
use crate::metrics::QueryTimer;

/// Field values for inserting a customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub gst_number: Option<String>,
    pub customer_type: CustomerTypeDb,
    pub notes: Option<String>,
    pub created_by: Uuid,
}

/// Partial update for a customer. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub gst_number: Option<String>,
    pub customer_type: Option<CustomerTypeDb>,
    pub notes: Option<String>,
}

/// Repository for customer-related database operations.
#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a new customer.
    pub async fn create(&self, fields: NewCustomer) -> Result<CustomerEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_customer");
        let now = Utc::now();
        let result = sqlx::query_as::<_, CustomerEntity>(
            r#"
            INSERT INTO customers (id, name, phone, email, address, city,
                                   gst_number, customer_type, notes, is_active,
                                   created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, true, $10, $11, $11)
            RETURNING id, name, phone, email, address, city, gst_number,
                      customer_type, notes, is_active, created_by, created_at,
                      updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&fields.name)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(&fields.address)
        .bind(&fields.city)
        .bind(&fields.gst_number)
        .bind(fields.customer_type)
        .bind(&fields.notes)
        .bind(fields.created_by)
        .bind(now)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a customer by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CustomerEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_customer_by_id");
        let result = sqlx::query_as::<_, CustomerEntity>(
            r#"
            SELECT id, name, phone, email, address, city, gst_number,
                   customer_type, notes, is_active, created_by, created_at,
                   updated_at
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List active customers newest first, optionally matching a search term
    /// against name or phone.
    pub async fn list(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CustomerEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_customers");
        let pattern = search.map(|s| format!("%{}%", s));
        let result = sqlx::query_as::<_, CustomerEntity>(
            r#"
            SELECT id, name, phone, email, address, city, gst_number,
                   customer_type, notes, is_active, created_by, created_at,
                   updated_at
            FROM customers
            WHERE is_active = true
              AND ($1::text IS NULL OR name ILIKE $1 OR phone LIKE $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count active customers matching a search term.
    pub async fn count(&self, search: Option<&str>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_customers");
        let pattern = search.map(|s| format!("%{}%", s));
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM customers
            WHERE is_active = true
              AND ($1::text IS NULL OR name ILIKE $1 OR phone LIKE $1)
            "#,
        )
        .bind(pattern)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partial update. Returns the updated row, or `None` if not found.
    pub async fn update(
        &self,
        id: Uuid,
        changes: CustomerChanges,
    ) -> Result<Option<CustomerEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_customer");
        let result = sqlx::query_as::<_, CustomerEntity>(
            r#"
            UPDATE customers
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                email = COALESCE($4, email),
                address = COALESCE($5, address),
                city = COALESCE($6, city),
                gst_number = COALESCE($7, gst_number),
                customer_type = COALESCE($8, customer_type),
                notes = COALESCE($9, notes),
                updated_at = $10
            WHERE id = $1
            RETURNING id, name, phone, email, address, city, gst_number,
                      customer_type, notes, is_active, created_by, created_at,
                      updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.phone)
        .bind(&changes.email)
        .bind(&changes.address)
        .bind(&changes.city)
        .bind(&changes.gst_number)
        .bind(changes.customer_type)
        .bind(&changes.notes)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deactivate a customer (soft delete).
    /// Returns the number of rows affected (0 if not found).
    pub async fn deactivate(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("deactivate_customer");
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET is_active = false, updated_at = $2
            WHERE id = $1 AND is_active = true
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected());
        timer.record();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_changes_default_keeps_everything() {
        let changes = CustomerChanges::default();
        assert!(changes.name.is_none());
        assert!(changes.phone.is_none());
        assert!(changes.customer_type.is_none());
    }
}
