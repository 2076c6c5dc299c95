//! Invoice repository for database operations.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::invoice::{derive_payment_status, Invoice, InvoiceItem};
use domain::models::settings::format_invoice_number;

use crate::entities::{InvoiceEntity, InvoiceItemEntity, PaymentMethodDb, PaymentStatusDb};
use crate::metrics::QueryTimer;

/// Field values for inserting an invoice. Totals are computed by the caller
/// from the line items before they get here.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub battery_id: String,
    pub customer_id: Uuid,
    pub items: Vec<InvoiceItem>,
    pub service_charges: i64,
    pub parts_total: i64,
    pub discount: i64,
    pub total_amount: i64,
    pub notes: Option<String>,
    pub created_by: Uuid,
}

/// Repository for invoice-related database operations.
#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create an invoice for a battery.
    ///
    /// One transaction allocates the next invoice number from the settings
    /// row, inserts the invoice and its items, and stamps the battery with
    /// the invoice id. The counter row update serializes concurrent
    /// creations so numbers are never shared. Returns `None` when the
    /// battery was already invoiced (or vanished) by the time the stamp
    /// ran; nothing is written in that case.
    pub async fn create(&self, fields: NewInvoice) -> Result<Option<Invoice>, sqlx::Error> {
        let timer = QueryTimer::new("create_invoice");
        let mut tx = self.pool.begin().await?;

        let (prefix, allocated): (String, i64) = sqlx::query_as(
            r#"
            UPDATE shop_settings
            SET next_invoice_number = next_invoice_number + 1
            WHERE id = 1
            RETURNING invoice_prefix, next_invoice_number - 1
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;
        let invoice_number = format_invoice_number(&prefix, allocated);

        let now = Utc::now();
        let entity = sqlx::query_as::<_, InvoiceEntity>(
            r#"
            INSERT INTO invoices (id, invoice_number, battery_id, customer_id,
                                  service_charges, parts_total, discount,
                                  total_amount, amount_paid, payment_status,
                                  payment_method, notes, created_by,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, 'pending', NULL, $9,
                    $10, $11, $11)
            RETURNING id, invoice_number, battery_id, customer_id,
                      service_charges, parts_total, discount, total_amount,
                      amount_paid, payment_status, payment_method, notes,
                      created_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&invoice_number)
        .bind(&fields.battery_id)
        .bind(fields.customer_id)
        .bind(fields.service_charges)
        .bind(fields.parts_total)
        .bind(fields.discount)
        .bind(fields.total_amount)
        .bind(&fields.notes)
        .bind(fields.created_by)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let mut item_entities = Vec::with_capacity(fields.items.len());
        for item in &fields.items {
            let item_entity = sqlx::query_as::<_, InvoiceItemEntity>(
                r#"
                INSERT INTO invoice_items (invoice_id, item_type, name,
                                           quantity, unit_price, total)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, invoice_id, item_type, name, quantity,
                          unit_price, total
                "#,
            )
            .bind(entity.id)
            .bind(crate::entities::ItemTypeDb::from(item.item_type))
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total)
            .fetch_one(&mut *tx)
            .await?;
            item_entities.push(item_entity);
        }

        let stamped = sqlx::query(
            r#"
            UPDATE batteries
            SET invoice_id = $2, updated_at = $3
            WHERE id = $1 AND invoice_id IS NULL
            "#,
        )
        .bind(&fields.battery_id)
        .bind(entity.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if stamped.rows_affected() == 0 {
            timer.record();
            return Ok(None);
        }

        tx.commit().await?;
        timer.record();
        Ok(Some(entity.into_invoice(item_entities)))
    }

    /// Find an invoice by id, items included.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, sqlx::Error> {
        let timer = QueryTimer::new("find_invoice_by_id");
        let entity = sqlx::query_as::<_, InvoiceEntity>(
            r#"
            SELECT id, invoice_number, battery_id, customer_id,
                   service_charges, parts_total, discount, total_amount,
                   amount_paid, payment_status, payment_method, notes,
                   created_by, created_at, updated_at
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(entity) = entity else {
            timer.record();
            return Ok(None);
        };

        let items = self.items_for(id).await?;
        timer.record();
        Ok(Some(entity.into_invoice(items)))
    }

    /// List invoices newest first, optionally filtered by settlement state.
    pub async fn list(
        &self,
        payment_status: Option<PaymentStatusDb>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Invoice>, sqlx::Error> {
        let timer = QueryTimer::new("list_invoices");
        let entities = sqlx::query_as::<_, InvoiceEntity>(
            r#"
            SELECT id, invoice_number, battery_id, customer_id,
                   service_charges, parts_total, discount, total_amount,
                   amount_paid, payment_status, payment_method, notes,
                   created_by, created_at, updated_at
            FROM invoices
            WHERE ($1::payment_status IS NULL OR payment_status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(payment_status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        if entities.is_empty() {
            timer.record();
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = entities.iter().map(|e| e.id).collect();
        let item_rows = sqlx::query_as::<_, InvoiceItemEntity>(
            r#"
            SELECT id, invoice_id, item_type, name, quantity, unit_price, total
            FROM invoice_items
            WHERE invoice_id = ANY($1)
            ORDER BY invoice_id, id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: std::collections::HashMap<Uuid, Vec<InvoiceItemEntity>> =
            std::collections::HashMap::new();
        for row in item_rows {
            grouped.entry(row.invoice_id).or_default().push(row);
        }

        let invoices = entities
            .into_iter()
            .map(|entity| {
                let items = grouped.remove(&entity.id).unwrap_or_default();
                entity.into_invoice(items)
            })
            .collect();

        timer.record();
        Ok(invoices)
    }

    /// Count invoices, optionally filtered by settlement state.
    pub async fn count(
        &self,
        payment_status: Option<PaymentStatusDb>,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_invoices");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM invoices
            WHERE ($1::payment_status IS NULL OR payment_status = $1)
            "#,
        )
        .bind(payment_status)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Record a payment against an invoice.
    ///
    /// Locks the row, adds the amount onto `amount_paid`, and re-derives the
    /// settlement state from the new running total. Returns the updated
    /// invoice, or `None` if the invoice does not exist.
    pub async fn record_payment(
        &self,
        id: Uuid,
        amount: i64,
        method: PaymentMethodDb,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        let timer = QueryTimer::new("record_invoice_payment");
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, InvoiceEntity>(
            r#"
            SELECT id, invoice_number, battery_id, customer_id,
                   service_charges, parts_total, discount, total_amount,
                   amount_paid, payment_status, payment_method, notes,
                   created_by, created_at, updated_at
            FROM invoices
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            timer.record();
            return Ok(None);
        };

        let new_paid = current.amount_paid + amount;
        let new_status = derive_payment_status(new_paid, current.total_amount);

        let entity = sqlx::query_as::<_, InvoiceEntity>(
            r#"
            UPDATE invoices
            SET amount_paid = $2, payment_status = $3, payment_method = $4,
                updated_at = $5
            WHERE id = $1
            RETURNING id, invoice_number, battery_id, customer_id,
                      service_charges, parts_total, discount, total_amount,
                      amount_paid, payment_status, payment_method, notes,
                      created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(new_paid)
        .bind(PaymentStatusDb::from(new_status))
        .bind(method)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let items = self.items_for(id).await?;
        timer.record();
        Ok(Some(entity.into_invoice(items)))
    }

    async fn items_for(&self, invoice_id: Uuid) -> Result<Vec<InvoiceItemEntity>, sqlx::Error> {
        sqlx::query_as::<_, InvoiceItemEntity>(
            r#"
            SELECT id, invoice_id, item_type, name, quantity, unit_price, total
            FROM invoice_items
            WHERE invoice_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::invoice::ItemType;

    #[test]
    fn test_new_invoice_carries_precomputed_totals() {
        let fields = NewInvoice {
            battery_id: "BAT1700000000001234".to_string(),
            customer_id: Uuid::new_v4(),
            items: vec![InvoiceItem {
                item_type: ItemType::Part,
                name: "Cell bank".to_string(),
                quantity: 3,
                unit_price: 45000,
                total: 135000,
            }],
            service_charges: 25000,
            parts_total: 135000,
            discount: 0,
            total_amount: 160000,
            notes: None,
            created_by: Uuid::new_v4(),
        };
        assert_eq!(fields.parts_total, 135000);
        assert_eq!(fields.total_amount, 160000);
    }
}
