//! Battery repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use domain::models::battery::{BatteryRecord, StatusEntry};

use crate::entities::{BatteryEntity, BatteryStatusDb, StatusHistoryEntity};
use crate::metrics::QueryTimer;

/// Filters for the battery listing query. `cursor` is the (created_at, id)
/// pair of the last row of the previous page.
#[derive(Debug, Clone, Default)]
pub struct BatteryListFilter {
    pub status: Option<BatteryStatusDb>,
    pub customer_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub cursor: Option<(DateTime<Utc>, String)>,
    pub limit: i64,
}

/// Repository for battery-related database operations.
#[derive(Clone)]
pub struct BatteryRepository {
    pool: PgPool,
}

impl BatteryRepository {
    /// Creates a new BatteryRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Store a freshly built record with its initial history entries.
    pub async fn create(&self, record: &BatteryRecord) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("create_battery");
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO batteries (
                id, qr_payload, customer_id, battery_type, brand, model,
                serial_number, voltage_at_arrival, voltage_after_repair,
                capacity, complaint, physical_condition, diagnosis,
                repair_notes, test_results, status, assigned_technician_id,
                created_by, invoice_id, is_delivered, delivered_at,
                delivered_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
            "#,
        )
        .bind(&record.id)
        .bind(&record.qr_payload)
        .bind(record.customer_id)
        .bind(&record.details.battery_type)
        .bind(&record.details.brand)
        .bind(&record.details.model)
        .bind(&record.details.serial_number)
        .bind(record.details.voltage_at_arrival)
        .bind(record.details.voltage_after_repair)
        .bind(&record.details.capacity)
        .bind(&record.details.complaint)
        .bind(&record.details.physical_condition)
        .bind(&record.diagnosis)
        .bind(&record.repair_notes)
        .bind(&record.test_results)
        .bind(BatteryStatusDb::from(record.status))
        .bind(record.assigned_technician_id)
        .bind(record.created_by)
        .bind(record.invoice_id)
        .bind(record.is_delivered)
        .bind(record.delivered_at)
        .bind(record.delivered_by)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *tx)
        .await?;

        for entry in &record.status_history {
            insert_history_entry(&mut tx, &record.id, entry).await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(())
    }

    /// Find a record by its battery id, with history in chronological order.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<BatteryRecord>, sqlx::Error> {
        let timer = QueryTimer::new("find_battery_by_id");
        let entity = sqlx::query_as::<_, BatteryEntity>(
            r#"
            SELECT b.id, b.qr_payload, b.customer_id, b.battery_type, b.brand,
                   b.model, b.serial_number, b.voltage_at_arrival,
                   b.voltage_after_repair, b.capacity, b.complaint,
                   b.physical_condition, b.diagnosis, b.repair_notes,
                   b.test_results, b.status, b.assigned_technician_id,
                   u.full_name AS assigned_technician_name, b.created_by,
                   b.invoice_id, b.is_delivered, b.delivered_at,
                   b.delivered_by, b.created_at, b.updated_at
            FROM batteries b
            LEFT JOIN users u ON b.assigned_technician_id = u.id
            WHERE b.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(entity) = entity else {
            timer.record();
            return Ok(None);
        };

        let history = sqlx::query_as::<_, StatusHistoryEntity>(
            r#"
            SELECT id, battery_id, status, recorded_at, updated_by,
                   updated_by_name, notes, location
            FROM battery_status_history
            WHERE battery_id = $1
            ORDER BY recorded_at ASC, id ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        timer.record();
        Ok(Some(entity.into_record(history)))
    }

    /// List records newest first under the given filters, history included.
    pub async fn list(&self, filter: &BatteryListFilter) -> Result<Vec<BatteryRecord>, sqlx::Error> {
        let timer = QueryTimer::new("list_batteries");
        let (cursor_at, cursor_id) = match &filter.cursor {
            Some((at, id)) => (Some(*at), Some(id.clone())),
            None => (None, None),
        };

        let entities = sqlx::query_as::<_, BatteryEntity>(
            r#"
            SELECT b.id, b.qr_payload, b.customer_id, b.battery_type, b.brand,
                   b.model, b.serial_number, b.voltage_at_arrival,
                   b.voltage_after_repair, b.capacity, b.complaint,
                   b.physical_condition, b.diagnosis, b.repair_notes,
                   b.test_results, b.status, b.assigned_technician_id,
                   u.full_name AS assigned_technician_name, b.created_by,
                   b.invoice_id, b.is_delivered, b.delivered_at,
                   b.delivered_by, b.created_at, b.updated_at
            FROM batteries b
            LEFT JOIN users u ON b.assigned_technician_id = u.id
            WHERE ($1::battery_status IS NULL OR b.status = $1)
              AND ($2::uuid IS NULL OR b.customer_id = $2)
              AND ($3::uuid IS NULL OR b.assigned_technician_id = $3)
              AND ($4::timestamptz IS NULL OR (b.created_at, b.id) < ($4, $5::text))
            ORDER BY b.created_at DESC, b.id DESC
            LIMIT $6
            "#,
        )
        .bind(filter.status)
        .bind(filter.customer_id)
        .bind(filter.technician_id)
        .bind(cursor_at)
        .bind(cursor_id)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;

        if entities.is_empty() {
            timer.record();
            return Ok(Vec::new());
        }

        let ids: Vec<String> = entities.iter().map(|e| e.id.clone()).collect();
        let history_rows = sqlx::query_as::<_, StatusHistoryEntity>(
            r#"
            SELECT id, battery_id, status, recorded_at, updated_by,
                   updated_by_name, notes, location
            FROM battery_status_history
            WHERE battery_id = ANY($1)
            ORDER BY recorded_at ASC, id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<String, Vec<StatusHistoryEntity>> = HashMap::new();
        for row in history_rows {
            grouped.entry(row.battery_id.clone()).or_default().push(row);
        }

        let records = entities
            .into_iter()
            .map(|entity| {
                let history = grouped.remove(&entity.id).unwrap_or_default();
                entity.into_record(history)
            })
            .collect();

        timer.record();
        Ok(records)
    }

    /// Apply an accepted transition under the optimistic concurrency guard.
    ///
    /// The UPDATE only matches while the row still carries
    /// `expected_updated_at`, so of two racing transitions computed from the
    /// same snapshot exactly one commits. Returns `false` when the guard
    /// missed; nothing is written in that case.
    pub async fn apply_transition(
        &self,
        updated: &BatteryRecord,
        entry: &StatusEntry,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("apply_battery_transition");
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE batteries
            SET status = $2, assigned_technician_id = $3, is_delivered = $4,
                delivered_at = $5, delivered_by = $6, updated_at = $7
            WHERE id = $1 AND updated_at = $8
            "#,
        )
        .bind(&updated.id)
        .bind(BatteryStatusDb::from(updated.status))
        .bind(updated.assigned_technician_id)
        .bind(updated.is_delivered)
        .bind(updated.delivered_at)
        .bind(updated.delivered_by)
        .bind(updated.updated_at)
        .bind(expected_updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            timer.record();
            return Ok(false);
        }

        insert_history_entry(&mut tx, &updated.id, entry).await?;
        tx.commit().await?;
        timer.record();
        Ok(true)
    }

    /// Partial update of the repair fields. Absent values keep the stored
    /// ones. Returns the number of rows affected (0 if not found).
    pub async fn update_repair(
        &self,
        id: &str,
        diagnosis: Option<&str>,
        repair_notes: Option<&str>,
        test_results: Option<&str>,
        voltage_after_repair: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("update_battery_repair");
        let result = sqlx::query(
            r#"
            UPDATE batteries
            SET diagnosis = COALESCE($2, diagnosis),
                repair_notes = COALESCE($3, repair_notes),
                test_results = COALESCE($4, test_results),
                voltage_after_repair = COALESCE($5, voltage_after_repair),
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(diagnosis)
        .bind(repair_notes)
        .bind(test_results)
        .bind(voltage_after_repair)
        .bind(now)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}

async fn insert_history_entry(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    battery_id: &str,
    entry: &StatusEntry,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO battery_status_history (
            battery_id, status, recorded_at, updated_by, updated_by_name,
            notes, location
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(battery_id)
    .bind(BatteryStatusDb::from(entry.status))
    .bind(entry.timestamp)
    .bind(entry.updated_by)
    .bind(&entry.updated_by_name)
    .bind(&entry.notes)
    .bind(&entry.location)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
