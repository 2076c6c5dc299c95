//! Battery entity (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::battery::{BatteryDetails, BatteryRecord, BatteryStatus, StatusEntry};

/// Database enum for battery lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "battery_status", rename_all = "snake_case")]
pub enum BatteryStatusDb {
    Inward,
    Assigned,
    InProgress,
    Completed,
    QualityCheck,
    ReadyForDelivery,
    Delivered,
    Cancelled,
    OnHold,
    RequiresApproval,
}

impl From<BatteryStatus> for BatteryStatusDb {
    fn from(status: BatteryStatus) -> Self {
        match status {
            BatteryStatus::Inward => BatteryStatusDb::Inward,
            BatteryStatus::Assigned => BatteryStatusDb::Assigned,
            BatteryStatus::InProgress => BatteryStatusDb::InProgress,
            BatteryStatus::Completed => BatteryStatusDb::Completed,
            BatteryStatus::QualityCheck => BatteryStatusDb::QualityCheck,
            BatteryStatus::ReadyForDelivery => BatteryStatusDb::ReadyForDelivery,
            BatteryStatus::Delivered => BatteryStatusDb::Delivered,
            BatteryStatus::Cancelled => BatteryStatusDb::Cancelled,
            BatteryStatus::OnHold => BatteryStatusDb::OnHold,
            BatteryStatus::RequiresApproval => BatteryStatusDb::RequiresApproval,
        }
    }
}

impl From<BatteryStatusDb> for BatteryStatus {
    fn from(status: BatteryStatusDb) -> Self {
        match status {
            BatteryStatusDb::Inward => BatteryStatus::Inward,
            BatteryStatusDb::Assigned => BatteryStatus::Assigned,
            BatteryStatusDb::InProgress => BatteryStatus::InProgress,
            BatteryStatusDb::Completed => BatteryStatus::Completed,
            BatteryStatusDb::QualityCheck => BatteryStatus::QualityCheck,
            BatteryStatusDb::ReadyForDelivery => BatteryStatus::ReadyForDelivery,
            BatteryStatusDb::Delivered => BatteryStatus::Delivered,
            BatteryStatusDb::Cancelled => BatteryStatus::Cancelled,
            BatteryStatusDb::OnHold => BatteryStatus::OnHold,
            BatteryStatusDb::RequiresApproval => BatteryStatus::RequiresApproval,
        }
    }
}

/// Database row mapping for the batteries table, joined with the assigned
/// technician's name.
#[derive(Debug, Clone, FromRow)]
pub struct BatteryEntity {
    pub id: String,
    pub qr_payload: String,
    pub customer_id: Uuid,
    pub battery_type: String,
    pub brand: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub voltage_at_arrival: Option<f64>,
    pub voltage_after_repair: Option<f64>,
    pub capacity: Option<String>,
    pub complaint: String,
    pub physical_condition: Option<String>,
    pub diagnosis: Option<String>,
    pub repair_notes: Option<String>,
    pub test_results: Option<String>,
    pub status: BatteryStatusDb,
    pub assigned_technician_id: Option<Uuid>,
    pub assigned_technician_name: Option<String>,
    pub created_by: Uuid,
    pub invoice_id: Option<Uuid>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub delivered_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BatteryEntity {
    /// Assembles the domain record from this row plus its history rows,
    /// which must already be in chronological order.
    pub fn into_record(self, history: Vec<StatusHistoryEntity>) -> BatteryRecord {
        BatteryRecord {
            id: self.id,
            qr_payload: self.qr_payload,
            customer_id: self.customer_id,
            details: BatteryDetails {
                battery_type: self.battery_type,
                brand: self.brand,
                model: self.model,
                serial_number: self.serial_number,
                voltage_at_arrival: self.voltage_at_arrival,
                voltage_after_repair: self.voltage_after_repair,
                capacity: self.capacity,
                complaint: self.complaint,
                physical_condition: self.physical_condition,
            },
            diagnosis: self.diagnosis,
            repair_notes: self.repair_notes,
            test_results: self.test_results,
            status: self.status.into(),
            status_history: history.into_iter().map(StatusEntry::from).collect(),
            assigned_technician_id: self.assigned_technician_id,
            assigned_technician_name: self.assigned_technician_name,
            created_by: self.created_by,
            invoice_id: self.invoice_id,
            is_delivered: self.is_delivered,
            delivered_at: self.delivered_at,
            delivered_by: self.delivered_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Database row mapping for the battery_status_history table.
///
/// `updated_by_name` is a snapshot of the actor's name at transition time,
/// so renaming a user later does not rewrite the audit trail.
#[derive(Debug, Clone, FromRow)]
pub struct StatusHistoryEntity {
    pub id: i64,
    pub battery_id: String,
    pub status: BatteryStatusDb,
    pub recorded_at: DateTime<Utc>,
    pub updated_by: Uuid,
    pub updated_by_name: String,
    pub notes: Option<String>,
    pub location: Option<String>,
}

impl From<StatusHistoryEntity> for StatusEntry {
    fn from(entity: StatusHistoryEntity) -> Self {
        Self {
            status: entity.status.into(),
            timestamp: entity.recorded_at,
            updated_by: entity.updated_by,
            updated_by_name: entity.updated_by_name,
            notes: entity.notes,
            location: entity.location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_battery_entity() -> BatteryEntity {
        BatteryEntity {
            id: "BAT1700000000001234".to_string(),
            qr_payload: "BAT1700000000001234|CUST001|1700000000000|7026FDF8".to_string(),
            customer_id: Uuid::new_v4(),
            battery_type: "Lead Acid".to_string(),
            brand: "Exide".to_string(),
            model: Some("Invamore 1500".to_string()),
            serial_number: Some("EX-2024-9921".to_string()),
            voltage_at_arrival: Some(10.4),
            voltage_after_repair: None,
            capacity: Some("150Ah".to_string()),
            complaint: "Not holding charge".to_string(),
            physical_condition: None,
            diagnosis: None,
            repair_notes: None,
            test_results: None,
            status: BatteryStatusDb::Inward,
            assigned_technician_id: None,
            assigned_technician_name: None,
            created_by: Uuid::new_v4(),
            invoice_id: None,
            is_delivered: false,
            delivered_at: None,
            delivered_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn create_test_history_entity(battery_id: &str, status: BatteryStatusDb) -> StatusHistoryEntity {
        StatusHistoryEntity {
            id: 1,
            battery_id: battery_id.to_string(),
            status,
            recorded_at: Utc::now(),
            updated_by: Uuid::new_v4(),
            updated_by_name: "Asha Verma".to_string(),
            notes: Some("Battery received".to_string()),
            location: None,
        }
    }

    #[test]
    fn test_status_db_round_trip() {
        for status in BatteryStatus::ALL {
            let db: BatteryStatusDb = status.into();
            let back: BatteryStatus = db.into();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_into_record_folds_history() {
        let entity = create_test_battery_entity();
        let history = vec![create_test_history_entity(&entity.id, BatteryStatusDb::Inward)];

        let record = entity.clone().into_record(history);
        assert_eq!(record.id, entity.id);
        assert_eq!(record.status, BatteryStatus::Inward);
        assert_eq!(record.details.brand, "Exide");
        assert_eq!(record.details.voltage_at_arrival, Some(10.4));
        assert_eq!(record.status_history.len(), 1);
        assert_eq!(record.status_history[0].notes.as_deref(), Some("Battery received"));
    }

    #[test]
    fn test_history_entity_to_entry_keeps_snapshot_name() {
        let entity = create_test_history_entity("BAT1", BatteryStatusDb::Assigned);
        let entry: StatusEntry = entity.clone().into();
        assert_eq!(entry.status, BatteryStatus::Assigned);
        assert_eq!(entry.updated_by_name, entity.updated_by_name);
        assert_eq!(entry.timestamp, entity.recorded_at);
    }

    #[test]
    fn test_into_record_with_empty_history() {
        let entity = create_test_battery_entity();
        let record = entity.into_record(Vec::new());
        assert!(record.status_history.is_empty());
        assert!(record.latest_entry().is_none());
    }
}
