//! Battery repair record domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Repair workflow status of a battery record.
///
/// `Delivered` and `Cancelled` are terminal. The reachable successors of
/// every status are defined by [`crate::services::lifecycle::allowed_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryStatus {
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

impl BatteryStatus {
    /// All statuses, in workflow order. Useful for exhaustive table checks.
    pub const ALL: [BatteryStatus; 10] = [
        BatteryStatus::Inward,
        BatteryStatus::Assigned,
        BatteryStatus::InProgress,
        BatteryStatus::Completed,
        BatteryStatus::QualityCheck,
        BatteryStatus::ReadyForDelivery,
        BatteryStatus::Delivered,
        BatteryStatus::Cancelled,
        BatteryStatus::OnHold,
        BatteryStatus::RequiresApproval,
    ];

    /// Wire/storage form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            BatteryStatus::Inward => "inward",
            BatteryStatus::Assigned => "assigned",
            BatteryStatus::InProgress => "in_progress",
            BatteryStatus::Completed => "completed",
            BatteryStatus::QualityCheck => "quality_check",
            BatteryStatus::ReadyForDelivery => "ready_for_delivery",
            BatteryStatus::Delivered => "delivered",
            BatteryStatus::Cancelled => "cancelled",
            BatteryStatus::OnHold => "on_hold",
            BatteryStatus::RequiresApproval => "requires_approval",
        }
    }

    /// Human-readable label for receipts and logs.
    pub fn display_name(&self) -> &'static str {
        match self {
            BatteryStatus::Inward => "Inward",
            BatteryStatus::Assigned => "Assigned",
            BatteryStatus::InProgress => "In Progress",
            BatteryStatus::Completed => "Completed",
            BatteryStatus::QualityCheck => "Quality Check",
            BatteryStatus::ReadyForDelivery => "Ready for Delivery",
            BatteryStatus::Delivered => "Delivered",
            BatteryStatus::Cancelled => "Cancelled",
            BatteryStatus::OnHold => "On Hold",
            BatteryStatus::RequiresApproval => "Requires Approval",
        }
    }

    /// True for statuses with no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatteryStatus::Delivered | BatteryStatus::Cancelled)
    }
}

impl std::fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BatteryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inward" => Ok(BatteryStatus::Inward),
            "assigned" => Ok(BatteryStatus::Assigned),
            "in_progress" => Ok(BatteryStatus::InProgress),
            "completed" => Ok(BatteryStatus::Completed),
            "quality_check" => Ok(BatteryStatus::QualityCheck),
            "ready_for_delivery" => Ok(BatteryStatus::ReadyForDelivery),
            "delivered" => Ok(BatteryStatus::Delivered),
            "cancelled" => Ok(BatteryStatus::Cancelled),
            "on_hold" => Ok(BatteryStatus::OnHold),
            "requires_approval" => Ok(BatteryStatus::RequiresApproval),
            other => Err(format!("Unknown battery status: {}", other)),
        }
    }
}

/// One audit-trail entry. Created once per accepted transition, immutable
/// thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub status: BatteryStatus,
    pub timestamp: DateTime<Utc>,
    pub updated_by: Uuid,
    pub updated_by_name: String,
    pub notes: Option<String>,
    pub location: Option<String>,
}

/// Physical and intake details of a battery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryDetails {
    pub battery_type: String,
    pub brand: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub voltage_at_arrival: Option<f64>,
    pub voltage_after_repair: Option<f64>,
    pub capacity: Option<String>,
    pub complaint: String,
    pub physical_condition: Option<String>,
}

/// A battery repair record.
///
/// The record is owned by the persistence layer. The lifecycle engine works
/// on a snapshot and returns a new value; `status_history` is append-only and
/// its latest entry always matches `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryRecord {
    /// Generated battery identifier, e.g. `BAT17000000000001234`.
    pub id: String,
    /// Printed QR payload bound to this record at intake.
    pub qr_payload: String,
    pub customer_id: Uuid,
    pub details: BatteryDetails,
    pub diagnosis: Option<String>,
    pub repair_notes: Option<String>,
    pub test_results: Option<String>,
    pub status: BatteryStatus,
    pub status_history: Vec<StatusEntry>,
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

impl BatteryRecord {
    /// The most recent audit entry, if any.
    pub fn latest_entry(&self) -> Option<&StatusEntry> {
        self.status_history.last()
    }
}

/// Request payload for battery intake.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IntakeBatteryRequest {
    pub customer_id: Uuid,

    #[validate(length(min = 1, max = 50, message = "Battery type is required"))]
    pub battery_type: String,

    #[validate(length(min = 1, max = 50, message = "Brand is required"))]
    pub brand: String,

    #[validate(length(max = 50, message = "Model must be at most 50 characters"))]
    pub model: Option<String>,

    #[validate(length(max = 64, message = "Serial number must be at most 64 characters"))]
    #[validate(custom(function = "shared::validation::validate_qr_field"))]
    pub serial_number: Option<String>,

    #[validate(custom(function = "shared::validation::validate_voltage"))]
    pub voltage_at_arrival: Option<f64>,

    #[validate(length(max = 32, message = "Capacity must be at most 32 characters"))]
    pub capacity: Option<String>,

    #[validate(length(min = 1, max = 500, message = "Complaint is required"))]
    pub complaint: String,

    #[validate(length(max = 500, message = "Condition must be at most 500 characters"))]
    pub physical_condition: Option<String>,

    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub intake_note: Option<String>,

    #[validate(length(max = 100, message = "Location must be at most 100 characters"))]
    pub location: Option<String>,
}

/// Request payload for a status transition.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    pub target_status: BatteryStatus,

    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,

    #[validate(length(max = 100, message = "Location must be at most 100 characters"))]
    pub location: Option<String>,
}

/// Request payload for technician assignment.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignTechnicianRequest {
    pub technician_id: Uuid,

    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

/// Request payload for a QR scan lookup.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[validate(length(min = 1, max = 512, message = "Payload is required"))]
    pub payload: String,
}

/// Request payload for updating repair fields on a record.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRepairRequest {
    #[validate(length(max = 1000, message = "Diagnosis must be at most 1000 characters"))]
    pub diagnosis: Option<String>,

    #[validate(length(max = 1000, message = "Repair notes must be at most 1000 characters"))]
    pub repair_notes: Option<String>,

    #[validate(length(max = 1000, message = "Test results must be at most 1000 characters"))]
    pub test_results: Option<String>,

    #[validate(custom(function = "shared::validation::validate_voltage"))]
    pub voltage_after_repair: Option<f64>,
}
