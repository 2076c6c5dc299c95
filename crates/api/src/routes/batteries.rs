//! Battery intake, workflow and QR endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use domain::models::battery::{
    AssignTechnicianRequest, BatteryDetails, IntakeBatteryRequest, ScanRequest, TransitionRequest,
    UpdateRepairRequest,
};
use domain::models::permission::has_permission;
use domain::models::{BatteryRecord, BatteryStatus, StaffRole, StatusEntry, User};
use domain::services::{
    attempt_transition, decode_binding, encode_binding, new_battery_id_now, QrBinding,
};
use persistence::entities::BatteryStatusDb;
use persistence::repositories::{
    BatteryListFilter, BatteryRepository, CustomerRepository, UserRepository,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::{
    record_battery_registered, record_scan_validated, record_transition_applied,
};

/// Query parameters for listing batteries.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBatteriesQuery {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

impl ListBatteriesQuery {
    /// Requested page size clamped to 1..=100, default 50.
    fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 100)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryListResponse {
    pub batteries: Vec<BatteryRecord>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryHistoryResponse {
    pub battery_id: String,
    pub history: Vec<StatusEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayloadResponse {
    pub battery_id: String,
    pub qr_payload: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub binding: QrBinding,
    pub record: Option<BatteryRecord>,
}

/// Register a battery brought in for repair.
///
/// POST /api/v1/batteries
pub async fn intake_battery(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<IntakeBatteryRequest>,
) -> Result<(StatusCode, Json<BatteryRecord>), ApiError> {
    request.validate()?;

    if !has_permission(auth.user.role, "battery:intake") {
        return Err(ApiError::Forbidden(
            "Only admin or staff can intake batteries".to_string(),
        ));
    }

    // The customer printed on the QR label must be real and active
    let customer_repo = CustomerRepository::new(state.pool.clone());
    let customer = customer_repo
        .find_by_id(request.customer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".to_string()))?;
    if !customer.is_active {
        return Err(ApiError::Conflict("Customer is inactive".to_string()));
    }

    let now = Utc::now();
    let id = new_battery_id_now();
    let qr_payload = encode_binding(&id, &request.customer_id.to_string(), now.timestamp_millis());

    let entry = StatusEntry {
        status: BatteryStatus::Inward,
        timestamp: now,
        updated_by: auth.user.id,
        updated_by_name: auth.user.full_name.clone(),
        notes: request
            .intake_note
            .clone()
            .or_else(|| Some("Battery received".to_string())),
        location: request.location.clone(),
    };

    let record = BatteryRecord {
        id: id.clone(),
        qr_payload,
        customer_id: request.customer_id,
        details: BatteryDetails {
            battery_type: request.battery_type.clone(),
            brand: request.brand.clone(),
            model: request.model.clone(),
            serial_number: request.serial_number.clone(),
            voltage_at_arrival: request.voltage_at_arrival,
            voltage_after_repair: None,
            capacity: request.capacity.clone(),
            complaint: request.complaint.clone(),
            physical_condition: request.physical_condition.clone(),
        },
        diagnosis: None,
        repair_notes: None,
        test_results: None,
        status: BatteryStatus::Inward,
        status_history: vec![entry],
        assigned_technician_id: None,
        assigned_technician_name: None,
        created_by: auth.user.id,
        invoice_id: None,
        is_delivered: false,
        delivered_at: None,
        delivered_by: None,
        created_at: now,
        updated_at: now,
    };

    let repo = BatteryRepository::new(state.pool.clone());
    repo.create(&record).await?;
    record_battery_registered();

    info!(
        battery_id = %record.id,
        customer_id = %record.customer_id,
        "Battery intake recorded"
    );

    Ok((StatusCode::CREATED, Json(record)))
}

/// Fetch a single battery record with its history.
///
/// GET /api/v1/batteries/:id
pub async fn get_battery(
    State(state): State<AppState>,
    _auth: UserAuth,
    Path(id): Path<String>,
) -> Result<Json<BatteryRecord>, ApiError> {
    let repo = BatteryRepository::new(state.pool.clone());
    let record = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Battery not found".to_string()))?;
    Ok(Json(record))
}

/// List battery records with cursor-based pagination, newest first.
///
/// GET /api/v1/batteries
pub async fn list_batteries(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListBatteriesQuery>,
) -> Result<Json<BatteryListResponse>, ApiError> {
    let status = match &query.status {
        Some(s) => Some(
            s.parse::<BatteryStatus>()
                .map_err(|_| ApiError::Validation(format!("Invalid status: {}", s)))?,
        ),
        None => None,
    };

    let cursor = match &query.cursor {
        Some(cursor) => Some(
            shared::pagination::decode_cursor(cursor)
                .map_err(|_| ApiError::Validation("Invalid cursor format".to_string()))?,
        ),
        None => None,
    };

    // Technicians only see their own queue
    let technician_id = if auth.user.role == StaffRole::Technician {
        Some(auth.user.id)
    } else {
        query.technician_id
    };

    // Fetch one row past the page to learn whether more exist
    let limit = query.effective_limit();
    let filter = BatteryListFilter {
        status: status.map(BatteryStatusDb::from),
        customer_id: query.customer_id,
        technician_id,
        cursor,
        limit: limit + 1,
    };

    let repo = BatteryRepository::new(state.pool.clone());
    let mut batteries = repo.list(&filter).await?;

    let has_more = batteries.len() as i64 > limit;
    if has_more {
        batteries.truncate(limit as usize);
    }
    let next_cursor = if has_more {
        batteries
            .last()
            .map(|record| shared::pagination::encode_cursor(record.created_at, &record.id))
    } else {
        None
    };

    Ok(Json(BatteryListResponse {
        batteries,
        pagination: PaginationInfo {
            next_cursor,
            has_more,
        },
    }))
}

/// Move a battery to a new status through the lifecycle engine.
///
/// POST /api/v1/batteries/:id/transitions
pub async fn transition_battery(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<String>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<BatteryRecord>, ApiError> {
    request.validate()?;
    let target = request.target_status;

    let repo = BatteryRepository::new(state.pool.clone());
    let record = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Battery not found".to_string()))?;

    let now = Utc::now();
    let mut updated = attempt_transition(
        &record,
        target,
        &auth.user,
        request.note,
        request.location,
        now,
    )?;

    // Delivery is recorded on the row itself, not only in the history
    if target == BatteryStatus::Delivered {
        updated.is_delivered = true;
        updated.delivered_at = Some(now);
        updated.delivered_by = Some(auth.user.id);
    }

    let entry = updated
        .latest_entry()
        .cloned()
        .ok_or_else(|| ApiError::Internal("Transition produced no history entry".to_string()))?;

    let applied = repo
        .apply_transition(&updated, &entry, record.updated_at)
        .await?;
    if !applied {
        return Err(ApiError::Conflict(
            "Battery record was modified concurrently".to_string(),
        ));
    }
    record_transition_applied(updated.status.as_str());

    info!(
        battery_id = %updated.id,
        from = %record.status,
        to = %updated.status,
        "Battery status updated"
    );

    Ok(Json(updated))
}

/// Assign a technician and move the battery into the assigned status.
///
/// POST /api/v1/batteries/:id/assignment
pub async fn assign_technician(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<String>,
    Json(request): Json<AssignTechnicianRequest>,
) -> Result<Json<BatteryRecord>, ApiError> {
    request.validate()?;

    if !has_permission(auth.user.role, "battery:assign") {
        return Err(ApiError::Forbidden(
            "Only admin or staff can assign technicians".to_string(),
        ));
    }

    let repo = BatteryRepository::new(state.pool.clone());
    let record = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Battery not found".to_string()))?;

    let user_repo = UserRepository::new(state.pool.clone());
    let technician: User = user_repo
        .find_by_id(request.technician_id)
        .await?
        .map(User::from)
        .ok_or_else(|| ApiError::NotFound("Technician not found".to_string()))?;
    if technician.role != StaffRole::Technician {
        return Err(ApiError::Validation("User is not a technician".to_string()));
    }
    if !technician.is_active {
        return Err(ApiError::Conflict(
            "Technician account is disabled".to_string(),
        ));
    }

    // Assignment rides on the regular lifecycle edge, it is not a bypass
    let now = Utc::now();
    let note = request
        .note
        .clone()
        .or_else(|| Some(format!("Assigned to {}", technician.full_name)));
    let mut updated = attempt_transition(
        &record,
        BatteryStatus::Assigned,
        &auth.user,
        note,
        None,
        now,
    )?;
    updated.assigned_technician_id = Some(technician.id);
    updated.assigned_technician_name = Some(technician.full_name.clone());

    let entry = updated
        .latest_entry()
        .cloned()
        .ok_or_else(|| ApiError::Internal("Transition produced no history entry".to_string()))?;

    let applied = repo
        .apply_transition(&updated, &entry, record.updated_at)
        .await?;
    if !applied {
        return Err(ApiError::Conflict(
            "Battery record was modified concurrently".to_string(),
        ));
    }
    record_transition_applied(updated.status.as_str());

    info!(
        battery_id = %updated.id,
        technician_id = %technician.id,
        "Technician assigned"
    );

    Ok(Json(updated))
}

/// Update diagnosis, repair notes, test results or post-repair voltage.
/// Absent fields keep their stored values.
///
/// PUT /api/v1/batteries/:id/repair
pub async fn update_repair(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<String>,
    Json(request): Json<UpdateRepairRequest>,
) -> Result<Json<BatteryRecord>, ApiError> {
    request.validate()?;

    if !has_permission(auth.user.role, "battery:update_repair") {
        return Err(ApiError::Forbidden(
            "Role may not update repair details".to_string(),
        ));
    }

    let repo = BatteryRepository::new(state.pool.clone());
    let record = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Battery not found".to_string()))?;

    if auth.user.role == StaffRole::Technician
        && record.assigned_technician_id != Some(auth.user.id)
    {
        return Err(ApiError::Forbidden(
            "Battery is not assigned to you".to_string(),
        ));
    }

    let rows = repo
        .update_repair(
            &id,
            request.diagnosis.as_deref(),
            request.repair_notes.as_deref(),
            request.test_results.as_deref(),
            request.voltage_after_repair,
            Utc::now(),
        )
        .await?;
    if rows == 0 {
        return Err(ApiError::NotFound("Battery not found".to_string()));
    }

    let refreshed = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Battery not found".to_string()))?;

    info!(battery_id = %id, "Repair details updated");

    Ok(Json(refreshed))
}

/// Retrieve the ordered status history of a battery.
///
/// GET /api/v1/batteries/:id/history
pub async fn get_battery_history(
    State(state): State<AppState>,
    _auth: UserAuth,
    Path(id): Path<String>,
) -> Result<Json<BatteryHistoryResponse>, ApiError> {
    let repo = BatteryRepository::new(state.pool.clone());
    let record = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Battery not found".to_string()))?;

    Ok(Json(BatteryHistoryResponse {
        battery_id: record.id,
        history: record.status_history,
    }))
}

/// Return the stored QR payload text for label printing.
///
/// GET /api/v1/batteries/:id/qr
pub async fn get_battery_qr(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<String>,
) -> Result<Json<QrPayloadResponse>, ApiError> {
    if !has_permission(auth.user.role, "battery:qr") {
        return Err(ApiError::Forbidden(
            "Only admin or staff can print QR labels".to_string(),
        ));
    }

    let repo = BatteryRepository::new(state.pool.clone());
    let record = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Battery not found".to_string()))?;

    Ok(Json(QrPayloadResponse {
        battery_id: record.id,
        qr_payload: record.qr_payload,
    }))
}

/// Decode a scanned QR payload and resolve the referenced battery.
///
/// POST /api/v1/batteries/scan
pub async fn scan_battery(
    State(state): State<AppState>,
    _auth: UserAuth,
    Json(request): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, ApiError> {
    request.validate()?;

    let binding = decode_binding(&request.payload)?;
    record_scan_validated(binding.is_valid);

    // A failed checksum still decodes; surface the binding so the client
    // can show what was scanned, but do not resolve the record
    if !binding.is_valid {
        tracing::warn!(
            battery_id = %binding.battery_id,
            "Scanned payload failed checksum validation"
        );
        return Ok(Json(ScanResponse {
            binding,
            record: None,
        }));
    }

    let repo = BatteryRepository::new(state.pool.clone());
    let record = repo
        .find_by_id(&binding.battery_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No battery found for scanned code".to_string()))?;

    info!(battery_id = %binding.battery_id, "Scan resolved");

    Ok(Json(ScanResponse {
        binding,
        record: Some(record),
    }))
}
