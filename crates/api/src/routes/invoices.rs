//! Invoice endpoint handlers.
//!
//! All amounts are integer paise. Totals are recomputed server-side from the
//! submitted line items; client-sent totals are never trusted.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use domain::models::invoice::{
    build_items, parts_total, total_amount, CreateInvoiceRequest, RecordPaymentRequest,
};
use domain::models::permission::has_permission;
use domain::models::{Invoice, PaymentStatus};
use persistence::entities::{PaymentMethodDb, PaymentStatusDb};
use persistence::repositories::{BatteryRepository, InvoiceRepository, NewInvoice};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Query parameters for listing invoices.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInvoicesQuery {
    pub payment_status: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListInvoicesQuery {
    fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(50).clamp(1, 100)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListResponse {
    pub invoices: Vec<Invoice>,
    pub pagination: ListPagination,
}

/// Create an invoice for a battery.
///
/// POST /api/v1/invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    request.validate()?;

    if !has_permission(auth.user.role, "invoice:create") {
        return Err(ApiError::Forbidden(
            "Only admin or staff can create invoices".to_string(),
        ));
    }

    let battery_repo = BatteryRepository::new(state.pool.clone());
    let battery = battery_repo
        .find_by_id(&request.battery_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Battery not found".to_string()))?;
    if battery.invoice_id.is_some() {
        return Err(ApiError::Conflict(
            "Battery is already invoiced".to_string(),
        ));
    }

    let items = build_items(&request.items);
    let parts = parts_total(&items);
    let total = total_amount(&items, request.service_charges, request.discount);

    let repo = InvoiceRepository::new(state.pool.clone());
    let invoice = repo
        .create(NewInvoice {
            battery_id: battery.id.clone(),
            customer_id: battery.customer_id,
            items,
            service_charges: request.service_charges,
            parts_total: parts,
            discount: request.discount,
            total_amount: total,
            notes: request.notes.clone(),
            created_by: auth.user.id,
        })
        .await?
        // The stamp inside the transaction lost a race with another invoice
        .ok_or_else(|| ApiError::Conflict("Battery is already invoiced".to_string()))?;

    info!(
        invoice_id = %invoice.id,
        invoice_number = %invoice.invoice_number,
        battery_id = %invoice.battery_id,
        total_amount = invoice.total_amount,
        "Invoice created"
    );

    Ok((StatusCode::CREATED, Json(invoice)))
}

/// Fetch a single invoice with its line items.
///
/// GET /api/v1/invoices/:id
pub async fn get_invoice(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, ApiError> {
    if !has_permission(auth.user.role, "invoice:view") {
        return Err(ApiError::Forbidden("Role may not view invoices".to_string()));
    }

    let repo = InvoiceRepository::new(state.pool.clone());
    let invoice = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?;

    Ok(Json(invoice))
}

/// List invoices, newest first, optionally filtered by settlement state.
///
/// GET /api/v1/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<Json<InvoiceListResponse>, ApiError> {
    if !has_permission(auth.user.role, "invoice:view") {
        return Err(ApiError::Forbidden("Role may not view invoices".to_string()));
    }

    let payment_status = match &query.payment_status {
        Some(s) => Some(
            s.parse::<PaymentStatus>()
                .map_err(|_| ApiError::Validation(format!("Invalid payment status: {}", s)))?,
        ),
        None => None,
    };

    let page = query.page();
    let per_page = query.per_page();
    let offset = (page - 1) * per_page;
    let status_filter = payment_status.map(PaymentStatusDb::from);

    let repo = InvoiceRepository::new(state.pool.clone());
    let total = repo.count(status_filter).await?;
    let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

    let invoices = repo.list(status_filter, per_page, offset).await?;

    Ok(Json(InvoiceListResponse {
        invoices,
        pagination: ListPagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// Record a payment against an invoice.
///
/// POST /api/v1/invoices/:id/payments
pub async fn record_payment(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<Invoice>, ApiError> {
    request.validate()?;

    if !has_permission(auth.user.role, "invoice:record_payment") {
        return Err(ApiError::Forbidden(
            "Only admin or staff can record payments".to_string(),
        ));
    }

    let repo = InvoiceRepository::new(state.pool.clone());
    let invoice = repo
        .record_payment(id, request.amount, PaymentMethodDb::from(request.payment_method))
        .await?
        .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?;

    info!(
        invoice_id = %invoice.id,
        amount = request.amount,
        payment_status = %invoice.payment_status,
        "Payment recorded"
    );

    Ok(Json(invoice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::invoice::InvoiceItemRequest;
    use domain::models::ItemType;

    #[test]
    fn test_create_request_deserialization() {
        let json = r#"{
            "batteryId": "BAT1700000000001234",
            "items": [
                {"itemType": "part", "name": "Cell bank", "quantity": 3, "unitPrice": 45000},
                {"itemType": "labor", "name": "Rebuild", "quantity": 1, "unitPrice": 30000}
            ],
            "serviceCharges": 25000,
            "discount": 5000,
            "notes": "Warranty replacement parts"
        }"#;
        let request: CreateInvoiceRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.battery_id, "BAT1700000000001234");
        assert_eq!(request.items.len(), 2);
        assert_eq!(request.items[0].item_type, ItemType::Part);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_request_charges_default_to_zero() {
        let json = r#"{
            "batteryId": "BAT1700000000001234",
            "items": [{"itemType": "service", "name": "Load test", "quantity": 1, "unitPrice": 15000}]
        }"#;
        let request: CreateInvoiceRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.service_charges, 0);
        assert_eq!(request.discount, 0);
    }

    #[test]
    fn test_totals_for_submitted_items() {
        let requests = vec![
            InvoiceItemRequest {
                item_type: ItemType::Part,
                name: "Cell bank".to_string(),
                quantity: 3,
                unit_price: 45000,
            },
            InvoiceItemRequest {
                item_type: ItemType::Labor,
                name: "Rebuild".to_string(),
                quantity: 1,
                unit_price: 30000,
            },
        ];
        let items = build_items(&requests);
        assert_eq!(parts_total(&items), 135000);
        assert_eq!(total_amount(&items, 25000, 5000), 185000);
    }

    #[test]
    fn test_list_query_rejects_unknown_status() {
        assert!("refunded".parse::<PaymentStatus>().is_err());
        assert_eq!(
            "partially_paid".parse::<PaymentStatus>().unwrap(),
            PaymentStatus::PartiallyPaid
        );
    }

    #[test]
    fn test_list_response_serialization() {
        let response = InvoiceListResponse {
            invoices: Vec::new(),
            pagination: ListPagination {
                page: 2,
                per_page: 25,
                total: 60,
                total_pages: 3,
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"invoices\":[]"));
        assert!(json.contains("\"page\":2"));
        assert!(json.contains("\"totalPages\":3"));
    }
}
