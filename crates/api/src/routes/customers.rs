//! Customer management endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use domain::models::customer::{CreateCustomerRequest, UpdateCustomerRequest};
use domain::models::permission::has_permission;
use domain::models::Customer;
use persistence::repositories::{CustomerChanges, CustomerRepository, NewCustomer};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Query parameters for listing customers.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCustomersQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListCustomersQuery {
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
pub struct CustomerListResponse {
    pub customers: Vec<Customer>,
    pub pagination: ListPagination,
}

/// Create a customer.
///
/// POST /api/v1/customers
pub async fn create_customer(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    request.validate()?;

    if !has_permission(auth.user.role, "customer:manage") {
        return Err(ApiError::Forbidden(
            "Only admin or staff can manage customers".to_string(),
        ));
    }

    let repo = CustomerRepository::new(state.pool.clone());
    let entity = repo
        .create(NewCustomer {
            name: request.name.clone(),
            phone: request.phone.clone(),
            email: request.email.clone(),
            address: request.address.clone(),
            city: request.city.clone(),
            gst_number: request.gst_number.clone(),
            customer_type: request.customer_type.into(),
            notes: request.notes.clone(),
            created_by: auth.user.id,
        })
        .await?;

    let customer: Customer = entity.into();

    info!(customer_id = %customer.id, "Customer created");

    Ok((StatusCode::CREATED, Json(customer)))
}

/// Fetch a single customer.
///
/// GET /api/v1/customers/:id
pub async fn get_customer(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, ApiError> {
    if !has_permission(auth.user.role, "customer:view") {
        return Err(ApiError::Forbidden(
            "Role may not view customers".to_string(),
        ));
    }

    let repo = CustomerRepository::new(state.pool.clone());
    let entity = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".to_string()))?;

    Ok(Json(entity.into()))
}

/// List active customers, newest first, with optional name/phone search.
///
/// GET /api/v1/customers
pub async fn list_customers(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListCustomersQuery>,
) -> Result<Json<CustomerListResponse>, ApiError> {
    if !has_permission(auth.user.role, "customer:view") {
        return Err(ApiError::Forbidden(
            "Role may not view customers".to_string(),
        ));
    }

    let page = query.page();
    let per_page = query.per_page();
    let offset = (page - 1) * per_page;
    let search = query.search.as_deref();

    let repo = CustomerRepository::new(state.pool.clone());
    let total = repo.count(search).await?;
    let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

    let entities = repo.list(search, per_page, offset).await?;
    let customers: Vec<Customer> = entities.into_iter().map(Into::into).collect();

    Ok(Json(CustomerListResponse {
        customers,
        pagination: ListPagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// Partially update a customer. Absent fields keep their stored values.
///
/// PUT /api/v1/customers/:id
pub async fn update_customer(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>, ApiError> {
    request.validate()?;

    if !has_permission(auth.user.role, "customer:manage") {
        return Err(ApiError::Forbidden(
            "Only admin or staff can manage customers".to_string(),
        ));
    }

    let repo = CustomerRepository::new(state.pool.clone());
    let entity = repo
        .update(
            id,
            CustomerChanges {
                name: request.name.clone(),
                phone: request.phone.clone(),
                email: request.email.clone(),
                address: request.address.clone(),
                city: request.city.clone(),
                gst_number: request.gst_number.clone(),
                customer_type: request.customer_type.map(Into::into),
                notes: request.notes.clone(),
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".to_string()))?;

    info!(customer_id = %id, "Customer updated");

    Ok(Json(entity.into()))
}

/// Soft-delete a customer. The row is kept for battery and invoice history.
///
/// DELETE /api/v1/customers/:id
pub async fn deactivate_customer(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !has_permission(auth.user.role, "customer:manage") {
        return Err(ApiError::Forbidden(
            "Only admin or staff can manage customers".to_string(),
        ));
    }

    let repo = CustomerRepository::new(state.pool.clone());
    let rows = repo.deactivate(id).await?;
    if rows == 0 {
        return Err(ApiError::NotFound("Customer not found".to_string()));
    }

    info!(customer_id = %id, "Customer deactivated");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::CustomerType;

    #[test]
    fn test_create_request_deserialization() {
        let json = r#"{
            "name": "Mahesh Traders",
            "phone": "9876543210",
            "email": "accounts@maheshtraders.in",
            "city": "Pune",
            "gstNumber": "27AAPFU0939F1ZV",
            "customerType": "business"
        }"#;
        let request: CreateCustomerRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.name, "Mahesh Traders");
        assert_eq!(request.customer_type, CustomerType::Business);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_update_request_all_optional() {
        let request: UpdateCustomerRequest = serde_json::from_str("{}").unwrap();
        assert!(request.name.is_none());
        assert!(request.phone.is_none());
        assert!(request.customer_type.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_list_query_defaults() {
        let query = ListCustomersQuery {
            search: None,
            page: None,
            per_page: None,
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 50);
    }

    #[test]
    fn test_list_query_clamps() {
        let query = ListCustomersQuery {
            search: None,
            page: Some(0),
            per_page: Some(5000),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 100);
    }

    #[test]
    fn test_list_response_serialization() {
        let response = CustomerListResponse {
            customers: Vec::new(),
            pagination: ListPagination {
                page: 1,
                per_page: 50,
                total: 0,
                total_pages: 0,
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"customers\":[]"));
        assert!(json.contains("\"perPage\":50"));
        assert!(json.contains("\"totalPages\":0"));
    }
}
