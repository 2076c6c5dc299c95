//! Shop settings endpoint handlers.

use axum::{extract::State, Json};
use tracing::info;
use validator::Validate;

use domain::models::settings::UpdateSettingsRequest;
use domain::models::{ShopSettings, StaffRole};
use persistence::repositories::{SettingsChanges, SettingsRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Fetch the shop settings.
///
/// GET /api/v1/settings
pub async fn get_settings(
    State(state): State<AppState>,
    _auth: UserAuth,
) -> Result<Json<ShopSettings>, ApiError> {
    let repo = SettingsRepository::new(state.pool.clone());
    let entity = repo.get().await?;
    Ok(Json(entity.into()))
}

/// Partially update the shop settings. The invoice counter is not settable.
///
/// PUT /api/v1/settings
pub async fn update_settings(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<ShopSettings>, ApiError> {
    request.validate()?;

    if auth.user.role != StaffRole::Admin {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }

    let repo = SettingsRepository::new(state.pool.clone());
    let entity = repo
        .update(SettingsChanges {
            shop_name: request.shop_name.clone(),
            address: request.address.clone(),
            phone: request.phone.clone(),
            invoice_prefix: request.invoice_prefix.clone(),
        })
        .await?;

    info!("Shop settings updated");

    Ok(Json(entity.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_deserialization() {
        let json = r#"{
            "shopName": "PowerCell Battery Works",
            "phone": "+919876543210",
            "invoicePrefix": "PBW"
        }"#;
        let request: UpdateSettingsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.shop_name.as_deref(), Some("PowerCell Battery Works"));
        assert_eq!(request.invoice_prefix.as_deref(), Some("PBW"));
        assert!(request.address.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_update_request_rejects_empty_shop_name() {
        let request = UpdateSettingsRequest {
            shop_name: Some(String::new()),
            address: None,
            phone: None,
            invoice_prefix: None,
        };
        assert!(request.validate().is_err());
    }
}
