//! Permission catalog endpoint handlers.
//!
//! Read-only capability hints for the UI. Every endpoint still enforces its
//! own gate; nothing here grants access by itself.

use axum::Json;
use serde::Serialize;

use domain::models::permission::{get_permissions_by_category, role_permissions};
use domain::models::{Permission, PermissionCategory, StaffRole};

use crate::extractors::UserAuth;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    pub category: PermissionCategory,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsResponse {
    pub role: StaffRole,
    pub permissions: Vec<Permission>,
    pub catalog: Vec<CategoryGroup>,
}

/// Return the caller's granted permissions and the full catalog grouped by
/// category.
///
/// GET /api/v1/permissions
pub async fn get_permissions(auth: UserAuth) -> Json<PermissionsResponse> {
    let catalog = [
        PermissionCategory::Batteries,
        PermissionCategory::Customers,
        PermissionCategory::Invoices,
        PermissionCategory::Users,
        PermissionCategory::Settings,
        PermissionCategory::Reports,
    ]
    .into_iter()
    .map(|category| CategoryGroup {
        category,
        permissions: get_permissions_by_category(category),
    })
    .collect();

    Json(PermissionsResponse {
        role: auth.user.role,
        permissions: role_permissions(auth.user.role),
        catalog,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::permission::get_all_permissions;

    #[test]
    fn test_response_serialization() {
        let response = PermissionsResponse {
            role: StaffRole::Staff,
            permissions: role_permissions(StaffRole::Staff),
            catalog: Vec::new(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"role\":\"staff\""));
        assert!(json.contains("battery:intake"));
        assert!(!json.contains("user:manage"));
    }

    #[test]
    fn test_catalog_groups_cover_every_permission() {
        let groups: Vec<CategoryGroup> = [
            PermissionCategory::Batteries,
            PermissionCategory::Customers,
            PermissionCategory::Invoices,
            PermissionCategory::Users,
            PermissionCategory::Settings,
            PermissionCategory::Reports,
        ]
        .into_iter()
        .map(|category| CategoryGroup {
            category,
            permissions: get_permissions_by_category(category),
        })
        .collect();

        let grouped: usize = groups.iter().map(|g| g.permissions.len()).sum();
        assert_eq!(grouped, get_all_permissions().len());
    }
}
