//! Permission catalog.
//!
//! Permissions describe what the UI may offer a signed-in user. They are
//! coarser than the lifecycle role gate, which is still enforced on every
//! transition regardless of what the catalog says.

use serde::{Deserialize, Serialize};

use crate::models::user::StaffRole;

/// Permission category for grouping related permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCategory {
    Batteries,
    Customers,
    Invoices,
    Users,
    Settings,
    Reports,
}

impl std::fmt::Display for PermissionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionCategory::Batteries => write!(f, "batteries"),
            PermissionCategory::Customers => write!(f, "customers"),
            PermissionCategory::Invoices => write!(f, "invoices"),
            PermissionCategory::Users => write!(f, "users"),
            PermissionCategory::Settings => write!(f, "settings"),
            PermissionCategory::Reports => write!(f, "reports"),
        }
    }
}

/// A permission with its identifier (e.g. "battery:intake"), description
/// and grouping category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub name: String,
    pub description: String,
    pub category: PermissionCategory,
}

impl Permission {
    fn new(name: &str, description: &str, category: PermissionCategory) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            category,
        }
    }
}

/// Returns the full permission catalog.
pub fn get_all_permissions() -> Vec<Permission> {
    vec![
        Permission::new(
            "battery:intake",
            "Register incoming batteries",
            PermissionCategory::Batteries,
        ),
        Permission::new(
            "battery:view",
            "View all battery records and their history",
            PermissionCategory::Batteries,
        ),
        Permission::new(
            "battery:view_assigned",
            "View batteries assigned to the signed-in technician",
            PermissionCategory::Batteries,
        ),
        Permission::new(
            "battery:update_status",
            "Move batteries through the repair lifecycle",
            PermissionCategory::Batteries,
        ),
        Permission::new(
            "battery:assign",
            "Assign a technician to a battery",
            PermissionCategory::Batteries,
        ),
        Permission::new(
            "battery:update_repair",
            "Record diagnosis, repair notes and voltage measurements",
            PermissionCategory::Batteries,
        ),
        Permission::new(
            "battery:qr",
            "Generate and scan battery QR labels",
            PermissionCategory::Batteries,
        ),
        Permission::new(
            "customer:view",
            "View customer records",
            PermissionCategory::Customers,
        ),
        Permission::new(
            "customer:manage",
            "Create and update customer records",
            PermissionCategory::Customers,
        ),
        Permission::new(
            "invoice:create",
            "Create invoices for repaired batteries",
            PermissionCategory::Invoices,
        ),
        Permission::new(
            "invoice:view",
            "View invoices",
            PermissionCategory::Invoices,
        ),
        Permission::new(
            "invoice:record_payment",
            "Record payments against invoices",
            PermissionCategory::Invoices,
        ),
        Permission::new(
            "user:manage",
            "Create, update and deactivate staff accounts",
            PermissionCategory::Users,
        ),
        Permission::new(
            "settings:manage",
            "Update shop settings and the invoice prefix",
            PermissionCategory::Settings,
        ),
        Permission::new(
            "report:view",
            "View workload and revenue summaries",
            PermissionCategory::Reports,
        ),
    ]
}

/// Returns the catalog filtered to one category.
pub fn get_permissions_by_category(category: PermissionCategory) -> Vec<Permission> {
    get_all_permissions()
        .into_iter()
        .filter(|permission| permission.category == category)
        .collect()
}

const STAFF_PERMISSIONS: &[&str] = &[
    "battery:intake",
    "battery:view",
    "battery:update_status",
    "battery:assign",
    "battery:qr",
    "customer:view",
    "customer:manage",
    "invoice:create",
    "invoice:view",
    "invoice:record_payment",
    "report:view",
];

const TECHNICIAN_PERMISSIONS: &[&str] = &[
    "battery:view_assigned",
    "battery:update_status",
    "battery:update_repair",
];

/// Returns the permissions granted to a role. Admins hold the full catalog.
pub fn role_permissions(role: StaffRole) -> Vec<Permission> {
    match role {
        StaffRole::Admin => get_all_permissions(),
        StaffRole::Staff => get_all_permissions()
            .into_iter()
            .filter(|permission| STAFF_PERMISSIONS.contains(&permission.name.as_str()))
            .collect(),
        StaffRole::Technician => get_all_permissions()
            .into_iter()
            .filter(|permission| TECHNICIAN_PERMISSIONS.contains(&permission.name.as_str()))
            .collect(),
    }
}

pub fn has_permission(role: StaffRole, name: &str) -> bool {
    role_permissions(role)
        .iter()
        .any(|permission| permission.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_permission_names_are_unique() {
        let all = get_all_permissions();
        let names: HashSet<_> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn test_role_grants_reference_real_permissions() {
        let names: HashSet<_> = get_all_permissions()
            .into_iter()
            .map(|p| p.name)
            .collect();
        for name in STAFF_PERMISSIONS.iter().chain(TECHNICIAN_PERMISSIONS) {
            assert!(names.contains(*name), "unknown permission {}", name);
        }
    }

    #[test]
    fn test_admin_holds_full_catalog() {
        assert_eq!(
            role_permissions(StaffRole::Admin).len(),
            get_all_permissions().len()
        );
    }

    #[test]
    fn test_staff_cannot_manage_users_or_settings() {
        assert!(!has_permission(StaffRole::Staff, "user:manage"));
        assert!(!has_permission(StaffRole::Staff, "settings:manage"));
        assert!(has_permission(StaffRole::Staff, "battery:intake"));
    }

    #[test]
    fn test_technician_set_is_minimal() {
        let names: Vec<_> = role_permissions(StaffRole::Technician)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "battery:view_assigned",
                "battery:update_status",
                "battery:update_repair"
            ]
        );
    }

    #[test]
    fn test_category_filter() {
        let invoices = get_permissions_by_category(PermissionCategory::Invoices);
        assert!(!invoices.is_empty());
        assert!(invoices
            .iter()
            .all(|p| p.category == PermissionCategory::Invoices));
    }
}
