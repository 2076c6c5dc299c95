//! Staff account domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Role of a staff account.
///
/// Roles gate both HTTP endpoints and lifecycle transitions; see
/// [`crate::services::lifecycle::permitted_roles`] and
/// [`crate::models::permission::role_permissions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    Staff,
    Technician,
}

impl StaffRole {
    pub const ALL: [StaffRole; 3] = [StaffRole::Admin, StaffRole::Staff, StaffRole::Technician];

    /// Wire/storage form of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Admin => "admin",
            StaffRole::Staff => "staff",
            StaffRole::Technician => "technician",
        }
    }

    /// Human-readable label.
    pub fn display_name(&self) -> &'static str {
        match self {
            StaffRole::Admin => "Admin",
            StaffRole::Staff => "Staff",
            StaffRole::Technician => "Technician",
        }
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(StaffRole::Admin),
            "staff" => Ok(StaffRole::Staff),
            "technician" => Ok(StaffRole::Technician),
            other => Err(format!("Unknown staff role: {}", other)),
        }
    }
}

/// A staff account acting in the system.
///
/// The password hash never leaves the persistence/auth boundary; this model
/// deliberately has no credential field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: StaffRole,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating a staff account (admin only).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(custom(function = "shared::validation::validate_username"))]
    pub username: String,

    /// Strength is enforced by the shared password policy in the handler.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: Option<String>,

    pub role: StaffRole,
}

/// Request payload for updating a staff account (admin only).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: Option<String>,

    pub role: Option<StaffRole>,

    pub is_active: Option<bool>,
}

/// Request payload for an admin password reset.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Password is required"))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_round_trip_all_variants() {
        for role in StaffRole::ALL {
            assert_eq!(StaffRole::from_str(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn test_role_from_str_unknown() {
        assert!(StaffRole::from_str("manager").is_err());
        assert!(StaffRole::from_str("ADMIN").is_err());
    }

    #[test]
    fn test_role_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&StaffRole::Technician).unwrap(),
            "\"technician\""
        );
        let parsed: StaffRole = serde_json::from_str("\"staff\"").unwrap();
        assert_eq!(parsed, StaffRole::Staff);
    }

    #[test]
    fn test_user_serializes_without_credentials() {
        let user = User {
            id: Uuid::new_v4(),
            username: "asha.front".to_string(),
            full_name: "Asha Verma".to_string(),
            email: None,
            phone: Some("+919876543210".to_string()),
            role: StaffRole::Staff,
            is_active: true,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("\"username\":\"asha.front\""));
        assert!(json.contains("\"fullName\":\"Asha Verma\""));
        assert!(!json.contains("password"));
        assert!(!json.contains("hash"));
    }

    #[test]
    fn test_create_user_request_validation() {
        let request = CreateUserRequest {
            username: "tech.ravi".to_string(),
            password: "bench-pass-1".to_string(),
            full_name: "Ravi Kumar".to_string(),
            email: Some("ravi@example.com".to_string()),
            phone: Some("9876543210".to_string()),
            role: StaffRole::Technician,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_user_request_rejects_bad_username() {
        let request = CreateUserRequest {
            username: "Ravi Kumar".to_string(),
            password: "bench-pass-1".to_string(),
            full_name: "Ravi Kumar".to_string(),
            email: None,
            phone: None,
            role: StaffRole::Technician,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_user_request_all_optional() {
        let request: UpdateUserRequest = serde_json::from_str("{}").unwrap();
        assert!(request.validate().is_ok());
        assert!(request.full_name.is_none());
        assert!(request.role.is_none());
    }
}
