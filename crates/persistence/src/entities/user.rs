//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::user::{StaffRole, User};

/// Database enum for staff roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "staff_role", rename_all = "snake_case")]
pub enum StaffRoleDb {
    Admin,
    Staff,
    Technician,
}

impl From<StaffRole> for StaffRoleDb {
    fn from(role: StaffRole) -> Self {
        match role {
            StaffRole::Admin => StaffRoleDb::Admin,
            StaffRole::Staff => StaffRoleDb::Staff,
            StaffRole::Technician => StaffRoleDb::Technician,
        }
    }
}

impl From<StaffRoleDb> for StaffRole {
    fn from(role: StaffRoleDb) -> Self {
        match role {
            StaffRoleDb::Admin => StaffRole::Admin,
            StaffRoleDb::Staff => StaffRole::Staff,
            StaffRoleDb::Technician => StaffRole::Technician,
        }
    }
}

/// Database row mapping for the users table.
///
/// Carries the password hash; the conversion to the domain model drops it
/// so it can never leak through a serialized response.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: StaffRoleDb,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            username: entity.username,
            full_name: entity.full_name,
            email: entity.email,
            phone: entity.phone,
            role: entity.role.into(),
            is_active: entity.is_active,
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_user_entity() -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            username: "ravi.k".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_string(),
            full_name: "Ravi Kumar".to_string(),
            email: Some("ravi@example.com".to_string()),
            phone: Some("9876543210".to_string()),
            role: StaffRoleDb::Technician,
            is_active: true,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_entity_to_domain_drops_hash() {
        let entity = create_test_user_entity();
        let user: User = entity.clone().into();

        assert_eq!(user.id, entity.id);
        assert_eq!(user.username, entity.username);
        assert_eq!(user.role, StaffRole::Technician);

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_role_db_round_trip() {
        for role in StaffRole::ALL {
            let db: StaffRoleDb = role.into();
            let back: StaffRole = db.into();
            assert_eq!(back, role);
        }
    }
}
