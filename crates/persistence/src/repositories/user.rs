//! User repository for database operations.
//!
//! Credential verification lives in the API auth service; this repository
//! backs the admin user-management routes.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{StaffRoleDb, UserEntity};
use crate::metrics::QueryTimer;

/// Field values for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: StaffRoleDb,
    pub created_by: Option<Uuid>,
}

/// Partial update for a user. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<StaffRoleDb>,
    pub is_active: Option<bool>,
}

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a new user. A duplicate username surfaces as a unique
    /// violation for the API layer to map.
    pub async fn create(&self, fields: NewUser) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let now = Utc::now();
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (id, username, password_hash, full_name, email,
                               phone, role, is_active, created_by, created_at,
                               updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, true, $8, $9, $9)
            RETURNING id, username, password_hash, full_name, email, phone,
                      role, is_active, created_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&fields.username)
        .bind(&fields.password_hash)
        .bind(&fields.full_name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(fields.role)
        .bind(fields.created_by)
        .bind(now)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, password_hash, full_name, email, phone, role,
                   is_active, created_by, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List users newest first, optionally filtered by role.
    pub async fn list(
        &self,
        role: Option<StaffRoleDb>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_users");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, password_hash, full_name, email, phone, role,
                   is_active, created_by, created_at, updated_at
            FROM users
            WHERE ($1::staff_role IS NULL OR role = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(role)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count users, optionally filtered by role.
    pub async fn count(&self, role: Option<StaffRoleDb>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_users");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE ($1::staff_role IS NULL OR role = $1)
            "#,
        )
        .bind(role)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partial update. The WHERE clause refuses to demote or deactivate the
    /// last active admin, so the check and the write are one statement and
    /// cannot race. Returns `None` when the row was not found or the guard
    /// refused; callers disambiguate with [`Self::find_by_id`].
    pub async fn update(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                role = COALESCE($5, role),
                is_active = COALESCE($6, is_active),
                updated_at = $7
            WHERE id = $1
              AND NOT (
                role = 'admin' AND is_active = true
                AND (COALESCE($5, role) <> 'admin' OR COALESCE($6, is_active) = false)
                AND NOT EXISTS (
                    SELECT 1 FROM users other
                    WHERE other.role = 'admin' AND other.is_active = true
                      AND other.id <> $1
                )
              )
            RETURNING id, username, password_hash, full_name, email, phone,
                      role, is_active, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.full_name)
        .bind(&changes.email)
        .bind(&changes.phone)
        .bind(changes.role)
        .bind(changes.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deactivate a user (soft delete), refusing for the last active admin.
    /// Returns the number of rows affected.
    pub async fn deactivate(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("deactivate_user");
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_active = false, updated_at = $2
            WHERE id = $1 AND is_active = true
              AND NOT (
                role = 'admin'
                AND NOT EXISTS (
                    SELECT 1 FROM users other
                    WHERE other.role = 'admin' AND other.is_active = true
                      AND other.id <> $1
                )
              )
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected());
        timer.record();
        result
    }

    /// Replace a user's password hash.
    /// Returns the number of rows affected (0 if not found).
    pub async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("set_user_password_hash");
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected());
        timer.record();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_changes_default_is_noop() {
        let changes = UserChanges::default();
        assert!(changes.full_name.is_none());
        assert!(changes.role.is_none());
        assert!(changes.is_active.is_none());
    }
}
