//! Admin staff-account management endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use domain::models::user::{CreateUserRequest, ResetPasswordRequest, UpdateUserRequest};
use domain::models::{StaffRole, User};
use persistence::entities::StaffRoleDb;
use persistence::repositories::{NewUser, UserChanges, UserRepository};
use shared::password::{hash_password, validate_password_strength};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Query parameters for listing users.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub role: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListUsersQuery {
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
pub struct UserListResponse {
    pub users: Vec<User>,
    pub pagination: ListPagination,
}

fn require_admin(auth: &UserAuth) -> Result<(), ApiError> {
    if auth.user.role != StaffRole::Admin {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }
    Ok(())
}

/// Create a staff account.
///
/// POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    request.validate()?;
    require_admin(&auth)?;

    validate_password_strength(&request.password)
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    let repo = UserRepository::new(state.pool.clone());
    let entity = match repo
        .create(NewUser {
            username: request.username.clone(),
            password_hash,
            full_name: request.full_name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            role: request.role.into(),
            created_by: Some(auth.user.id),
        })
        .await
    {
        Ok(entity) => entity,
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
            return Err(ApiError::Conflict("Username is already taken".to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    let user: User = entity.into();

    info!(
        user_id = %user.id,
        username = %user.username,
        role = %user.role,
        "User created"
    );

    Ok((StatusCode::CREATED, Json(user)))
}

/// Fetch a single staff account.
///
/// GET /api/v1/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    require_admin(&auth)?;

    let repo = UserRepository::new(state.pool.clone());
    let entity = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(entity.into()))
}

/// List staff accounts, newest first, optionally filtered by role.
///
/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    require_admin(&auth)?;

    let role = match &query.role {
        Some(s) => Some(
            s.parse::<StaffRole>()
                .map_err(|_| ApiError::Validation(format!("Invalid role: {}", s)))?,
        ),
        None => None,
    };
    let role_filter = role.map(StaffRoleDb::from);

    let page = query.page();
    let per_page = query.per_page();
    let offset = (page - 1) * per_page;

    let repo = UserRepository::new(state.pool.clone());
    let total = repo.count(role_filter).await?;
    let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

    let entities = repo.list(role_filter, per_page, offset).await?;
    let users: Vec<User> = entities.into_iter().map(Into::into).collect();

    Ok(Json(UserListResponse {
        users,
        pagination: ListPagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// Partially update a staff account. Absent fields keep their stored values.
///
/// PUT /api/v1/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    request.validate()?;
    require_admin(&auth)?;

    let repo = UserRepository::new(state.pool.clone());
    let updated = repo
        .update(
            id,
            UserChanges {
                full_name: request.full_name.clone(),
                email: request.email.clone(),
                phone: request.phone.clone(),
                role: request.role.map(Into::into),
                is_active: request.is_active,
            },
        )
        .await?;

    match updated {
        Some(entity) => {
            info!(user_id = %id, "User updated");
            Ok(Json(entity.into()))
        }
        // The guard refused or the row is gone; look again to tell which
        None => {
            if repo.find_by_id(id).await?.is_some() {
                Err(ApiError::Conflict(
                    "Cannot demote or deactivate the last active admin".to_string(),
                ))
            } else {
                Err(ApiError::NotFound("User not found".to_string()))
            }
        }
    }
}

/// Replace a staff account's password.
///
/// POST /api/v1/users/:id/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;
    require_admin(&auth)?;

    validate_password_strength(&request.new_password)
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let hash = hash_password(&request.new_password)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    let repo = UserRepository::new(state.pool.clone());
    let rows = repo.set_password_hash(id, &hash).await?;
    if rows == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!(user_id = %id, "Password reset by admin");

    Ok(StatusCode::NO_CONTENT)
}

/// Deactivate a staff account (soft delete).
///
/// DELETE /api/v1/users/:id
pub async fn deactivate_user(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&auth)?;

    if id == auth.user.id {
        return Err(ApiError::Conflict(
            "Cannot deactivate your own account".to_string(),
        ));
    }

    let repo = UserRepository::new(state.pool.clone());
    let rows = repo.deactivate(id).await?;
    if rows == 0 {
        return match repo.find_by_id(id).await? {
            None => Err(ApiError::NotFound("User not found".to_string())),
            // Deactivating twice is a no-op, not an error
            Some(entity) if !entity.is_active => Ok(StatusCode::NO_CONTENT),
            Some(_) => Err(ApiError::Conflict(
                "Cannot deactivate the last active admin".to_string(),
            )),
        };
    }

    info!(user_id = %id, "User deactivated");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn admin_auth() -> UserAuth {
        UserAuth {
            user: User {
                id: Uuid::new_v4(),
                username: "asha".to_string(),
                full_name: "Asha Verma".to_string(),
                email: None,
                phone: None,
                role: StaffRole::Admin,
                is_active: true,
                created_by: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            jti: "test-jti".to_string(),
        }
    }

    #[test]
    fn test_require_admin_accepts_admin() {
        assert!(require_admin(&admin_auth()).is_ok());
    }

    #[test]
    fn test_require_admin_rejects_staff_and_technician() {
        for role in [StaffRole::Staff, StaffRole::Technician] {
            let mut auth = admin_auth();
            auth.user.role = role;
            assert!(require_admin(&auth).is_err());
        }
    }

    #[test]
    fn test_create_request_deserialization() {
        let json = r#"{
            "username": "tech.ravi",
            "password": "bench-pass-1",
            "fullName": "Ravi Kumar",
            "role": "technician"
        }"#;
        let request: CreateUserRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.username, "tech.ravi");
        assert_eq!(request.role, StaffRole::Technician);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_reset_password_request_deserialization() {
        let json = r#"{"newPassword": "a-much-better-one"}"#;
        let request: ResetPasswordRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.new_password, "a-much-better-one");
    }

    #[test]
    fn test_list_query_role_parsing() {
        assert!("technician".parse::<StaffRole>().is_ok());
        assert!("manager".parse::<StaffRole>().is_err());
    }

    #[test]
    fn test_list_query_clamps() {
        let query = ListUsersQuery {
            role: None,
            page: Some(-2),
            per_page: Some(0),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 1);
    }

    #[test]
    fn test_list_response_serialization() {
        let response = UserListResponse {
            users: Vec::new(),
            pagination: ListPagination {
                page: 1,
                per_page: 50,
                total: 0,
                total_pages: 0,
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"users\":[]"));
        assert!(json.contains("\"perPage\":50"));
    }
}
