//! Authentication routes for staff login and token management.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use domain::models::User;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::rate_limit::rate_limited_response;
use crate::services::auth::{AuthError, AuthService};

/// Request body for login.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// User information in the login response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: String,
}

/// Token information in response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Response body for successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub tokens: TokensResponse,
}

/// Login with username and password.
///
/// POST /api/v1/auth/login
///
/// Attempts are rate limited per submitted username.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    // Validate request
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    // Rate limit before touching credentials
    if let Some(ref rate_limiter) = state.rate_limiter {
        if let Err(retry_after) = rate_limiter.check(&request.username) {
            return Ok(rate_limited_response(
                state.config.security.rate_limit_per_minute,
                retry_after,
            ));
        }
    }

    let auth_service = AuthService::new(state.pool.clone(), &state.config.jwt);

    let result = auth_service
        .login(&request.username, &request.password)
        .await
        .map_err(map_auth_error)?;

    info!(
        user_id = %result.user_id,
        username = %result.username,
        "User logged in"
    );

    let response = LoginResponse {
        user: UserResponse {
            id: result.user_id.to_string(),
            username: result.username,
            full_name: result.full_name,
            role: result.role.as_str().to_string(),
        },
        tokens: TokensResponse {
            access_token: result.access_token,
            refresh_token: result.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: result.access_token_expires_in,
        },
    };

    Ok(Json(response).into_response())
}

/// Exchange a refresh token for a new token pair.
///
/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokensResponse>, ApiError> {
    // Validate request
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let auth_service = AuthService::new(state.pool.clone(), &state.config.jwt);

    let result = auth_service
        .refresh(&request.refresh_token)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(TokensResponse {
        access_token: result.access_token,
        refresh_token: result.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: result.expires_in,
    }))
}

/// Get the authenticated user's own profile.
///
/// GET /api/v1/auth/me
pub async fn me(auth: UserAuth) -> Json<User> {
    Json(auth.user)
}

/// Map auth service errors onto API error responses.
fn map_auth_error(e: AuthError) -> ApiError {
    match e {
        AuthError::InvalidCredentials => {
            ApiError::Unauthorized("Invalid username or password".to_string())
        }
        AuthError::UserDisabled => ApiError::Forbidden("User account is disabled".to_string()),
        AuthError::UserNotFound => ApiError::Unauthorized("Invalid username or password".to_string()),
        AuthError::InvalidRefreshToken | AuthError::SessionNotFound => {
            ApiError::Unauthorized("Invalid or expired refresh token".to_string())
        }
        AuthError::DatabaseError(db_err) => ApiError::from(db_err),
        AuthError::PasswordError(e) => ApiError::Internal(format!("Password error: {}", e)),
        AuthError::TokenError(e) => ApiError::Internal(format!("Token error: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let request = LoginRequest {
            username: "asha".to_string(),
            password: "SecureP@ss1".to_string(),
        };

        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_login_request_empty_username() {
        let request = LoginRequest {
            username: "".to_string(),
            password: "SecureP@ss1".to_string(),
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_login_request_empty_password() {
        let request = LoginRequest {
            username: "asha".to_string(),
            password: "".to_string(),
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_refresh_request_empty_token() {
        let request = RefreshRequest {
            refresh_token: "".to_string(),
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_login_request_deserializes_camel_case() {
        let json = r#"{"username": "asha", "password": "secret"}"#;
        let request: LoginRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.username, "asha");
        assert_eq!(request.password, "secret");
    }

    #[test]
    fn test_refresh_request_deserializes_camel_case() {
        let json = r#"{"refreshToken": "some-token"}"#;
        let request: RefreshRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.refresh_token, "some-token");
    }

    #[test]
    fn test_login_response_serialization() {
        let response = LoginResponse {
            user: UserResponse {
                id: "a2c3b8a8-1111-2222-3333-444455556666".to_string(),
                username: "asha".to_string(),
                full_name: "Asha Verma".to_string(),
                role: "staff".to_string(),
            },
            tokens: TokensResponse {
                access_token: "at".to_string(),
                refresh_token: "rt".to_string(),
                token_type: "Bearer".to_string(),
                expires_in: 900,
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"fullName\":\"Asha Verma\""));
        assert!(json.contains("\"accessToken\":\"at\""));
        assert!(json.contains("\"tokenType\":\"Bearer\""));
        assert!(json.contains("\"expiresIn\":900"));
    }

    #[test]
    fn test_map_auth_error_invalid_credentials() {
        let err = map_auth_error(AuthError::InvalidCredentials);
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_map_auth_error_disabled() {
        let err = map_auth_error(AuthError::UserDisabled);
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_map_auth_error_refresh() {
        let err = map_auth_error(AuthError::InvalidRefreshToken);
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
