//! User JWT authentication extractor.
//!
//! Validates the Bearer token and resolves it to a full staff record so
//! handlers can feed the acting user straight into the lifecycle engine.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use domain::models::User;
use persistence::repositories::UserRepository;
use shared::jwt::{extract_user_id, JwtConfig};

use crate::app::AppState;
use crate::config::JwtAuthConfig;
use crate::error::ApiError;

/// Authenticated staff member resolved from the JWT.
///
/// Resolution hits the database on every request: tokens of deactivated
/// users stop working immediately instead of at expiry.
#[derive(Debug, Clone)]
pub struct UserAuth {
    /// The acting user, guaranteed active at extraction time.
    pub user: User,
    /// JWT ID (jti) for session tracking.
    pub jti: String,
}

/// Build the shared token codec from API configuration.
pub fn jwt_config_from(config: &JwtAuthConfig) -> JwtConfig {
    JwtConfig::with_leeway(
        &config.secret,
        config.access_token_expiry_secs,
        config.refresh_token_expiry_secs,
        config.leeway_secs,
    )
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        if !auth_header.starts_with("Bearer ") {
            return Err(ApiError::Unauthorized(
                "Invalid Authorization header format".to_string(),
            ));
        }

        let token = &auth_header[7..];

        let jwt_config = jwt_config_from(&state.config.jwt);
        let claims = jwt_config
            .validate_access_token(token)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        let user_id = extract_user_id(&claims)
            .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))?;

        let repo = UserRepository::new(state.pool.clone());
        let entity = repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

        if !entity.is_active {
            return Err(ApiError::Unauthorized("User account is disabled".to_string()));
        }

        Ok(UserAuth {
            user: entity.into(),
            jti: claims.jti,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::StaffRole;
    use uuid::Uuid;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "asha".to_string(),
            full_name: "Asha Verma".to_string(),
            email: None,
            phone: None,
            role: StaffRole::Technician,
            is_active: true,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_auth_struct() {
        let auth = UserAuth {
            user: sample_user(),
            jti: "test_jti".to_string(),
        };
        assert!(!auth.jti.is_empty());
        assert_eq!(auth.user.role, StaffRole::Technician);
    }

    #[test]
    fn test_user_auth_clone() {
        let auth = UserAuth {
            user: sample_user(),
            jti: "test_jti".to_string(),
        };
        let cloned = auth.clone();
        assert_eq!(auth.user.id, cloned.user.id);
        assert_eq!(auth.jti, cloned.jti);
    }

    #[test]
    fn test_jwt_config_round_trip() {
        let config = JwtAuthConfig {
            secret: "test-secret-test-secret-test-secret!".to_string(),
            access_token_expiry_secs: 900,
            refresh_token_expiry_secs: 604800,
            leeway_secs: 30,
        };
        let jwt = jwt_config_from(&config);

        let user_id = Uuid::new_v4();
        let (token, _jti) = jwt
            .generate_access_token(user_id, "admin")
            .expect("generate token");
        let claims = jwt.validate_access_token(&token).expect("validate token");
        assert_eq!(extract_user_id(&claims).unwrap(), user_id);
    }
}
