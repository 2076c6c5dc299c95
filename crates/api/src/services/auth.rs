//! Authentication service for staff login and token management.

use chrono::Utc;
use shared::crypto::sha256_hex;
use shared::jwt::{JwtConfig, JwtError};
use shared::password::{verify_password, PasswordError};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use domain::models::StaffRole;
use persistence::entities::StaffRoleDb;

use crate::config::JwtAuthConfig;
use crate::extractors::user_auth::jwt_config_from;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("User is disabled")]
    UserDisabled,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Token error: {0}")]
    TokenError(#[from] JwtError),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: StaffRole,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_in: i64,
}

/// Token pair with metadata.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_token_jti: String,
    pub expires_in: i64,
}

/// Result of a successful token refresh.
#[derive(Debug, Clone)]
pub struct RefreshResult {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Database row for user query.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    full_name: String,
    role: StaffRoleDb,
    is_active: bool,
}

/// Database row for session query.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    #[allow(dead_code)] // Used for validation
    user_id: Uuid,
    #[allow(dead_code)] // Used for validation
    refresh_token_hash: String,
    expires_at: chrono::DateTime<Utc>,
}

/// Authentication service.
pub struct AuthService {
    pool: PgPool,
    jwt_config: JwtConfig,
    access_token_expiry: i64,
}

impl AuthService {
    /// Creates a new AuthService with the given database pool and JWT configuration.
    pub fn new(pool: PgPool, jwt_config: &JwtAuthConfig) -> Self {
        Self {
            pool,
            jwt_config: jwt_config_from(jwt_config),
            access_token_expiry: jwt_config.access_token_expiry_secs,
        }
    }

    /// Login with username and password.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        // Fetch user by username
        let user: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, password_hash, full_name, role, is_active
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let user = match user {
            Some(u) => u,
            None => return Err(AuthError::InvalidCredentials),
        };

        // Check if user is active
        if !user.is_active {
            return Err(AuthError::UserDisabled);
        }

        // Verify password
        let is_valid = verify_password(password, &user.password_hash)?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        // Update last_login_at
        let now = Utc::now();
        sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2")
            .bind(now)
            .bind(user.id)
            .execute(&self.pool)
            .await?;

        let role: StaffRole = user.role.into();

        // Generate tokens
        let tokens = self.generate_tokens(user.id, role)?;

        // Create session
        self.create_session(user.id, &tokens).await?;

        Ok(LoginResult {
            user_id: user.id,
            username: user.username,
            full_name: user.full_name,
            role,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_token_expires_in: self.access_token_expiry,
        })
    }

    /// Refresh access token using a valid refresh token.
    ///
    /// Implements token rotation: old refresh token is invalidated and a new one is issued.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResult, AuthError> {
        // Validate the refresh token
        let claims = self
            .jwt_config
            .validate_refresh_token(refresh_token)
            .map_err(|e| match e {
                JwtError::TokenExpired => AuthError::InvalidRefreshToken,
                JwtError::InvalidToken => AuthError::InvalidRefreshToken,
                _ => AuthError::TokenError(e),
            })?;

        // Parse user ID from claims
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidRefreshToken)?;

        // Hash the JTI to find the session
        let jti_hash = sha256_hex(&claims.jti);

        // Find and validate the session
        let session: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, refresh_token_hash, expires_at
            FROM auth_sessions
            WHERE refresh_token_hash = $1 AND user_id = $2
            "#,
        )
        .bind(&jti_hash)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let session = session.ok_or(AuthError::SessionNotFound)?;

        // Check if session is expired
        if session.expires_at < Utc::now() {
            // Delete expired session
            sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
                .bind(session.id)
                .execute(&self.pool)
                .await?;
            return Err(AuthError::InvalidRefreshToken);
        }

        // Check if user is still active, and pick up any role change
        let user_state: Option<(bool, StaffRoleDb)> =
            sqlx::query_as("SELECT is_active, role FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        let (is_active, role) = user_state.ok_or(AuthError::UserNotFound)?;
        if !is_active {
            return Err(AuthError::UserDisabled);
        }

        // Generate new tokens (rotation)
        let new_tokens = self.generate_tokens(user_id, role.into())?;

        // Update session with new refresh token hash
        let now = Utc::now();
        let new_expires_at =
            now + chrono::Duration::seconds(self.jwt_config.refresh_token_expiry_secs);
        let new_refresh_hash = sha256_hex(&new_tokens.refresh_token_jti);

        sqlx::query(
            r#"
            UPDATE auth_sessions
            SET refresh_token_hash = $1, expires_at = $2, last_used_at = $3
            WHERE id = $4
            "#,
        )
        .bind(&new_refresh_hash)
        .bind(new_expires_at)
        .bind(now)
        .bind(session.id)
        .execute(&self.pool)
        .await?;

        Ok(RefreshResult {
            access_token: new_tokens.access_token,
            refresh_token: new_tokens.refresh_token,
            expires_in: self.access_token_expiry,
        })
    }

    /// Generate access and refresh tokens for a user.
    fn generate_tokens(&self, user_id: Uuid, role: StaffRole) -> Result<TokenPair, AuthError> {
        let (access_token, _access_jti) = self
            .jwt_config
            .generate_access_token(user_id, role.as_str())?;
        let (refresh_token, refresh_jti) = self
            .jwt_config
            .generate_refresh_token(user_id, role.as_str())?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            refresh_token_jti: refresh_jti,
            expires_in: self.access_token_expiry,
        })
    }

    /// Create a session for the user with the generated tokens.
    ///
    /// Only the hash of the refresh token's JTI is stored, never the token.
    async fn create_session(&self, user_id: Uuid, tokens: &TokenPair) -> Result<(), AuthError> {
        let session_id = Uuid::new_v4();
        let now = Utc::now();
        let expires_at = now + chrono::Duration::seconds(self.jwt_config.refresh_token_expiry_secs);

        let refresh_hash = sha256_hex(&tokens.refresh_token_jti);

        sqlx::query(
            r#"
            INSERT INTO auth_sessions (id, user_id, refresh_token_hash, expires_at, created_at, last_used_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            "#
        )
        .bind(session_id)
        .bind(user_id)
        .bind(&refresh_hash)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
