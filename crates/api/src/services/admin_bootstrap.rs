//! Admin bootstrap service for initial setup.
//!
//! Creates the first admin user on startup if configured via environment variables.
//! This is a one-time operation that checks if an admin already exists.

use shared::password::{hash_password, PasswordError};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AdminBootstrapConfig;

/// Error types for admin bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),
}

/// Bootstrap admin user if configured and not already done.
///
/// This function should be called after migrations on startup.
/// It is idempotent - if an admin user already exists, it does nothing.
pub async fn bootstrap_admin(
    pool: &PgPool,
    config: &AdminBootstrapConfig,
) -> Result<(), BootstrapError> {
    // Skip if not configured
    if config.bootstrap_username.is_empty() {
        return Ok(());
    }

    if config.bootstrap_password.is_empty() {
        warn!(
            "BATT__ADMIN__BOOTSTRAP_USERNAME is set but BATT__ADMIN__BOOTSTRAP_PASSWORD is empty - skipping bootstrap"
        );
        return Ok(());
    }

    // Check if any admin already exists, or the bootstrap username is taken
    let admin_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM users u
            WHERE u.role = 'admin' OR u.username = $1
        )
        "#,
    )
    .bind(&config.bootstrap_username)
    .fetch_one(pool)
    .await?;

    if admin_exists {
        info!("Admin user already exists - skipping bootstrap");
        return Ok(());
    }

    // Hash the password using argon2 (same as auth service)
    let password_hash = hash_password(&config.bootstrap_password)?;

    let user_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (id, username, password_hash, full_name, role, is_active)
        VALUES ($1, $2, $3, 'System Administrator', 'admin', true)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&config.bootstrap_username)
    .bind(&password_hash)
    .fetch_one(pool)
    .await?;

    info!(
        username = %config.bootstrap_username,
        user_id = %user_id,
        "Bootstrap admin user created successfully"
    );

    warn!(
        "SECURITY: Remove BATT__ADMIN__BOOTSTRAP_USERNAME and BATT__ADMIN__BOOTSTRAP_PASSWORD \
         from configuration after initial setup."
    );

    Ok(())
}
