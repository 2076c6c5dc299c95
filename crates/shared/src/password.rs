//! Password hashing using Argon2id.
//!
//! Staff account passwords are stored as PHC-formatted Argon2id hashes with
//! OWASP-recommended parameters. Verification is constant-time. A minimal
//! strength policy lives here too so account creation and password reset
//! apply the same rule.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Error type for password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),
}

/// Argon2id parameters following OWASP recommendations (2024).
/// - Memory: 19456 KiB (19 MiB)
/// - Iterations: 2
/// - Parallelism: 1
const MEMORY_COST: u32 = 19456;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;
const OUTPUT_LEN: usize = 32;

/// Minimum accepted password length for staff accounts.
pub const MIN_PASSWORD_LEN: usize = 8;

fn create_argon2() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST, TIME_COST, PARALLELISM, Some(OUTPUT_LEN))
        .map_err(|e| PasswordError::HashError(format!("Failed to create Argon2 params: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Checks a candidate password against the account password policy.
///
/// Requires at least [`MIN_PASSWORD_LEN`] characters with at least one
/// letter and one digit. Returns `PasswordError::WeakPassword` with a
/// user-facing message when the policy is not met.
pub fn validate_password_strength(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::WeakPassword(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(PasswordError::WeakPassword(
            "Password must contain at least one letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::WeakPassword(
            "Password must contain at least one digit".to_string(),
        ));
    }
    Ok(())
}

/// Hashes a password using Argon2id.
///
/// Returns a PHC-formatted string carrying the algorithm, parameters, salt,
/// and hash, so stored hashes remain verifiable across parameter upgrades.
///
/// # Example
/// ```
/// use shared::password::hash_password;
///
/// let hash = hash_password("workshop-pass1").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = create_argon2()?;

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a password against a stored PHC hash in constant time.
///
/// Returns `Ok(false)` for a well-formed hash that does not match, and
/// `PasswordError::InvalidHashFormat` when the stored value is not a PHC
/// string at all.
///
/// # Example
/// ```
/// use shared::password::{hash_password, verify_password};
///
/// let hash = hash_password("workshop-pass1").unwrap();
/// assert!(verify_password("workshop-pass1", &hash).unwrap());
/// assert!(!verify_password("guess", &hash).unwrap());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    // The stored hash carries its own parameters; the default instance
    // verifies against those.
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_returns_phc_format() {
        let hash = hash_password("intake-desk-9").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("$v=19$")); // Version 0x13 = 19
        assert!(hash.contains("m=19456"));
        assert!(hash.contains("t=2"));
        assert!(hash.contains("p=1"));
    }

    #[test]
    fn test_hash_password_produces_unique_hashes() {
        let hash1 = hash_password("same_password1").unwrap();
        let hash2 = hash_password("same_password1").unwrap();
        // Different salts should produce different hashes
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct() {
        let password = "bench-test-42!";
        let hash = hash_password(password).unwrap();
        assert!(verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("correct-password1").unwrap();
        assert!(!verify_password("wrong-password1", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        let result = verify_password("password1", "not-a-phc-string");
        assert!(matches!(result, Err(PasswordError::InvalidHashFormat)));
    }

    #[test]
    fn test_hash_password_unicode() {
        let password = "बैटरी-दुकान-7";
        let hash = hash_password(password).unwrap();
        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("different1", &hash).unwrap());
    }

    #[test]
    fn test_hash_params_in_phc_prefix() {
        let hash = hash_password("short-pw-1").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
    }

    #[test]
    fn test_strength_accepts_policy_compliant() {
        assert!(validate_password_strength("workshop1").is_ok());
        assert!(validate_password_strength("Str0ng-enough").is_ok());
    }

    #[test]
    fn test_strength_rejects_short() {
        let err = validate_password_strength("ab1").unwrap_err();
        assert!(matches!(err, PasswordError::WeakPassword(_)));
        assert!(format!("{}", err).contains("at least 8"));
    }

    #[test]
    fn test_strength_rejects_no_digit() {
        assert!(matches!(
            validate_password_strength("lettersonly"),
            Err(PasswordError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_strength_rejects_no_letter() {
        assert!(matches!(
            validate_password_strength("1234567890"),
            Err(PasswordError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_password_error_display() {
        let err = PasswordError::HashError("boom".to_string());
        assert!(format!("{}", err).contains("boom"));

        let err = PasswordError::InvalidHashFormat;
        assert!(format!("{}", err).contains("Invalid password hash format"));
    }
}
