//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Delimiter used inside printed QR payloads. Field values that end up in a
/// payload must never contain it.
pub const QR_DELIMITER: char = '|';

lazy_static! {
    /// Optional leading '+', then 7 to 15 digits.
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{7,15}$").unwrap();
    /// Lowercase letters, digits, '.', '_' and '-'; 3 to 32 characters.
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-z0-9._-]{3,32}$").unwrap();
    /// Indian GST identification number (15 characters).
    static ref GSTIN_RE: Regex =
        Regex::new(r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z]$").unwrap();
}

/// Validates a phone number: optional leading `+`, 7-15 digits.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone number must be 7-15 digits with optional leading +".into());
        Err(err)
    }
}

/// Validates a staff account username.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        let mut err = ValidationError::new("username_format");
        err.message =
            Some("Username must be 3-32 characters: lowercase letters, digits, . _ -".into());
        Err(err)
    }
}

/// Validates a GST identification number when one is supplied.
pub fn validate_gstin(gstin: &str) -> Result<(), ValidationError> {
    if GSTIN_RE.is_match(gstin) {
        Ok(())
    } else {
        let mut err = ValidationError::new("gstin_format");
        err.message = Some("GSTIN must be a valid 15-character identifier".into());
        Err(err)
    }
}

/// Validates that a value is safe to embed in a QR payload, i.e. contains no
/// delimiter character.
pub fn validate_qr_field(value: &str) -> Result<(), ValidationError> {
    if value.contains(QR_DELIMITER) {
        let mut err = ValidationError::new("qr_delimiter");
        err.message = Some("Value must not contain the '|' character".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates a measured battery voltage in volts.
pub fn validate_voltage(voltage: f64) -> Result<(), ValidationError> {
    if (0.0..=1000.0).contains(&voltage) {
        Ok(())
    } else {
        let mut err = ValidationError::new("voltage_range");
        err.message = Some("Voltage must be between 0 and 1000".into());
        Err(err)
    }
}

/// Validates a money amount in minor units (paise).
pub fn validate_amount(amount: i64) -> Result<(), ValidationError> {
    if amount >= 0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("amount_range");
        err.message = Some("Amount must be non-negative".into());
        Err(err)
    }
}
