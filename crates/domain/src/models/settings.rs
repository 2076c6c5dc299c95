//! Shop settings: a single-row configuration record for the shop identity
//! and the invoice number sequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSettings {
    pub shop_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub invoice_prefix: String,
    /// Next number handed out by the invoice sequence, never reused.
    pub next_invoice_number: i64,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for updating shop settings. Absent fields are left
/// unchanged. The invoice counter is not settable through the API.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, max = 100, message = "Shop name must be 1-100 characters"))]
    pub shop_name: Option<String>,

    #[validate(length(max = 200, message = "Address must be at most 200 characters"))]
    pub address: Option<String>,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: Option<String>,

    #[validate(length(min = 1, max = 10, message = "Invoice prefix must be 1-10 characters"))]
    pub invoice_prefix: Option<String>,
}

/// Formats a sequence number into a printable invoice number, zero padded
/// to four digits ("INV-0042"). Numbers past 9999 widen naturally.
pub fn format_invoice_number(prefix: &str, number: i64) -> String {
    format!("{}-{:04}", prefix, number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_invoice_number_pads_to_four_digits() {
        assert_eq!(format_invoice_number("INV", 1), "INV-0001");
        assert_eq!(format_invoice_number("INV", 42), "INV-0042");
        assert_eq!(format_invoice_number("INV", 9999), "INV-9999");
    }

    #[test]
    fn test_format_invoice_number_widens_past_9999() {
        assert_eq!(format_invoice_number("INV", 10000), "INV-10000");
    }

    #[test]
    fn test_format_invoice_number_custom_prefix() {
        assert_eq!(format_invoice_number("BW", 7), "BW-0007");
    }

    #[test]
    fn test_update_request_all_fields_optional() {
        let request: UpdateSettingsRequest = serde_json::from_str("{}").unwrap();
        assert!(request.validate().is_ok());
        assert!(request.shop_name.is_none());
    }

    #[test]
    fn test_update_request_rejects_long_prefix() {
        let request = UpdateSettingsRequest {
            shop_name: None,
            address: None,
            phone: None,
            invoice_prefix: Some("VERYLONGPREFIX".to_string()),
        };
        assert!(request.validate().is_err());
    }
}
