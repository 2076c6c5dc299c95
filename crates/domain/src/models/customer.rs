//! Customer domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Commercial classification of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    Individual,
    Business,
    Dealer,
    Wholesale,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Individual => "individual",
            CustomerType::Business => "business",
            CustomerType::Dealer => "dealer",
            CustomerType::Wholesale => "wholesale",
        }
    }
}

impl Default for CustomerType {
    fn default() -> Self {
        CustomerType::Individual
    }
}

impl std::fmt::Display for CustomerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CustomerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "individual" => Ok(CustomerType::Individual),
            "business" => Ok(CustomerType::Business),
            "dealer" => Ok(CustomerType::Dealer),
            "wholesale" => Ok(CustomerType::Wholesale),
            other => Err(format!("Unknown customer type: {}", other)),
        }
    }
}

/// A customer of the shop. Batteries reference customers by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub gst_number: Option<String>,
    pub customer_type: CustomerType,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating a customer.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 200, message = "Address must be at most 200 characters"))]
    pub address: Option<String>,

    #[validate(length(max = 50, message = "City must be at most 50 characters"))]
    pub city: Option<String>,

    #[validate(custom(function = "shared::validation::validate_gstin"))]
    pub gst_number: Option<String>,

    #[serde(default)]
    pub customer_type: CustomerType,

    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// Request payload for updating a customer. Absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 200, message = "Address must be at most 200 characters"))]
    pub address: Option<String>,

    #[validate(length(max = 50, message = "City must be at most 50 characters"))]
    pub city: Option<String>,

    #[validate(custom(function = "shared::validation::validate_gstin"))]
    pub gst_number: Option<String>,

    pub customer_type: Option<CustomerType>,

    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::name::en::Name;
    use fake::Fake;
    use std::str::FromStr;

    fn sample_request() -> CreateCustomerRequest {
        CreateCustomerRequest {
            name: Name().fake(),
            phone: "9876543210".to_string(),
            email: None,
            address: None,
            city: None,
            gst_number: None,
            customer_type: CustomerType::Individual,
            notes: None,
        }
    }

    #[test]
    fn test_customer_type_round_trip() {
        for ty in [
            CustomerType::Individual,
            CustomerType::Business,
            CustomerType::Dealer,
            CustomerType::Wholesale,
        ] {
            assert_eq!(CustomerType::from_str(ty.as_str()).unwrap(), ty);
        }
    }

    #[test]
    fn test_customer_type_default() {
        assert_eq!(CustomerType::default(), CustomerType::Individual);
    }

    #[test]
    fn test_create_request_valid() {
        assert!(sample_request().validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_bad_phone() {
        let mut request = sample_request();
        request.phone = "98-76".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_bad_email() {
        let mut request = sample_request();
        request.email = Some("not-an-email".to_string());
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_bad_gstin() {
        let mut request = sample_request();
        request.gst_number = Some("12345".to_string());
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_accepts_valid_gstin() {
        let mut request = sample_request();
        request.gst_number = Some("27AAPFU0939F1ZV".to_string());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_request_customer_type_defaults_in_json() {
        let body = r#"{"name":"Mahesh Traders","phone":"9876543210"}"#;
        let request: CreateCustomerRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.customer_type, CustomerType::Individual);
    }
}
