//! Invoice domain model.
//!
//! All monetary values are integer paise. Totals are computed from the line
//! items rather than trusted from the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Kind of a single invoice line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Part,
    Service,
    Labor,
    Testing,
    Other,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Part => "part",
            ItemType::Service => "service",
            ItemType::Labor => "labor",
            ItemType::Testing => "testing",
            ItemType::Other => "other",
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "part" => Ok(ItemType::Part),
            "service" => Ok(ItemType::Service),
            "labor" => Ok(ItemType::Labor),
            "testing" => Ok(ItemType::Testing),
            "other" => Ok(ItemType::Other),
            other => Err(format!("Unknown item type: {}", other)),
        }
    }
}

/// Settlement state of an invoice, derived from amount paid versus total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    PartiallyPaid,
    Paid,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::PartiallyPaid => "partially_paid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "partially_paid" => Ok(PaymentStatus::PartiallyPaid),
            "paid" => Ok(PaymentStatus::Paid),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            other => Err(format!("Unknown payment status: {}", other)),
        }
    }
}

/// How a payment was collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    NetBanking,
    Cheque,
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::NetBanking => "net_banking",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Credit => "credit",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            "net_banking" => Ok(PaymentMethod::NetBanking),
            "cheque" => Ok(PaymentMethod::Cheque),
            "credit" => Ok(PaymentMethod::Credit),
            other => Err(format!("Unknown payment method: {}", other)),
        }
    }
}

/// One line on an invoice. `total` is always `quantity * unit_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub item_type: ItemType,
    pub name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub battery_id: String,
    pub customer_id: Uuid,
    pub items: Vec<InvoiceItem>,
    pub service_charges: i64,
    pub parts_total: i64,
    pub discount: i64,
    pub total_amount: i64,
    pub amount_paid: i64,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item as submitted by the client. Totals are recomputed server-side.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemRequest {
    pub item_type: ItemType,

    #[validate(length(min = 1, max = 100, message = "Item name must be 1-100 characters"))]
    pub name: String,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,

    #[validate(custom(function = "shared::validation::validate_amount"))]
    pub unit_price: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, max = 32, message = "Battery id must be 1-32 characters"))]
    pub battery_id: String,

    #[validate(nested)]
    #[validate(length(min = 1, message = "Invoice must have at least one item"))]
    pub items: Vec<InvoiceItemRequest>,

    #[validate(custom(function = "shared::validation::validate_amount"))]
    #[serde(default)]
    pub service_charges: i64,

    #[validate(custom(function = "shared::validation::validate_amount"))]
    #[serde(default)]
    pub discount: i64,

    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    #[validate(range(min = 1, message = "Payment amount must be positive"))]
    pub amount: i64,

    pub payment_method: PaymentMethod,
}

/// Materializes submitted line items, computing each line total.
pub fn build_items(requests: &[InvoiceItemRequest]) -> Vec<InvoiceItem> {
    requests
        .iter()
        .map(|item| InvoiceItem {
            item_type: item.item_type,
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            total: i64::from(item.quantity) * item.unit_price,
        })
        .collect()
}

/// Sum of line totals for `Part` items only.
pub fn parts_total(items: &[InvoiceItem]) -> i64 {
    items
        .iter()
        .filter(|item| item.item_type == ItemType::Part)
        .map(|item| item.total)
        .sum()
}

/// Grand total: parts plus service charges plus all non-part line items,
/// minus the discount. Clamped at zero so an oversized discount cannot
/// produce a negative invoice.
pub fn total_amount(items: &[InvoiceItem], service_charges: i64, discount: i64) -> i64 {
    let non_parts: i64 = items
        .iter()
        .filter(|item| item.item_type != ItemType::Part)
        .map(|item| item.total)
        .sum();
    (parts_total(items) + service_charges + non_parts - discount).max(0)
}

/// Derives the settlement state from the running paid amount.
pub fn derive_payment_status(amount_paid: i64, total_amount: i64) -> PaymentStatus {
    if amount_paid <= 0 {
        PaymentStatus::Pending
    } else if amount_paid < total_amount {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::Paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(item_type: ItemType, quantity: i32, unit_price: i64) -> InvoiceItem {
        InvoiceItem {
            item_type,
            name: "item".to_string(),
            quantity,
            unit_price,
            total: i64::from(quantity) * unit_price,
        }
    }

    #[test]
    fn test_item_type_round_trip() {
        for ty in [
            ItemType::Part,
            ItemType::Service,
            ItemType::Labor,
            ItemType::Testing,
            ItemType::Other,
        ] {
            assert_eq!(ItemType::from_str(ty.as_str()).unwrap(), ty);
        }
    }

    #[test]
    fn test_payment_status_round_trip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::PartiallyPaid,
            PaymentStatus::Paid,
            PaymentStatus::Cancelled,
        ] {
            assert_eq!(PaymentStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_payment_method_round_trip() {
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::Card,
            PaymentMethod::Upi,
            PaymentMethod::NetBanking,
            PaymentMethod::Cheque,
            PaymentMethod::Credit,
        ] {
            assert_eq!(PaymentMethod::from_str(method.as_str()).unwrap(), method);
        }
    }

    #[test]
    fn test_build_items_computes_line_totals() {
        let requests = vec![InvoiceItemRequest {
            item_type: ItemType::Part,
            name: "Cell bank".to_string(),
            quantity: 3,
            unit_price: 45000,
        }];
        let items = build_items(&requests);
        assert_eq!(items[0].total, 135000);
    }

    #[test]
    fn test_parts_total_only_counts_parts() {
        let items = vec![
            item(ItemType::Part, 2, 50000),
            item(ItemType::Labor, 1, 30000),
            item(ItemType::Part, 1, 20000),
        ];
        assert_eq!(parts_total(&items), 120000);
    }

    #[test]
    fn test_total_amount_formula() {
        // parts 120000 + service 25000 + labor 30000 - discount 5000
        let items = vec![
            item(ItemType::Part, 2, 50000),
            item(ItemType::Labor, 1, 30000),
            item(ItemType::Part, 1, 20000),
        ];
        assert_eq!(total_amount(&items, 25000, 5000), 170000);
    }

    #[test]
    fn test_total_amount_clamps_at_zero() {
        let items = vec![item(ItemType::Service, 1, 10000)];
        assert_eq!(total_amount(&items, 0, 99999), 0);
    }

    #[test]
    fn test_derive_payment_status() {
        assert_eq!(derive_payment_status(0, 100000), PaymentStatus::Pending);
        assert_eq!(
            derive_payment_status(50000, 100000),
            PaymentStatus::PartiallyPaid
        );
        assert_eq!(derive_payment_status(100000, 100000), PaymentStatus::Paid);
        assert_eq!(derive_payment_status(150000, 100000), PaymentStatus::Paid);
    }

    #[test]
    fn test_create_request_rejects_empty_items() {
        let request = CreateInvoiceRequest {
            battery_id: "BAT1700000000001234".to_string(),
            items: vec![],
            service_charges: 0,
            discount: 0,
            notes: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_negative_unit_price() {
        let request = CreateInvoiceRequest {
            battery_id: "BAT1700000000001234".to_string(),
            items: vec![InvoiceItemRequest {
                item_type: ItemType::Part,
                name: "Plate set".to_string(),
                quantity: 1,
                unit_price: -100,
            }],
            service_charges: 0,
            discount: 0,
            notes: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_record_payment_request_deserializes_camel_case() {
        let body = r#"{"amount":50000,"paymentMethod":"upi"}"#;
        let request: RecordPaymentRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.amount, 50000);
        assert_eq!(request.payment_method, PaymentMethod::Upi);
    }
}
