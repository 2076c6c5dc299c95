//! Invoice entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::invoice::{
    Invoice, InvoiceItem, ItemType, PaymentMethod, PaymentStatus,
};

/// Database enum for invoice line item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "invoice_item_type", rename_all = "snake_case")]
pub enum ItemTypeDb {
    Part,
    Service,
    Labor,
    Testing,
    Other,
}

impl From<ItemType> for ItemTypeDb {
    fn from(ty: ItemType) -> Self {
        match ty {
            ItemType::Part => ItemTypeDb::Part,
            ItemType::Service => ItemTypeDb::Service,
            ItemType::Labor => ItemTypeDb::Labor,
            ItemType::Testing => ItemTypeDb::Testing,
            ItemType::Other => ItemTypeDb::Other,
        }
    }
}

impl From<ItemTypeDb> for ItemType {
    fn from(ty: ItemTypeDb) -> Self {
        match ty {
            ItemTypeDb::Part => ItemType::Part,
            ItemTypeDb::Service => ItemType::Service,
            ItemTypeDb::Labor => ItemType::Labor,
            ItemTypeDb::Testing => ItemType::Testing,
            ItemTypeDb::Other => ItemType::Other,
        }
    }
}

/// Database enum for invoice settlement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
pub enum PaymentStatusDb {
    Pending,
    PartiallyPaid,
    Paid,
    Cancelled,
}

impl From<PaymentStatus> for PaymentStatusDb {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Pending => PaymentStatusDb::Pending,
            PaymentStatus::PartiallyPaid => PaymentStatusDb::PartiallyPaid,
            PaymentStatus::Paid => PaymentStatusDb::Paid,
            PaymentStatus::Cancelled => PaymentStatusDb::Cancelled,
        }
    }
}

impl From<PaymentStatusDb> for PaymentStatus {
    fn from(status: PaymentStatusDb) -> Self {
        match status {
            PaymentStatusDb::Pending => PaymentStatus::Pending,
            PaymentStatusDb::PartiallyPaid => PaymentStatus::PartiallyPaid,
            PaymentStatusDb::Paid => PaymentStatus::Paid,
            PaymentStatusDb::Cancelled => PaymentStatus::Cancelled,
        }
    }
}

/// Database enum for payment collection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
pub enum PaymentMethodDb {
    Cash,
    Card,
    Upi,
    NetBanking,
    Cheque,
    Credit,
}

impl From<PaymentMethod> for PaymentMethodDb {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cash => PaymentMethodDb::Cash,
            PaymentMethod::Card => PaymentMethodDb::Card,
            PaymentMethod::Upi => PaymentMethodDb::Upi,
            PaymentMethod::NetBanking => PaymentMethodDb::NetBanking,
            PaymentMethod::Cheque => PaymentMethodDb::Cheque,
            PaymentMethod::Credit => PaymentMethodDb::Credit,
        }
    }
}

impl From<PaymentMethodDb> for PaymentMethod {
    fn from(method: PaymentMethodDb) -> Self {
        match method {
            PaymentMethodDb::Cash => PaymentMethod::Cash,
            PaymentMethodDb::Card => PaymentMethod::Card,
            PaymentMethodDb::Upi => PaymentMethod::Upi,
            PaymentMethodDb::NetBanking => PaymentMethod::NetBanking,
            PaymentMethodDb::Cheque => PaymentMethod::Cheque,
            PaymentMethodDb::Credit => PaymentMethod::Credit,
        }
    }
}

/// Database row mapping for the invoices table.
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceEntity {
    pub id: Uuid,
    pub invoice_number: String,
    pub battery_id: String,
    pub customer_id: Uuid,
    pub service_charges: i64,
    pub parts_total: i64,
    pub discount: i64,
    pub total_amount: i64,
    pub amount_paid: i64,
    pub payment_status: PaymentStatusDb,
    pub payment_method: Option<PaymentMethodDb>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InvoiceEntity {
    /// Assembles the domain invoice from this row plus its item rows.
    pub fn into_invoice(self, items: Vec<InvoiceItemEntity>) -> Invoice {
        Invoice {
            id: self.id,
            invoice_number: self.invoice_number,
            battery_id: self.battery_id,
            customer_id: self.customer_id,
            items: items.into_iter().map(InvoiceItem::from).collect(),
            service_charges: self.service_charges,
            parts_total: self.parts_total,
            discount: self.discount,
            total_amount: self.total_amount,
            amount_paid: self.amount_paid,
            payment_status: self.payment_status.into(),
            payment_method: self.payment_method.map(PaymentMethod::from),
            notes: self.notes,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Database row mapping for the invoice_items table.
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceItemEntity {
    pub id: i64,
    pub invoice_id: Uuid,
    pub item_type: ItemTypeDb,
    pub name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub total: i64,
}

impl From<InvoiceItemEntity> for InvoiceItem {
    fn from(entity: InvoiceItemEntity) -> Self {
        Self {
            item_type: entity.item_type.into(),
            name: entity.name,
            quantity: entity.quantity,
            unit_price: entity.unit_price,
            total: entity.total,
        }
    }
}
