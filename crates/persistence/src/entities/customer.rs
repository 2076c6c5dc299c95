//! Customer entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::customer::{Customer, CustomerType};

/// Database enum for customer classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "customer_type", rename_all = "snake_case")]
pub enum CustomerTypeDb {
    Individual,
    Business,
    Dealer,
    Wholesale,
}

impl From<CustomerType> for CustomerTypeDb {
    fn from(ty: CustomerType) -> Self {
        match ty {
            CustomerType::Individual => CustomerTypeDb::Individual,
            CustomerType::Business => CustomerTypeDb::Business,
            CustomerType::Dealer => CustomerTypeDb::Dealer,
            CustomerType::Wholesale => CustomerTypeDb::Wholesale,
        }
    }
}

impl From<CustomerTypeDb> for CustomerType {
    fn from(ty: CustomerTypeDb) -> Self {
        match ty {
            CustomerTypeDb::Individual => CustomerType::Individual,
            CustomerTypeDb::Business => CustomerType::Business,
            CustomerTypeDb::Dealer => CustomerType::Dealer,
            CustomerTypeDb::Wholesale => CustomerType::Wholesale,
        }
    }
}

/// Database row mapping for the customers table.
#[derive(Debug, Clone, FromRow)]
pub struct CustomerEntity {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub gst_number: Option<String>,
    pub customer_type: CustomerTypeDb,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CustomerEntity> for Customer {
    fn from(entity: CustomerEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            phone: entity.phone,
            email: entity.email,
            address: entity.address,
            city: entity.city,
            gst_number: entity.gst_number,
            customer_type: entity.customer_type.into(),
            notes: entity.notes,
            is_active: entity.is_active,
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_entity_to_domain() {
        let entity = CustomerEntity {
            id: Uuid::new_v4(),
            name: "Mahesh Traders".to_string(),
            phone: "9876543210".to_string(),
            email: Some("accounts@maheshtraders.in".to_string()),
            address: None,
            city: Some("Pune".to_string()),
            gst_number: Some("27AAPFU0939F1ZV".to_string()),
            customer_type: CustomerTypeDb::Business,
            notes: None,
            is_active: true,
            created_by: Some(Uuid::new_v4()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let customer: Customer = entity.clone().into();
        assert_eq!(customer.id, entity.id);
        assert_eq!(customer.name, entity.name);
        assert_eq!(customer.customer_type, CustomerType::Business);
        assert_eq!(customer.gst_number, entity.gst_number);
    }

    #[test]
    fn test_customer_type_db_round_trip() {
        for ty in [
            CustomerType::Individual,
            CustomerType::Business,
            CustomerType::Dealer,
            CustomerType::Wholesale,
        ] {
            let db: CustomerTypeDb = ty.into();
            let back: CustomerType = db.into();
            assert_eq!(back, ty);
        }
    }
}
