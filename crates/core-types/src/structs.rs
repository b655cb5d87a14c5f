use crate::enums::{OrderStatus, PaymentStatus};
use crate::error::CoreError;
use crate::settings::StoreSettings;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::num::NonZeroU32;
use uuid::Uuid;

/// A single product line within an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: Uuid,
    /// Zero is rejected on deserialization as well.
    pub quantity: NonZeroU32,
    /// Unit price charged for this line.
    pub price: Decimal,
    pub sub_product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
}

impl LineItem {
    /// Creates a line item, rejecting a zero quantity.
    pub fn new(
        product_id: Uuid,
        quantity: u32,
        price: Decimal,
        sub_product_name: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let quantity = NonZeroU32::new(quantity).ok_or_else(|| {
            CoreError::InvalidInput("quantity".to_string(), "must be at least 1".to_string())
        })?;
        Ok(Self {
            product_id,
            quantity,
            price,
            sub_product_name: sub_product_name.into(),
            metadata: None,
        })
    }

    /// `price × quantity` for this line, or `None` on overflow.
    pub fn subtotal(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity.get()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub provider: String,
    pub transaction_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub payment_id: String,
}

/// A completed or in-flight transaction placed by a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub reseller_id: Option<Uuid>,
    pub items: Vec<LineItem>,
    /// Total charged to the customer.
    pub total: Decimal,
    /// Cost basis of the order.
    pub cost: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment: Option<PaymentDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// `total − cost`, or `None` on overflow.
    pub fn profit(&self) -> Option<Decimal> {
        self.total.checked_sub(self.cost)
    }

    pub fn is_completed(&self) -> bool {
        self.status == OrderStatus::Completed
    }
}

/// A catalog entry, joined by id when ranking products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
}

/// A reseller's storefront and its configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: Uuid,
    #[serde(rename = "reseller")]
    pub reseller_id: Uuid,
    pub name: String,
    pub settings: StoreSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
