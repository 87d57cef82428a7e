// orderflow/src/models/order_item.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A purchased line. Name and price are snapshots taken at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub name: String,
  pub price: Decimal,
  pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
  pub product_id: Uuid,
  pub name: String,
  pub price: Decimal,
  pub quantity: i32,
}

impl NewOrderItem {
  pub(crate) fn validate(&self) -> Result<(), String> {
    if self.name.trim().is_empty() {
      return Err("'name' must not be empty".to_string());
    }
    if self.quantity <= 0 {
      return Err("'quantity' must be positive".to_string());
    }
    if self.price.is_sign_negative() {
      return Err("'price' must not be negative".to_string());
    }
    Ok(())
  }

  /// Line total, price times quantity.
  pub fn line_total(&self) -> Decimal {
    self.price * Decimal::from(self.quantity)
  }
}
