// orderflow/src/models/order.rs

use crate::error::{OrderFlowError, Result};
use crate::models::order_item::{NewOrderItem, OrderItem};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type as SqlxType;
use uuid::Uuid;

/// Payment status written when an order is created and again when the
/// gateway accepts it.
pub const PAYMENT_STATUS_PENDING: &str = "PENDING";

/// Gateway payment states after which the stored payment status is frozen.
pub const TERMINAL_PAYMENT_STATUSES: [&str; 3] = ["COMPLETED", "FAILED", "REVERSED"];

/// Number of fraction digits money is stored with.
pub const MONEY_SCALE: u32 = 2;

/// Fulfillment status, set by administrators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status", rename_all = "PascalCase")]
pub enum OrderStatus {
  #[default]
  Pending,
  Processing,
  Completed,
  Cancelled,
}

impl std::fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      OrderStatus::Pending => "Pending",
      OrderStatus::Processing => "Processing",
      OrderStatus::Completed => "Completed",
      OrderStatus::Cancelled => "Cancelled",
    };
    f.write_str(s)
  }
}

/// Whether `status` is a gateway state the stored payment status must not move away from.
pub fn is_terminal_payment_status(status: &str) -> bool {
  TERMINAL_PAYMENT_STATUSES
    .iter()
    .any(|terminal| terminal.eq_ignore_ascii_case(status.trim()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub phone: String,
  pub delivery_location: String,
  pub total: Decimal,
  pub status: OrderStatus,
  pub payment_status: String,
  /// Gateway tracking reference; unset until the gateway accepts the order.
  pub tracking_id: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub order_items: Vec<OrderItem>,
}

impl Order {
  /// Reference this system gives the gateway for the order.
  pub fn merchant_reference(&self) -> String {
    format!("ORDER-{}", self.id)
  }
}

/// An order as submitted by a customer, before anything is persisted.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
  pub user_id: Uuid,
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub phone: String,
  pub delivery_location: String,
  pub total: Decimal,
  pub order_items: Vec<NewOrderItem>,
}

impl OrderDraft {
  /// Checks the draft can be persisted: contact fields present, money
  /// non-negative, at least one item, every quantity positive.
  pub fn validate(&self) -> Result<()> {
    let contact_fields = [
      ("firstName", &self.first_name),
      ("lastName", &self.last_name),
      ("email", &self.email),
      ("phone", &self.phone),
      ("deliveryLocation", &self.delivery_location),
    ];
    for (field, value) in contact_fields {
      if value.trim().is_empty() {
        return Err(OrderFlowError::Validation(format!("'{}' must not be empty", field)));
      }
    }
    if self.total.is_sign_negative() {
      return Err(OrderFlowError::Validation("'total' must not be negative".to_string()));
    }
    if self.order_items.is_empty() {
      return Err(OrderFlowError::Validation(
        "an order needs at least one item".to_string(),
      ));
    }
    for (idx, item) in self.order_items.iter().enumerate() {
      item
        .validate()
        .map_err(|reason| OrderFlowError::Validation(format!("orderItems[{}]: {}", idx, reason)))?;
    }
    Ok(())
  }

  /// Trims text fields and rounds money to the stored scale.
  pub fn normalized(mut self) -> Self {
    for field in [
      &mut self.first_name,
      &mut self.last_name,
      &mut self.email,
      &mut self.phone,
      &mut self.delivery_location,
    ] {
      *field = field.trim().to_string();
    }
    self.total = self.total.round_dp(MONEY_SCALE);
    for item in &mut self.order_items {
      item.name = item.name.trim().to_string();
      item.price = item.price.round_dp(MONEY_SCALE);
    }
    self
  }
}
