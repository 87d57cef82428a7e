// orderflow/src/models/mod.rs

//! Order and order-item entities.

pub mod order;
pub mod order_item;

pub use order::{
  is_terminal_payment_status, Order, OrderDraft, OrderStatus, PAYMENT_STATUS_PENDING, TERMINAL_PAYMENT_STATUSES,
};
pub use order_item::{NewOrderItem, OrderItem};
