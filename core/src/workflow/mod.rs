// orderflow/src/workflow/mod.rs

//! The order placement and payment-confirmation workflows, each expressed as
//! a [`Pipeline`](crate::pipeline::Pipeline) over its own context.
//!
//! An order moves through
//! `Draft -> Persisted -> PaymentRequested -> PaymentPending -> {PaymentConfirmed | PaymentFailed}`.
//! [`OrderWorkflow`] drives it as far as `PaymentPending`; only
//! [`NotificationHandler`] moves it further.

pub mod contexts;
pub mod notification;
pub mod placement;

pub use notification::{NotificationAck, NotificationHandler, NotificationOutcome, PaymentNotification};
pub use placement::{OrderWorkflow, PlacedOrder};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkflowStage {
  Draft,
  Persisted,
  PaymentRequested,
  PaymentPending,
  PaymentConfirmed,
  PaymentFailed,
}

impl WorkflowStage {
  /// Stage implied by a gateway payment status description. Only statuses
  /// the store freezes count as final; `INVALID` and anything unknown stay pending.
  pub fn from_payment_status(status: &str) -> Self {
    match status.trim().to_ascii_uppercase().as_str() {
      "COMPLETED" => WorkflowStage::PaymentConfirmed,
      "FAILED" | "REVERSED" => WorkflowStage::PaymentFailed,
      _ => WorkflowStage::PaymentPending,
    }
  }
}
