// orderflow/src/workflow/contexts.rs

//! Data carried through the workflow pipelines, wrapped in `ContextData` at run time.

use super::notification::PaymentNotification;
use super::WorkflowStage;
use crate::gateway::{PaymentRedirect, PaymentStatusReport};
use crate::models::{Order, OrderDraft};

#[derive(Debug, Clone)]
pub struct PlacementCtxData {
  pub draft: OrderDraft,
  pub stage: WorkflowStage,
  /// Set once the order is committed.
  pub order: Option<Order>,
  /// Set once the gateway accepts the payment request.
  pub redirect: Option<PaymentRedirect>,
}

impl PlacementCtxData {
  pub fn new(draft: OrderDraft) -> Self {
    Self {
      draft,
      stage: WorkflowStage::Draft,
      order: None,
      redirect: None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct NotificationCtxData {
  pub notification: PaymentNotification,
  pub report: Option<PaymentStatusReport>,
  pub rows_updated: u64,
}

impl NotificationCtxData {
  pub fn new(notification: PaymentNotification) -> Self {
    Self {
      notification,
      report: None,
      rows_updated: 0,
    }
  }
}
