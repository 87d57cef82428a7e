// orderflow/src/workflow/notification.rs

use super::contexts::NotificationCtxData;
use super::WorkflowStage;
use crate::error::{OrderFlowError, Result};
use crate::gateway::PaymentGateway;
use crate::pipeline::{ContextData, Pipeline, PipelineError, PipelineOutcome, StepControl};
use crate::store::OrderStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

const PIPELINE_NAME: &str = "payment_notification";
const VALIDATE_STEP: &str = "validate_notification";
const QUERY_STEP: &str = "query_payment_status";
const APPLY_STEP: &str = "apply_payment_status";

/// Notification type echoed back in every acknowledgement.
pub const IPN_CHANGE: &str = "IPNCHANGE";

/// An inbound payment notification as delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentNotification {
  #[serde(rename = "OrderTrackingId", default)]
  pub tracking_id: String,
  #[serde(rename = "OrderMerchantReference", default)]
  pub merchant_reference: String,
  #[serde(rename = "OrderNotificationType", default)]
  pub notification_type: Option<String>,
}

impl PaymentNotification {
  pub fn new(tracking_id: impl Into<String>, merchant_reference: impl Into<String>) -> Self {
    Self {
      tracking_id: tracking_id.into(),
      merchant_reference: merchant_reference.into(),
      notification_type: None,
    }
  }
}

/// Fixed acknowledgement body the gateway expects from the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationAck {
  pub order_notification_type: String,
  pub order_tracking_id: String,
  pub order_merchant_reference: String,
  pub status: u16,
}

impl NotificationAck {
  fn for_notification(notification: &PaymentNotification) -> Self {
    Self {
      order_notification_type: IPN_CHANGE.to_string(),
      order_tracking_id: notification.tracking_id.clone(),
      order_merchant_reference: notification.merchant_reference.clone(),
      status: 200,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationOutcome {
  pub ack: NotificationAck,
  /// Status description returned by the gateway.
  pub reported_status: String,
  /// Rows changed locally. Zero when the reference is unknown, the order is
  /// already terminal, or the local write failed.
  pub rows_updated: u64,
  pub stage: WorkflowStage,
}

/// Reconciles the stored payment status with the gateway after a webhook.
///
/// Only a failure to reach the gateway is reported as an error, so the
/// gateway redelivers. Local update problems are logged and acknowledged.
pub struct NotificationHandler {
  pipeline: Pipeline<NotificationCtxData, OrderFlowError>,
}

impl NotificationHandler {
  pub fn new(store: Arc<dyn OrderStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
    let mut pipeline = Pipeline::new(
      PIPELINE_NAME,
      &[(VALIDATE_STEP, false), (QUERY_STEP, false), (APPLY_STEP, true)],
    );

    pipeline.on_step(VALIDATE_STEP, validate_notification);
    pipeline.on_step(QUERY_STEP, move |ctx| query_payment_status(gateway.clone(), ctx));
    pipeline.on_step(APPLY_STEP, move |ctx| apply_payment_status(store.clone(), ctx));

    Self { pipeline }
  }

  #[instrument(
    name = "NotificationHandler::handle",
    skip(self, notification),
    fields(tracking_id = %notification.tracking_id, merchant_reference = %notification.merchant_reference),
    err
  )]
  pub async fn handle(&self, notification: PaymentNotification) -> Result<NotificationOutcome> {
    let ctx_data = ContextData::new(NotificationCtxData::new(notification));
    let outcome = self.pipeline.run(ctx_data.clone()).await?;
    if let PipelineOutcome::Stopped { step } = outcome {
      return Err(incomplete(&step));
    }

    let data = ctx_data.into_inner();
    let Some(report) = data.report else {
      return Err(incomplete(QUERY_STEP));
    };
    Ok(NotificationOutcome {
      ack: NotificationAck::for_notification(&data.notification),
      stage: WorkflowStage::from_payment_status(&report.status_description),
      reported_status: report.status_description,
      rows_updated: data.rows_updated,
    })
  }
}

fn incomplete(step: &str) -> OrderFlowError {
  OrderFlowError::Workflow(PipelineError::Incomplete {
    pipeline: PIPELINE_NAME.to_string(),
    step: step.to_string(),
  })
}

async fn validate_notification(ctx: ContextData<NotificationCtxData>) -> Result<StepControl> {
  let mut guard = ctx.write();
  let n = &mut guard.notification;
  n.tracking_id = n.tracking_id.trim().to_string();
  n.merchant_reference = n.merchant_reference.trim().to_string();
  if n.tracking_id.is_empty() || n.merchant_reference.is_empty() {
    return Err(OrderFlowError::Validation(
      "OrderTrackingId and OrderMerchantReference are required".to_string(),
    ));
  }
  Ok(StepControl::Continue)
}

async fn query_payment_status(
  gateway: Arc<dyn PaymentGateway>,
  ctx: ContextData<NotificationCtxData>,
) -> Result<StepControl> {
  let tracking_id = ctx.with(|d| d.notification.tracking_id.clone());

  // Tokens are short-lived; a fresh one is requested for every notification.
  let token = gateway.request_access_token().await?;
  let report = gateway.query_payment_status(&token, &tracking_id).await?;
  info!(tracking_id = %tracking_id, status = %report.status_description, "Gateway reported payment status.");

  ctx.write().report = Some(report);
  Ok(StepControl::Continue)
}

async fn apply_payment_status(
  store: Arc<dyn OrderStore>,
  ctx: ContextData<NotificationCtxData>,
) -> Result<StepControl> {
  let (notification, report) = ctx.with(|d| (d.notification.clone(), d.report.clone()));
  let Some(report) = report else {
    return Err(incomplete(QUERY_STEP));
  };

  if let Some(reported_reference) = report.merchant_reference.as_deref() {
    if !reported_reference.eq_ignore_ascii_case(&notification.merchant_reference) {
      warn!(
        notified = %notification.merchant_reference,
        reported = %reported_reference,
        "Merchant reference in notification differs from the gateway's."
      );
    }
  }

  match store
    .update_payment_status(&notification.tracking_id, &report.status_description)
    .await
  {
    Ok(0) => {
      info!(tracking_id = %notification.tracking_id, "No order updated for tracking reference.");
      Ok(StepControl::Continue)
    }
    Ok(rows) => {
      ctx.write().rows_updated = rows;
      info!(tracking_id = %notification.tracking_id, rows, status = %report.status_description, "Payment status updated.");
      Ok(StepControl::Continue)
    }
    Err(e) => {
      error!(tracking_id = %notification.tracking_id, error = %e, "Failed to update payment status; acknowledging anyway.");
      Err(e)
    }
  }
}
