// orderflow/src/workflow/placement.rs

use super::contexts::PlacementCtxData;
use super::WorkflowStage;
use crate::error::{OrderFlowError, Result};
use crate::gateway::{PaymentGateway, PaymentRequest, PaymentSettings};
use crate::models::{NewOrderItem, Order, OrderDraft};
use crate::pipeline::{ContextData, Pipeline, PipelineError, PipelineOutcome, StepControl};
use crate::store::OrderStore;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

const PIPELINE_NAME: &str = "order_placement";
const VALIDATE_STEP: &str = "validate_order_draft";
const PERSIST_STEP: &str = "persist_order";
const REQUEST_PAYMENT_STEP: &str = "request_payment";
const RECORD_TRACKING_STEP: &str = "record_tracking_reference";

/// Result handed back to the customer-facing caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedOrder {
  pub order_id: Uuid,
  pub redirect_url: String,
  pub tracking_id: String,
  /// `PaymentPending` when the tracking reference was stored, `PaymentRequested` when that write failed.
  pub stage: WorkflowStage,
  pub order: Order,
}

/// Places orders: validate, persist atomically, request payment, record the
/// gateway tracking reference.
///
/// A failure after the order is committed leaves the order in place with no
/// tracking reference; nothing is compensated or retried. Submitting the same
/// order twice is not guarded against.
pub struct OrderWorkflow {
  pipeline: Pipeline<PlacementCtxData, OrderFlowError>,
}

impl OrderWorkflow {
  pub fn new(store: Arc<dyn OrderStore>, gateway: Arc<dyn PaymentGateway>, settings: PaymentSettings) -> Self {
    let settings = Arc::new(settings);
    let mut pipeline = Pipeline::new(
      PIPELINE_NAME,
      &[
        (VALIDATE_STEP, false),
        (PERSIST_STEP, false),
        (REQUEST_PAYMENT_STEP, false),
        (RECORD_TRACKING_STEP, true),
      ],
    );

    pipeline.on_step(VALIDATE_STEP, validate_order_draft);

    let persist_store = store.clone();
    pipeline.on_step(PERSIST_STEP, move |ctx| persist_order(persist_store.clone(), ctx));

    pipeline.on_step(REQUEST_PAYMENT_STEP, move |ctx| {
      request_payment(gateway.clone(), settings.clone(), ctx)
    });

    pipeline.on_step(RECORD_TRACKING_STEP, move |ctx| record_tracking_reference(store.clone(), ctx));

    Self { pipeline }
  }

  #[instrument(name = "OrderWorkflow::place_order", skip(self, draft), fields(user_id = %draft.user_id), err)]
  pub async fn place_order(&self, draft: OrderDraft) -> Result<PlacedOrder> {
    let ctx_data = ContextData::new(PlacementCtxData::new(draft));
    let outcome = self.pipeline.run(ctx_data.clone()).await?;
    if let PipelineOutcome::Stopped { step } = outcome {
      return Err(incomplete(&step));
    }

    let data = ctx_data.into_inner();
    let (Some(order), Some(redirect)) = (data.order, data.redirect) else {
      return Err(incomplete(REQUEST_PAYMENT_STEP));
    };
    info!(
      order_id = %order.id,
      tracking_id = %redirect.tracking_id,
      stage = ?data.stage,
      "Order placed; customer redirected to payment."
    );
    Ok(PlacedOrder {
      order_id: order.id,
      redirect_url: redirect.redirect_url,
      tracking_id: redirect.tracking_id,
      stage: data.stage,
      order,
    })
  }
}

fn incomplete(step: &str) -> OrderFlowError {
  OrderFlowError::Workflow(PipelineError::Incomplete {
    pipeline: PIPELINE_NAME.to_string(),
    step: step.to_string(),
  })
}

async fn validate_order_draft(ctx: ContextData<PlacementCtxData>) -> Result<StepControl> {
  let draft = ctx.with(|d| d.draft.clone()).normalized();
  draft.validate()?;

  let items_subtotal: Decimal = draft.order_items.iter().map(NewOrderItem::line_total).sum();
  if items_subtotal != draft.total {
    info!(total = %draft.total, items_subtotal = %items_subtotal, "Order total differs from item subtotal.");
  }

  ctx.write().draft = draft;
  Ok(StepControl::Continue)
}

async fn persist_order(store: Arc<dyn OrderStore>, ctx: ContextData<PlacementCtxData>) -> Result<StepControl> {
  let draft = ctx.with(|d| d.draft.clone());
  let order = store.create_order(&draft).await?;
  info!(order_id = %order.id, items = order.order_items.len(), total = %order.total, "Order persisted.");

  let mut guard = ctx.write();
  guard.order = Some(order);
  guard.stage = WorkflowStage::Persisted;
  Ok(StepControl::Continue)
}

async fn request_payment(
  gateway: Arc<dyn PaymentGateway>,
  settings: Arc<PaymentSettings>,
  ctx: ContextData<PlacementCtxData>,
) -> Result<StepControl> {
  let order = ctx
    .with(|d| d.order.clone())
    .ok_or_else(|| incomplete(PERSIST_STEP))?;

  // The amount comes from the stored order, never from the request body.
  let request = PaymentRequest::for_order(&order, &settings);

  let token = gateway.request_access_token().await.map_err(|e| {
    error!(order_id = %order.id, error = %e, "Payment authentication failed; order left without tracking reference.");
    e
  })?;
  let redirect = gateway.submit_payment_request(&token, &request).await.map_err(|e| {
    error!(order_id = %order.id, error = %e, "Failed to initiate payment; order left without tracking reference.");
    e
  })?;

  let mut guard = ctx.write();
  guard.redirect = Some(redirect);
  guard.stage = WorkflowStage::PaymentRequested;
  Ok(StepControl::Continue)
}

async fn record_tracking_reference(
  store: Arc<dyn OrderStore>,
  ctx: ContextData<PlacementCtxData>,
) -> Result<StepControl> {
  let (order_id, tracking_id) = ctx.with(|d| {
    (
      d.order.as_ref().map(|o| o.id),
      d.redirect.as_ref().map(|r| r.tracking_id.clone()),
    )
  });
  let (Some(order_id), Some(tracking_id)) = (order_id, tracking_id) else {
    return Err(incomplete(REQUEST_PAYMENT_STEP));
  };

  match store.set_tracking_reference(order_id, &tracking_id).await {
    Ok(true) => {
      let mut guard = ctx.write();
      if let Some(order) = guard.order.as_mut() {
        order.tracking_id = Some(tracking_id);
      }
      guard.stage = WorkflowStage::PaymentPending;
      Ok(StepControl::Continue)
    }
    Ok(false) => {
      warn!(order_id = %order_id, tracking_id = %tracking_id, "Order already carries a tracking reference; left unchanged.");
      Ok(StepControl::Continue)
    }
    Err(e) => {
      // The gateway already holds the payment; the caller still gets the redirect.
      error!(
        order_id = %order_id,
        tracking_id = %tracking_id,
        error = %e,
        "Order created, but tracking reference not saved."
      );
      Err(e)
    }
  }
}
