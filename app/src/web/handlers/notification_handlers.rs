// orderflow_server/src/web/handlers/notification_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use orderflow::PaymentNotification;
use tracing::{info, instrument, warn};

use crate::errors::{AppError, Result};
use crate::state::AppState;

/// Payment webhook. The JSON body is the primary source; the query string is
/// used when there is no body (GET, or a POST without one).
#[instrument(
  name = "handler::payment_notification",
  skip(app_state, req, body),
  fields(method = %req.method(), body_len = body.len())
)]
pub async fn payment_notification_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse> {
  let notification = if body.iter().all(u8::is_ascii_whitespace) {
    web::Query::<PaymentNotification>::from_query(req.query_string())
      .map_err(|e| {
        warn!(error = %e, "Unparsable notification query string.");
        AppError::BadRequest("Invalid query parameters".to_string())
      })?
      .into_inner()
  } else {
    serde_json::from_slice::<PaymentNotification>(&body).map_err(|e| {
      warn!(error = %e, "Unparsable notification body.");
      AppError::BadRequest("Invalid JSON".to_string())
    })?
  };
  info!(
    tracking_id = %notification.tracking_id,
    merchant_reference = %notification.merchant_reference,
    notification_type = ?notification.notification_type,
    "Payment notification received."
  );

  let outcome = app_state.notifications.handle(notification).await?;
  info!(
    reported_status = %outcome.reported_status,
    rows_updated = outcome.rows_updated,
    stage = ?outcome.stage,
    "Payment notification acknowledged."
  );
  Ok(HttpResponse::Ok().json(outcome.ack))
}
