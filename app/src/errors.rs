// orderflow_server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use orderflow::OrderFlowError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Domain(#[from] OrderFlowError),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  /// Malformed request: unparsable body, path or query.
  #[error("Bad Request: {0}")]
  BadRequest(String),

  #[error("Configuration Error: {0}")]
  Config(String),
}

impl AppError {
  /// Message returned to the client. Server-side failures get a fixed text;
  /// their detail only goes to the log.
  fn client_message(&self) -> String {
    match self {
      AppError::Domain(OrderFlowError::Validation(m))
      | AppError::Domain(OrderFlowError::NotFound(m))
      | AppError::Auth(m)
      | AppError::Forbidden(m)
      | AppError::BadRequest(m) => m.clone(),
      AppError::Domain(OrderFlowError::Persistence(_)) => "Database operation failed.".to_string(),
      AppError::Domain(OrderFlowError::Gateway(_)) => "Payment gateway request failed.".to_string(),
      AppError::Domain(OrderFlowError::Workflow(_)) => "Order processing failed.".to_string(),
      AppError::Domain(OrderFlowError::Config(_)) | AppError::Config(_) => "Configuration issue.".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Domain(OrderFlowError::Validation(_)) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::Domain(OrderFlowError::NotFound(_)) => StatusCode::NOT_FOUND,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::Domain(OrderFlowError::Gateway(_)) => StatusCode::BAD_GATEWAY,
      AppError::Domain(OrderFlowError::Persistence(_))
      | AppError::Domain(OrderFlowError::Workflow(_))
      | AppError::Domain(OrderFlowError::Config(_))
      | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, status = status.as_u16(), "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Rejecting request");
    }
    HttpResponse::build(status).json(json!({ "message": self.client_message() }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
