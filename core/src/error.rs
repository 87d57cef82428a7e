// orderflow/src/error.rs

use crate::pipeline::PipelineError;
use thiserror::Error;

/// Failure of a call to the payment gateway. Every call is a single attempt;
/// none of these are retried.
#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("Gateway consumer credentials are not configured")]
  MissingCredentials,

  #[error("Gateway request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Gateway responded with status {status}: {body}")]
  Status { status: u16, body: String },

  #[error("Gateway response could not be decoded: {0}")]
  Decode(String),

  #[error("Gateway rejected the request: {0}")]
  Rejected(String),

  #[error("Gateway response is missing `{0}`")]
  MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum OrderFlowError {
  /// Client input rejected before any side effect.
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  /// Transaction or write failure; the transaction has been rolled back.
  #[error("Database Error: {0}")]
  Persistence(#[from] sqlx::Error),

  /// External dependency failure. Local state is whatever was committed before the call.
  #[error("Payment Gateway Error: {0}")]
  Gateway(#[from] GatewayError),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Workflow Error: {0}")]
  Workflow(#[from] PipelineError),
}

pub type Result<T, E = OrderFlowError> = std::result::Result<T, E>;
