// orderflow/src/gateway/mod.rs

//! Payment gateway seam: the [`PaymentGateway`] trait, the domain-side
//! request/response types, and the Pesapal implementation.

pub mod pesapal;

pub use pesapal::{PesapalClient, PesapalConfig};

use crate::error::GatewayError;
use crate::models::Order;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::fmt;

/// Three single-attempt calls to the gateway. Implementations must not retry.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
  /// Exchanges the configured consumer credentials for a short-lived bearer token.
  async fn request_access_token(&self) -> Result<AccessToken, GatewayError>;

  /// Submits a payment and returns where to send the customer plus the gateway's tracking reference.
  async fn submit_payment_request(
    &self,
    token: &AccessToken,
    request: &PaymentRequest,
  ) -> Result<PaymentRedirect, GatewayError>;

  /// Fetches the current status of a previously submitted payment.
  async fn query_payment_status(
    &self,
    token: &AccessToken,
    tracking_id: &str,
  ) -> Result<PaymentStatusReport, GatewayError>;
}

/// Bearer credential. The token value is kept out of `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
  pub token: String,
  pub expires_at: Option<String>,
}

impl AccessToken {
  pub fn new(token: impl Into<String>) -> Self {
    Self {
      token: token.into(),
      expires_at: None,
    }
  }
}

impl fmt::Debug for AccessToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AccessToken")
      .field("token", &"[REDACTED]")
      .field("expires_at", &self.expires_at)
      .finish()
  }
}

/// Merchant-side payment settings that do not vary per order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSettings {
  pub currency: String,
  pub country_code: String,
  pub callback_url: String,
  /// Identifier of the registered webhook channel the gateway notifies.
  pub notification_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillingAddress {
  pub email_address: String,
  pub phone_number: String,
  pub country_code: String,
  pub first_name: String,
  pub last_name: String,
  pub city: String,
  pub line_1: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
  pub merchant_reference: String,
  pub currency: String,
  pub amount: Decimal,
  pub description: String,
  pub callback_url: String,
  pub notification_id: String,
  pub billing_address: BillingAddress,
}

impl PaymentRequest {
  /// Builds the request from a persisted order; the amount is the stored total.
  pub fn for_order(order: &Order, settings: &PaymentSettings) -> Self {
    Self {
      merchant_reference: order.merchant_reference(),
      currency: settings.currency.clone(),
      amount: order.total,
      description: format!("Payment for order #{}", order.id),
      callback_url: settings.callback_url.clone(),
      notification_id: settings.notification_id.clone(),
      billing_address: BillingAddress {
        email_address: order.email.clone(),
        phone_number: order.phone.clone(),
        country_code: settings.country_code.clone(),
        first_name: order.first_name.clone(),
        last_name: order.last_name.clone(),
        city: order.delivery_location.clone(),
        line_1: order.delivery_location.clone(),
      },
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRedirect {
  pub redirect_url: String,
  pub tracking_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentStatusReport {
  /// Gateway status vocabulary, e.g. `COMPLETED`, `FAILED`, `INVALID`, `REVERSED`.
  pub status_description: String,
  pub merchant_reference: Option<String>,
  pub confirmation_code: Option<String>,
  pub payment_method: Option<String>,
  pub amount: Option<Decimal>,
}
