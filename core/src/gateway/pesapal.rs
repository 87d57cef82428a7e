// orderflow/src/gateway/pesapal.rs
//
// Client for the Pesapal v3 REST API.
// Auth: `POST /api/Auth/RequestToken` exchanges consumer key/secret for a bearer token.

use super::{AccessToken, PaymentGateway, PaymentRedirect, PaymentRequest, PaymentStatusReport};
use crate::error::GatewayError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://pay.pesapal.com/v3";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const TOKEN_PATH: &str = "api/Auth/RequestToken";
const SUBMIT_ORDER_PATH: &str = "api/Transactions/SubmitOrderRequest";
const TRANSACTION_STATUS_PATH: &str = "api/Transactions/GetTransactionStatus";

#[derive(Clone)]
pub struct PesapalConfig {
  pub base_url: String,
  pub consumer_key: Option<String>,
  pub consumer_secret: Option<String>,
  /// Applied to every outbound call.
  pub timeout: Duration,
}

impl Default for PesapalConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      consumer_key: None,
      consumer_secret: None,
      timeout: DEFAULT_TIMEOUT,
    }
  }
}

impl fmt::Debug for PesapalConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PesapalConfig")
      .field("base_url", &self.base_url)
      .field("consumer_key_set", &self.consumer_key.is_some())
      .field("consumer_secret_set", &self.consumer_secret.is_some())
      .field("timeout", &self.timeout)
      .finish()
  }
}

// --- Wire schema ---

#[derive(Serialize)]
struct TokenRequestBody<'a> {
  consumer_key: &'a str,
  consumer_secret: &'a str,
}

/// The gateway sends an `error` object on every response; on success all its fields are null.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
  error_type: Option<String>,
  code: Option<String>,
  message: Option<String>,
}

impl ApiErrorBody {
  fn rejection(&self) -> Option<String> {
    if self.error_type.is_none() && self.code.is_none() && self.message.is_none() {
      return None;
    }
    Some(format!(
      "{}/{}: {}",
      self.error_type.as_deref().unwrap_or("unknown"),
      self.code.as_deref().unwrap_or("unknown"),
      self.message.as_deref().unwrap_or("")
    ))
  }
}

#[derive(Debug, Deserialize)]
struct TokenResponseBody {
  token: Option<String>,
  #[serde(rename = "expiryDate")]
  expiry_date: Option<String>,
  error: Option<ApiErrorBody>,
}

#[derive(Serialize)]
struct BillingAddressBody<'a> {
  email_address: &'a str,
  phone_number: &'a str,
  country_code: &'a str,
  first_name: &'a str,
  last_name: &'a str,
  city: &'a str,
  line_1: &'a str,
}

#[derive(Serialize)]
struct SubmitOrderBody<'a> {
  id: &'a str,
  currency: &'a str,
  #[serde(with = "rust_decimal::serde::float")]
  amount: Decimal,
  description: &'a str,
  callback_url: &'a str,
  notification_id: &'a str,
  billing_address: BillingAddressBody<'a>,
}

impl<'a> From<&'a PaymentRequest> for SubmitOrderBody<'a> {
  fn from(req: &'a PaymentRequest) -> Self {
    let billing = &req.billing_address;
    Self {
      id: &req.merchant_reference,
      currency: &req.currency,
      amount: req.amount,
      description: &req.description,
      callback_url: &req.callback_url,
      notification_id: &req.notification_id,
      billing_address: BillingAddressBody {
        email_address: &billing.email_address,
        phone_number: &billing.phone_number,
        country_code: &billing.country_code,
        first_name: &billing.first_name,
        last_name: &billing.last_name,
        city: &billing.city,
        line_1: &billing.line_1,
      },
    }
  }
}

#[derive(Debug, Deserialize)]
struct SubmitOrderResponseBody {
  order_tracking_id: Option<String>,
  redirect_url: Option<String>,
  error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct TransactionStatusBody {
  payment_status_description: Option<String>,
  payment_method: Option<String>,
  confirmation_code: Option<String>,
  merchant_reference: Option<String>,
  #[serde(default, with = "rust_decimal::serde::float_option")]
  amount: Option<Decimal>,
  error: Option<ApiErrorBody>,
}

fn check_rejection(error: Option<&ApiErrorBody>) -> Result<(), GatewayError> {
  match error.and_then(ApiErrorBody::rejection) {
    Some(reason) => Err(GatewayError::Rejected(reason)),
    None => Ok(()),
  }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, GatewayError> {
  value
    .filter(|v| !v.trim().is_empty())
    .ok_or(GatewayError::MissingField(field))
}

// --- Client ---

#[derive(Debug, Clone)]
pub struct PesapalClient {
  http: reqwest::Client,
  config: PesapalConfig,
}

impl PesapalClient {
  pub fn new(config: PesapalConfig) -> Result<Self, GatewayError> {
    let http = reqwest::Client::builder().timeout(config.timeout).build()?;
    Ok(Self { http, config })
  }

  fn endpoint(&self, path: &str) -> String {
    format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// Reads the body, failing on a non-success status or a body that does not match `T`.
  async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, GatewayError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
      warn!(status = status.as_u16(), "Gateway returned a non-success status.");
      return Err(GatewayError::Status {
        status: status.as_u16(),
        body,
      });
    }
    serde_json::from_str::<T>(&body).map_err(|e| GatewayError::Decode(format!("{e}; body={body}")))
  }
}

#[async_trait]
impl PaymentGateway for PesapalClient {
  #[instrument(name = "pesapal::request_access_token", skip(self), err)]
  async fn request_access_token(&self) -> Result<AccessToken, GatewayError> {
    let (Some(consumer_key), Some(consumer_secret)) = (
      self.config.consumer_key.as_deref().filter(|k| !k.is_empty()),
      self.config.consumer_secret.as_deref().filter(|s| !s.is_empty()),
    ) else {
      return Err(GatewayError::MissingCredentials);
    };

    let resp = self
      .http
      .post(self.endpoint(TOKEN_PATH))
      .header(reqwest::header::ACCEPT, "application/json")
      .json(&TokenRequestBody {
        consumer_key,
        consumer_secret,
      })
      .send()
      .await?;

    let body: TokenResponseBody = Self::read_json(resp).await?;
    check_rejection(body.error.as_ref())?;
    let token = required(body.token, "token")?;
    debug!("Gateway access token obtained.");
    Ok(AccessToken {
      token,
      expires_at: body.expiry_date,
    })
  }

  #[instrument(
    name = "pesapal::submit_payment_request",
    skip(self, token, request),
    fields(merchant_reference = %request.merchant_reference, amount = %request.amount, currency = %request.currency),
    err
  )]
  async fn submit_payment_request(
    &self,
    token: &AccessToken,
    request: &PaymentRequest,
  ) -> Result<PaymentRedirect, GatewayError> {
    let resp = self
      .http
      .post(self.endpoint(SUBMIT_ORDER_PATH))
      .bearer_auth(&token.token)
      .header(reqwest::header::ACCEPT, "application/json")
      .json(&SubmitOrderBody::from(request))
      .send()
      .await?;

    let body: SubmitOrderResponseBody = Self::read_json(resp).await?;
    check_rejection(body.error.as_ref())?;
    let redirect_url = required(body.redirect_url, "redirect_url")?;
    let tracking_id = required(body.order_tracking_id, "order_tracking_id")?;
    debug!(tracking_id = %tracking_id, "Gateway accepted payment request.");
    Ok(PaymentRedirect {
      redirect_url,
      tracking_id,
    })
  }

  #[instrument(name = "pesapal::query_payment_status", skip(self, token), err)]
  async fn query_payment_status(
    &self,
    token: &AccessToken,
    tracking_id: &str,
  ) -> Result<PaymentStatusReport, GatewayError> {
    let resp = self
      .http
      .get(self.endpoint(TRANSACTION_STATUS_PATH))
      .query(&[("orderTrackingId", tracking_id)])
      .bearer_auth(&token.token)
      .header(reqwest::header::ACCEPT, "application/json")
      .send()
      .await?;

    let body: TransactionStatusBody = Self::read_json(resp).await?;
    check_rejection(body.error.as_ref())?;
    let status_description = required(body.payment_status_description, "payment_status_description")?;
    Ok(PaymentStatusReport {
      status_description,
      merchant_reference: body.merchant_reference,
      confirmation_code: body.confirmation_code,
      payment_method: body.payment_method,
      amount: body.amount,
    })
  }
}
