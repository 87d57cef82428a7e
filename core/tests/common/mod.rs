// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use orderflow::{
  AccessToken, GatewayError, NewOrderItem, OrderDraft, PaymentGateway, PaymentRedirect, PaymentRequest,
  PaymentSettings, PaymentStatusReport,
};
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::Level;
use uuid::Uuid;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn payment_settings() -> PaymentSettings {
  PaymentSettings {
    currency: "KES".into(),
    country_code: "KE".into(),
    callback_url: "https://shop.example/payment/callback".into(),
    notification_id: "ipn-test".into(),
  }
}

/// Two items summing to 1500.00.
pub fn sample_draft() -> OrderDraft {
  OrderDraft {
    user_id: Uuid::new_v4(),
    first_name: "Jane".into(),
    last_name: "Wanjiru".into(),
    email: "jane@example.com".into(),
    phone: "+254700000000".into(),
    delivery_location: "Nairobi".into(),
    total: dec!(1500.00),
    order_items: vec![
      NewOrderItem {
        product_id: Uuid::new_v4(),
        name: "Kettle".into(),
        price: dec!(1000.00),
        quantity: 1,
      },
      NewOrderItem {
        product_id: Uuid::new_v4(),
        name: "Mug".into(),
        price: dec!(250.00),
        quantity: 2,
      },
    ],
  }
}

fn scripted_failure(what: &str) -> GatewayError {
  GatewayError::Status {
    status: 503,
    body: format!("scripted {} failure", what),
  }
}

/// In-process gateway whose answers and failures are set per test.
pub struct ScriptedGateway {
  pub redirect_url: String,
  pub tracking_id: String,
  pub status_description: Mutex<String>,
  pub fail_token: AtomicBool,
  pub fail_submit: AtomicBool,
  pub fail_status_query: AtomicBool,
  pub token_requests: AtomicUsize,
  pub submitted: Mutex<Vec<PaymentRequest>>,
  pub queried: Mutex<Vec<String>>,
}

impl ScriptedGateway {
  pub fn new(redirect_url: &str, tracking_id: &str) -> Self {
    Self {
      redirect_url: redirect_url.into(),
      tracking_id: tracking_id.into(),
      status_description: Mutex::new("COMPLETED".into()),
      fail_token: AtomicBool::new(false),
      fail_submit: AtomicBool::new(false),
      fail_status_query: AtomicBool::new(false),
      token_requests: AtomicUsize::new(0),
      submitted: Mutex::new(Vec::new()),
      queried: Mutex::new(Vec::new()),
    }
  }

  pub fn reporting(self, status: &str) -> Self {
    *self.status_description.lock() = status.into();
    self
  }

  pub fn submitted_count(&self) -> usize {
    self.submitted.lock().len()
  }
}

impl Default for ScriptedGateway {
  fn default() -> Self {
    Self::new("https://pay.x/y", "T123")
  }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
  async fn request_access_token(&self) -> Result<AccessToken, GatewayError> {
    self.token_requests.fetch_add(1, Ordering::SeqCst);
    if self.fail_token.load(Ordering::SeqCst) {
      return Err(scripted_failure("token"));
    }
    Ok(AccessToken::new("scripted-token"))
  }

  async fn submit_payment_request(
    &self,
    _token: &AccessToken,
    request: &PaymentRequest,
  ) -> Result<PaymentRedirect, GatewayError> {
    if self.fail_submit.load(Ordering::SeqCst) {
      return Err(scripted_failure("submit"));
    }
    self.submitted.lock().push(request.clone());
    Ok(PaymentRedirect {
      redirect_url: self.redirect_url.clone(),
      tracking_id: self.tracking_id.clone(),
    })
  }

  async fn query_payment_status(
    &self,
    _token: &AccessToken,
    tracking_id: &str,
  ) -> Result<PaymentStatusReport, GatewayError> {
    if self.fail_status_query.load(Ordering::SeqCst) {
      return Err(scripted_failure("status query"));
    }
    self.queried.lock().push(tracking_id.to_string());
    Ok(PaymentStatusReport {
      status_description: self.status_description.lock().clone(),
      merchant_reference: None,
      confirmation_code: Some("CONF-1".into()),
      payment_method: Some("MpesaKE".into()),
      amount: None,
    })
  }
}
