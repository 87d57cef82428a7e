// tests/common/mod.rs
#![allow(dead_code)]

use httpmock::prelude::*;
use httpmock::Mock;
use once_cell::sync::Lazy;
use orderflow::{InMemoryOrderStore, NewOrderItem, OrderDraft, PesapalClient};
use rust_decimal::Decimal;
use orderflow_server::auth::{encode_token, Claims, Role};
use orderflow_server::config::AppConfig;
use orderflow_server::state::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";

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

/// Builds the actix service under test from an [`AppState`].
macro_rules! init_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state.clone()))
        .configure(orderflow_server::web::configure_app_routes),
    )
    .await
  };
}

pub struct TestContext {
  pub state: AppState,
  pub store: InMemoryOrderStore,
  pub gateway: MockServer,
}

fn test_config(gateway_url: String) -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".into(),
    server_port: 0,
    database_url: "postgres://unused".into(),
    run_migrations: false,
    jwt_secret: JWT_SECRET.into(),
    pesapal_base_url: gateway_url,
    pesapal_consumer_key: Some("key".into()),
    pesapal_consumer_secret: Some("secret".into()),
    pesapal_notification_id: "ipn-test".into(),
    pesapal_callback_url: "https://shop.example/payment/callback".into(),
    payment_currency: "KES".into(),
    billing_country_code: "KE".into(),
    gateway_timeout: Duration::from_secs(5),
  }
}

/// In-memory store plus a real Pesapal client pointed at a mock server.
pub async fn test_context() -> TestContext {
  setup_tracing();
  let gateway = MockServer::start_async().await;
  let config = test_config(gateway.base_url());
  let client = PesapalClient::new(config.pesapal_config()).expect("gateway client");
  let store = InMemoryOrderStore::new();
  let state = AppState::new(Arc::new(store.clone()), Arc::new(client), config);
  TestContext { state, store, gateway }
}

pub fn bearer(user_id: Uuid, role: Role) -> String {
  let now = chrono::Utc::now().timestamp();
  let claims = Claims {
    user_id,
    email: "jane@example.com".into(),
    username: "jane".into(),
    role,
    iat: now,
    exp: now + 3600,
  };
  format!("Bearer {}", encode_token(JWT_SECRET.as_bytes(), &claims).expect("sign token"))
}

pub fn admin_bearer() -> String {
  bearer(Uuid::new_v4(), Role::Admin)
}

pub fn order_body() -> Value {
  json!({
    "firstName": "Jane",
    "lastName": "Wanjiru",
    "email": "jane@example.com",
    "phone": "+254700000000",
    "deliveryLocation": "Nairobi",
    "total": 1500.00,
    "orderItems": [
      {"productId": Uuid::new_v4(), "name": "Kettle", "price": 1000.00, "quantity": 1},
      {"productId": Uuid::new_v4(), "name": "Mug", "price": 250.00, "quantity": 2}
    ]
  })
}

/// Draft for seeding the store directly.
pub fn sample_draft() -> OrderDraft {
  OrderDraft {
    user_id: Uuid::new_v4(),
    first_name: "Jane".into(),
    last_name: "Wanjiru".into(),
    email: "jane@example.com".into(),
    phone: "+254700000000".into(),
    delivery_location: "Nairobi".into(),
    total: Decimal::new(150000, 2),
    order_items: vec![
      NewOrderItem {
        product_id: Uuid::new_v4(),
        name: "Kettle".into(),
        price: Decimal::new(100000, 2),
        quantity: 1,
      },
      NewOrderItem {
        product_id: Uuid::new_v4(),
        name: "Mug".into(),
        price: Decimal::new(25000, 2),
        quantity: 2,
      },
    ],
  }
}

// --- Gateway mocks ---

pub async fn mock_token(server: &MockServer) -> Mock<'_> {
  server
    .mock_async(|when, then| {
      when.method(POST).path("/api/Auth/RequestToken");
      then.status(200).json_body(json!({
        "token": "tok-1",
        "expiryDate": "2030-01-01T00:00:00Z",
        "error": null,
        "status": "200"
      }));
    })
    .await
}

pub async fn mock_submit<'a>(server: &'a MockServer, redirect_url: &str, tracking_id: &str) -> Mock<'a> {
  let body = json!({
    "order_tracking_id": tracking_id,
    "redirect_url": redirect_url,
    "error": null,
    "status": "200"
  });
  server
    .mock_async(move |when, then| {
      when
        .method(POST)
        .path("/api/Transactions/SubmitOrderRequest")
        .header("authorization", "Bearer tok-1");
      then.status(200).json_body(body);
    })
    .await
}

pub async fn mock_status<'a>(server: &'a MockServer, tracking_id: &str, status: &str) -> Mock<'a> {
  let tracking_id = tracking_id.to_string();
  let body = json!({
    "payment_status_description": status,
    "payment_method": "MpesaKE",
    "confirmation_code": "QK1234",
    "error": null,
    "status": "200"
  });
  server
    .mock_async(move |when, then| {
      when
        .method(GET)
        .path("/api/Transactions/GetTransactionStatus")
        .query_param("orderTrackingId", tracking_id.as_str());
      then.status(200).json_body(body);
    })
    .await
}
