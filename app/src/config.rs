// orderflow_server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use orderflow::gateway::pesapal::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use orderflow::{PaymentSettings, PesapalConfig};
use std::env;
use std::fmt;
use std::time::Duration;

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub run_migrations: bool,
  pub jwt_secret: String,

  // Payment gateway
  pub pesapal_base_url: String,
  pub pesapal_consumer_key: Option<String>,
  pub pesapal_consumer_secret: Option<String>,
  pub pesapal_notification_id: String,
  pub pesapal_callback_url: String,
  pub payment_currency: String,
  pub billing_country_code: String,
  pub gateway_timeout: Duration,
}

impl fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &"[REDACTED]")
      .field("run_migrations", &self.run_migrations)
      .field("pesapal_base_url", &self.pesapal_base_url)
      .field("pesapal_consumer_key_set", &self.pesapal_consumer_key.is_some())
      .field("pesapal_notification_id", &self.pesapal_notification_id)
      .field("pesapal_callback_url", &self.pesapal_callback_url)
      .field("payment_currency", &self.payment_currency)
      .field("billing_country_code", &self.billing_country_code)
      .field("gateway_timeout", &self.gateway_timeout)
      .finish()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let optional_env = |var_name: &str| env::var(var_name).ok().filter(|v| !v.trim().is_empty());

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let run_migrations = get_env("RUN_MIGRATIONS")
      .unwrap_or_else(|_| "true".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid RUN_MIGRATIONS value: {}", e)))?;
    let jwt_secret = get_env("JWT_SECRET")?;

    let pesapal_base_url = get_env("PESAPAL_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let pesapal_consumer_key = optional_env("PESAPAL_CONSUMER_KEY");
    let pesapal_consumer_secret = optional_env("PESAPAL_CONSUMER_SECRET");
    let pesapal_notification_id = get_env("PESAPAL_NOTIFICATION_ID")?;
    let pesapal_callback_url = get_env("PESAPAL_CALLBACK_URL")
      .unwrap_or_else(|_| format!("http://{}:{}/payment/callback", server_host, server_port));
    let payment_currency = get_env("PAYMENT_CURRENCY").unwrap_or_else(|_| "KES".to_string());
    let billing_country_code = get_env("BILLING_COUNTRY_CODE").unwrap_or_else(|_| "KE".to_string());
    let gateway_timeout = match optional_env("GATEWAY_TIMEOUT_SECS") {
      Some(raw) => Duration::from_secs(
        raw
          .parse::<u64>()
          .map_err(|e| AppError::Config(format!("Invalid GATEWAY_TIMEOUT_SECS: {}", e)))?,
      ),
      None => DEFAULT_TIMEOUT,
    };

    if pesapal_consumer_key.is_none() || pesapal_consumer_secret.is_none() {
      tracing::warn!("Pesapal consumer credentials are not set; payment requests will fail.");
    }
    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      run_migrations,
      jwt_secret,
      pesapal_base_url,
      pesapal_consumer_key,
      pesapal_consumer_secret,
      pesapal_notification_id,
      pesapal_callback_url,
      payment_currency,
      billing_country_code,
      gateway_timeout,
    })
  }

  pub fn pesapal_config(&self) -> PesapalConfig {
    PesapalConfig {
      base_url: self.pesapal_base_url.clone(),
      consumer_key: self.pesapal_consumer_key.clone(),
      consumer_secret: self.pesapal_consumer_secret.clone(),
      timeout: self.gateway_timeout,
    }
  }

  pub fn payment_settings(&self) -> PaymentSettings {
    PaymentSettings {
      currency: self.payment_currency.clone(),
      country_code: self.billing_country_code.clone(),
      callback_url: self.pesapal_callback_url.clone(),
      notification_id: self.pesapal_notification_id.clone(),
    }
  }
}
