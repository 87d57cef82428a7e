// orderflow_server/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use orderflow::{PesapalClient, PgOrderStore};
use orderflow_server::config::AppConfig;
use orderflow_server::state::AppState;
use orderflow_server::web::configure_app_routes;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting order service...");

  let app_config = AppConfig::from_env().context("loading configuration")?;
  tracing::debug!(config = ?app_config, "Loaded configuration.");

  let db_pool = PgPoolOptions::new()
    .max_connections(10)
    .connect(&app_config.database_url)
    .await
    .context("connecting to the database")?;
  tracing::info!("Successfully connected to the database.");

  let store = PgOrderStore::new(db_pool);
  if app_config.run_migrations {
    store.migrate().await.context("running migrations")?;
  }

  let gateway = PesapalClient::new(app_config.pesapal_config()).context("building payment gateway client")?;

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  let app_state = AppState::new(Arc::new(store), Arc::new(gateway), app_config);

  tracing::info!("Binding server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await?;

  Ok(())
}
