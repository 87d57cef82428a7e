// orderflow_server/src/web/routes.rs

use actix_web::{error, web, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{notification_handlers, order_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

fn json_error_handler(err: error::JsonPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
  tracing::warn!(error = %err, "Rejected JSON body.");
  AppError::BadRequest("Invalid request body".to_string()).into()
}

fn query_error_handler(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
  tracing::warn!(error = %err, "Rejected query string.");
  AppError::BadRequest("Invalid query parameters".to_string()).into()
}

/// Registers every route plus the body/query error handlers. Shared by the
/// binary and the HTTP tests.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
    .route("/health", web::get().to(health_check_handler))
    .service(
      web::resource("/order")
        .route(web::post().to(order_handlers::place_order_handler))
        .route(web::get().to(order_handlers::list_orders_handler)),
    )
    .service(
      web::resource("/order/{orderId}")
        .route(web::get().to(order_handlers::get_order_handler))
        .route(web::patch().to(order_handlers::update_order_status_handler))
        .route(web::delete().to(order_handlers::delete_order_handler)),
    )
    .route(
      "/orders/undelivered",
      web::get().to(order_handlers::undelivered_orders_handler),
    )
    .route("/user/{userId}/orders", web::get().to(order_handlers::user_orders_handler))
    .service(
      web::resource("/payment-notification")
        .route(web::post().to(notification_handlers::payment_notification_handler))
        .route(web::get().to(notification_handlers::payment_notification_handler)),
    );
}
