// orderflow_server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use orderflow::{ListQuery, NewOrderItem, OrderDraft, OrderStatus, PageMetadata, SortDirection};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::{AdminUser, AuthenticatedUser};
use crate::errors::{AppError, Result};
use crate::state::AppState;

// --- Request DTOs ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderItemPayload {
  pub product_id: Uuid,
  pub name: String,
  pub price: Decimal,
  pub quantity: i32,
}

/// Body of `POST /order`. The owner is taken from the bearer token, not the body.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderPayload {
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub phone: String,
  pub delivery_location: String,
  pub total: Decimal,
  #[serde(default)]
  pub order_items: Vec<PlaceOrderItemPayload>,
}

impl PlaceOrderPayload {
  fn into_draft(self, user_id: Uuid) -> OrderDraft {
    OrderDraft {
      user_id,
      first_name: self.first_name,
      last_name: self.last_name,
      email: self.email,
      phone: self.phone,
      delivery_location: self.delivery_location,
      total: self.total,
      order_items: self
        .order_items
        .into_iter()
        .map(|item| NewOrderItem {
          product_id: item.product_id,
          name: item.name,
          price: item.price,
          quantity: item.quantity,
        })
        .collect(),
    }
  }
}

/// Query of `GET /order`. Numbers that do not parse fall back to their defaults.
#[derive(Deserialize, Debug, Default)]
pub struct ListOrdersParams {
  pub page: Option<String>,
  pub limit: Option<String>,
  pub sort: Option<String>,
  pub search: Option<String>,
}

impl ListOrdersParams {
  fn to_query(&self) -> ListQuery {
    let defaults = ListQuery::default();
    let parse = |raw: &Option<String>, fallback: u32| {
      raw
        .as_deref()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(fallback)
    };
    ListQuery::new(
      parse(&self.page, defaults.page),
      parse(&self.limit, defaults.limit),
      SortDirection::parse_or_default(self.sort.as_deref()),
      self.search.clone(),
    )
  }
}

#[derive(Deserialize, Debug, Default)]
pub struct UserOrdersParams {
  pub sort: Option<String>,
  pub search: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateStatusPayload {
  pub status: OrderStatus,
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
  Uuid::parse_str(raw.trim()).map_err(|_| AppError::BadRequest(format!("Failed to parse {}", what)))
}

// --- Handlers ---

#[instrument(name = "handler::place_order", skip(app_state, auth_user, payload), fields(user_id = %auth_user.0.user_id))]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<PlaceOrderPayload>,
) -> Result<HttpResponse> {
  let draft = payload.into_inner().into_draft(auth_user.0.user_id);
  let placed = app_state.workflow.place_order(draft).await?;

  info!(order_id = %placed.order_id, stage = ?placed.stage, "Order placement finished.");
  Ok(HttpResponse::Ok().json(json!({
    "message": "Order created successfully. Redirect user to payment.",
    "redirect_url": placed.redirect_url,
    "order_id": placed.order_id,
    "order_tracking_id": placed.tracking_id,
  })))
}

#[instrument(name = "handler::list_orders", skip(app_state, _admin))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  params: web::Query<ListOrdersParams>,
) -> Result<HttpResponse> {
  let query = params.to_query();
  let page = app_state.store.list_orders(&query).await?;
  let metadata = PageMetadata::new(&query, page.total);
  Ok(HttpResponse::Ok().json(json!({
    "orders": page.orders,
    "metadata": metadata,
  })))
}

#[instrument(name = "handler::get_order", skip(app_state, _admin))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<String>,
) -> Result<HttpResponse> {
  let order_id = parse_id(&path, "orderId")?;
  let order = app_state.store.find_order(order_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}

#[instrument(name = "handler::update_order_status", skip(app_state, admin, payload), fields(status = %payload.status))]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<String>,
  payload: web::Json<UpdateStatusPayload>,
) -> Result<HttpResponse> {
  let order_id = parse_id(&path, "orderId")?;
  app_state.store.update_status(order_id, payload.status).await?;
  info!(order_id = %order_id, by = %admin.0.user_id, "Order status updated.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Order status updated successfully." })))
}

#[instrument(name = "handler::delete_order", skip(app_state, admin))]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<String>,
) -> Result<HttpResponse> {
  let order_id = parse_id(&path, "orderId")?;
  app_state.store.delete_order(order_id).await?;
  info!(order_id = %order_id, by = %admin.0.user_id, "Order deleted.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Order deleted successfully." })))
}

#[instrument(name = "handler::undelivered_orders", skip(app_state, _admin))]
pub async fn undelivered_orders_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse> {
  let count = app_state.store.count_undelivered().await?;
  Ok(HttpResponse::Ok().json(json!({ "undeliveredOrderCount": count })))
}

#[instrument(name = "handler::user_orders", skip(app_state, auth_user), fields(caller = %auth_user.0.user_id))]
pub async fn user_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<String>,
  params: web::Query<UserOrdersParams>,
) -> Result<HttpResponse> {
  let user_id = parse_id(&path, "userId")?;
  if !auth_user.0.can_access_user(user_id) {
    return Err(AppError::Forbidden("Cannot view another user's orders".to_string()));
  }
  let search = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
  let orders = app_state
    .store
    .list_orders_for_user(user_id, SortDirection::parse_or_default(params.sort.as_deref()), search)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}
