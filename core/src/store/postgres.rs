// orderflow/src/store/postgres.rs

use super::{ListQuery, OrderPage, OrderStore, SortDirection};
use crate::error::{OrderFlowError, Result};
use crate::models::{Order, OrderDraft, OrderItem, OrderStatus, PAYMENT_STATUS_PENDING, TERMINAL_PAYMENT_STATUSES};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, user_id, first_name, last_name, email, phone, delivery_location, total, status, \
                             payment_status, tracking_id, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, name, price, quantity";

#[derive(Debug, FromRow)]
struct OrderRow {
  id: Uuid,
  user_id: Uuid,
  first_name: String,
  last_name: String,
  email: String,
  phone: String,
  delivery_location: String,
  total: Decimal,
  status: OrderStatus,
  payment_status: String,
  tracking_id: Option<String>,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl OrderRow {
  fn into_order(self, order_items: Vec<OrderItem>) -> Order {
    Order {
      id: self.id,
      user_id: self.user_id,
      first_name: self.first_name,
      last_name: self.last_name,
      email: self.email,
      phone: self.phone,
      delivery_location: self.delivery_location,
      total: self.total,
      status: self.status,
      payment_status: self.payment_status,
      tracking_id: self.tracking_id,
      created_at: self.created_at,
      updated_at: self.updated_at,
      order_items,
    }
  }
}

/// Postgres-backed [`OrderStore`]. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  /// Applies the bundled schema migrations.
  pub async fn migrate(&self) -> Result<()> {
    sqlx::migrate!("./migrations")
      .run(&self.pool)
      .await
      .map_err(|e| OrderFlowError::Persistence(sqlx::Error::Migrate(Box::new(e))))?;
    info!("Order schema migrations applied.");
    Ok(())
  }

  async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
    if rows.is_empty() {
      return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let items: Vec<OrderItem> = sqlx::query_as(&format!(
      "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, line_no"
    ))
    .bind(&ids)
    .fetch_all(&self.pool)
    .await?;

    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in items {
      by_order.entry(item.order_id).or_default().push(item);
    }
    Ok(
      rows
        .into_iter()
        .map(|row| {
          let items = by_order.remove(&row.id).unwrap_or_default();
          row.into_order(items)
        })
        .collect(),
    )
  }
}

#[async_trait]
impl OrderStore for PgOrderStore {
  #[instrument(name = "PgOrderStore::create_order", skip(self, draft), fields(user_id = %draft.user_id, items = draft.order_items.len()), err)]
  async fn create_order(&self, draft: &OrderDraft) -> Result<Order> {
    // Dropping `tx` without commit rolls back header and items together.
    let mut tx = self.pool.begin().await?;

    let row: OrderRow = sqlx::query_as(&format!(
      "INSERT INTO orders (id, user_id, first_name, last_name, email, phone, delivery_location, total, status, payment_status) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {ORDER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(draft.user_id)
    .bind(&draft.first_name)
    .bind(&draft.last_name)
    .bind(&draft.email)
    .bind(&draft.phone)
    .bind(&draft.delivery_location)
    .bind(draft.total)
    .bind(OrderStatus::Pending)
    .bind(PAYMENT_STATUS_PENDING)
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(draft.order_items.len());
    for (line_no, new_item) in draft.order_items.iter().enumerate() {
      let item: OrderItem = sqlx::query_as(&format!(
        "INSERT INTO order_items (id, order_id, line_no, product_id, name, price, quantity) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ITEM_COLUMNS}"
      ))
      .bind(Uuid::new_v4())
      .bind(row.id)
      .bind(line_no as i32)
      .bind(new_item.product_id)
      .bind(&new_item.name)
      .bind(new_item.price)
      .bind(new_item.quantity)
      .fetch_one(&mut *tx)
      .await
      .map_err(|e| {
        error!(order_id = %row.id, line_no, error = %e, "Failed to persist order item; rolling back.");
        e
      })?;
      items.push(item);
    }

    tx.commit().await?;
    debug!(order_id = %row.id, "Order committed.");
    Ok(row.into_order(items))
  }

  #[instrument(name = "PgOrderStore::find_order", skip(self), err)]
  async fn find_order(&self, id: Uuid) -> Result<Order> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    let row = row.ok_or_else(|| OrderFlowError::NotFound(format!("Order with ID {} not found.", id)))?;
    let mut orders = self.attach_items(vec![row]).await?;
    orders
      .pop()
      .ok_or_else(|| OrderFlowError::NotFound(format!("Order with ID {} not found.", id)))
  }

  #[instrument(name = "PgOrderStore::list_orders", skip(self), err)]
  async fn list_orders(&self, query: &ListQuery) -> Result<OrderPage> {
    let filter = "($1::text IS NULL OR strpos(id::text, lower($1)) > 0)";
    let direction = query.sort.as_sql();

    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders WHERE {filter} \
       ORDER BY created_at {direction}, id {direction} LIMIT $2 OFFSET $3"
    ))
    .bind(query.search.as_deref())
    .bind(i64::from(query.limit))
    .bind(query.offset() as i64)
    .fetch_all(&self.pool)
    .await?;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders WHERE {filter}"))
      .bind(query.search.as_deref())
      .fetch_one(&self.pool)
      .await?;

    let orders = self.attach_items(rows).await?;
    Ok(OrderPage { orders, total })
  }

  #[instrument(name = "PgOrderStore::list_orders_for_user", skip(self), err)]
  async fn list_orders_for_user(&self, user_id: Uuid, sort: SortDirection, search: Option<&str>) -> Result<Vec<Order>> {
    let direction = sort.as_sql();
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders \
       WHERE user_id = $1 AND ($2::text IS NULL OR strpos(id::text, lower($2)) > 0) \
       ORDER BY created_at {direction}, id {direction}"
    ))
    .bind(user_id)
    .bind(search)
    .fetch_all(&self.pool)
    .await?;
    self.attach_items(rows).await
  }

  #[instrument(name = "PgOrderStore::update_status", skip(self), err)]
  async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<()> {
    let result = sqlx::query("UPDATE orders SET status = $2, updated_at = now() WHERE id = $1")
      .bind(id)
      .bind(status)
      .execute(&self.pool)
      .await?;
    if result.rows_affected() == 0 {
      return Err(OrderFlowError::NotFound(format!("Order with ID {} not found.", id)));
    }
    Ok(())
  }

  #[instrument(name = "PgOrderStore::set_tracking_reference", skip(self), err)]
  async fn set_tracking_reference(&self, id: Uuid, tracking_id: &str) -> Result<bool> {
    let result = sqlx::query(
      "UPDATE orders SET tracking_id = $2, payment_status = $3, updated_at = now() \
       WHERE id = $1 AND tracking_id IS NULL",
    )
    .bind(id)
    .bind(tracking_id)
    .bind(PAYMENT_STATUS_PENDING)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected() > 0)
  }

  #[instrument(name = "PgOrderStore::update_payment_status", skip(self), err)]
  async fn update_payment_status(&self, tracking_id: &str, status: &str) -> Result<u64> {
    let terminal: Vec<String> = TERMINAL_PAYMENT_STATUSES.iter().map(|s| s.to_string()).collect();
    let result = sqlx::query(
      "UPDATE orders SET payment_status = $2, updated_at = now() \
       WHERE tracking_id = $1 AND NOT (upper(payment_status) = ANY($3))",
    )
    .bind(tracking_id)
    .bind(status)
    .bind(terminal)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected())
  }

  #[instrument(name = "PgOrderStore::delete_order", skip(self), err)]
  async fn delete_order(&self, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    if result.rows_affected() == 0 {
      return Err(OrderFlowError::NotFound(format!("Order with ID {} not found.", id)));
    }
    Ok(())
  }

  #[instrument(name = "PgOrderStore::count_undelivered", skip(self), err)]
  async fn count_undelivered(&self) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status <> $1")
      .bind(OrderStatus::Completed)
      .fetch_one(&self.pool)
      .await?;
    Ok(count)
  }
}
