// orderflow/src/store/memory.rs

use super::{id_matches, ListQuery, OrderPage, OrderStore, SortDirection};
use crate::error::{OrderFlowError, Result};
use crate::models::{
  is_terminal_payment_status, Order, OrderDraft, OrderItem, OrderStatus, PAYMENT_STATUS_PENDING,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
  orders: Vec<Order>,
  last_created_at: Option<DateTime<Utc>>,
  fail_item_write_at: Option<usize>,
  fail_tracking_writes: bool,
  fail_payment_status_writes: bool,
}

impl MemoryState {
  /// Strictly increasing creation timestamps, so ordering by creation time is total.
  fn next_created_at(&mut self) -> DateTime<Utc> {
    let now = Utc::now();
    let ts = match self.last_created_at {
      Some(last) if now <= last => last + Duration::microseconds(1),
      _ => now,
    };
    self.last_created_at = Some(ts);
    ts
  }
}

fn injected(what: &str) -> OrderFlowError {
  OrderFlowError::Persistence(sqlx::Error::Protocol(format!("injected failure: {}", what)))
}

fn not_found(id: Uuid) -> OrderFlowError {
  OrderFlowError::NotFound(format!("Order with ID {} not found.", id))
}

fn sort_by_creation(orders: &mut [Order], sort: SortDirection) {
  match sort {
    SortDirection::Asc => orders.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    SortDirection::Desc => orders.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
  }
}

/// In-process [`OrderStore`] with the same observable semantics as the
/// Postgres store. Clones share state.
///
/// Failure switches let callers reproduce persistence errors at specific
/// points of the workflow.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
  state: Arc<Mutex<MemoryState>>,
}

impl InMemoryOrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes `create_order` fail while writing the item at index `index`
  /// (zero-based). `None` disables the failure.
  pub fn fail_item_write_at(&self, index: Option<usize>) {
    self.state.lock().fail_item_write_at = index;
  }

  pub fn fail_tracking_writes(&self, fail: bool) {
    self.state.lock().fail_tracking_writes = fail;
  }

  pub fn fail_payment_status_writes(&self, fail: bool) {
    self.state.lock().fail_payment_status_writes = fail;
  }

  pub fn order_count(&self) -> usize {
    self.state.lock().orders.len()
  }

  pub fn item_count(&self) -> usize {
    self.state.lock().orders.iter().map(|o| o.order_items.len()).sum()
  }

  pub fn snapshot(&self) -> Vec<Order> {
    self.state.lock().orders.clone()
  }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
  async fn create_order(&self, draft: &OrderDraft) -> Result<Order> {
    let mut state = self.state.lock();
    let order_id = Uuid::new_v4();

    // Items are staged and only become visible together with the header.
    let mut staged = Vec::with_capacity(draft.order_items.len());
    for (idx, new_item) in draft.order_items.iter().enumerate() {
      if state.fail_item_write_at == Some(idx) {
        return Err(injected("order item write"));
      }
      staged.push(OrderItem {
        id: Uuid::new_v4(),
        order_id,
        product_id: new_item.product_id,
        name: new_item.name.clone(),
        price: new_item.price,
        quantity: new_item.quantity,
      });
    }

    let created_at = state.next_created_at();
    let order = Order {
      id: order_id,
      user_id: draft.user_id,
      first_name: draft.first_name.clone(),
      last_name: draft.last_name.clone(),
      email: draft.email.clone(),
      phone: draft.phone.clone(),
      delivery_location: draft.delivery_location.clone(),
      total: draft.total,
      status: OrderStatus::Pending,
      payment_status: PAYMENT_STATUS_PENDING.to_string(),
      tracking_id: None,
      created_at,
      updated_at: created_at,
      order_items: staged,
    };
    state.orders.push(order.clone());
    Ok(order)
  }

  async fn find_order(&self, id: Uuid) -> Result<Order> {
    self
      .state
      .lock()
      .orders
      .iter()
      .find(|o| o.id == id)
      .cloned()
      .ok_or_else(|| not_found(id))
  }

  async fn list_orders(&self, query: &ListQuery) -> Result<OrderPage> {
    let state = self.state.lock();
    let mut matching: Vec<Order> = state
      .orders
      .iter()
      .filter(|o| id_matches(&o.id, query.search.as_deref()))
      .cloned()
      .collect();
    sort_by_creation(&mut matching, query.sort);

    let total = matching.len() as i64;
    let orders = matching
      .into_iter()
      .skip(query.offset() as usize)
      .take(query.limit as usize)
      .collect();
    Ok(OrderPage { orders, total })
  }

  async fn list_orders_for_user(&self, user_id: Uuid, sort: SortDirection, search: Option<&str>) -> Result<Vec<Order>> {
    let state = self.state.lock();
    let mut orders: Vec<Order> = state
      .orders
      .iter()
      .filter(|o| o.user_id == user_id && id_matches(&o.id, search))
      .cloned()
      .collect();
    sort_by_creation(&mut orders, sort);
    Ok(orders)
  }

  async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<()> {
    let mut state = self.state.lock();
    let order = state.orders.iter_mut().find(|o| o.id == id).ok_or_else(|| not_found(id))?;
    order.status = status;
    order.updated_at = Utc::now();
    Ok(())
  }

  async fn set_tracking_reference(&self, id: Uuid, tracking_id: &str) -> Result<bool> {
    let mut state = self.state.lock();
    if state.fail_tracking_writes {
      return Err(injected("tracking reference write"));
    }
    match state.orders.iter_mut().find(|o| o.id == id && o.tracking_id.is_none()) {
      Some(order) => {
        order.tracking_id = Some(tracking_id.to_string());
        order.payment_status = PAYMENT_STATUS_PENDING.to_string();
        order.updated_at = Utc::now();
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn update_payment_status(&self, tracking_id: &str, status: &str) -> Result<u64> {
    let mut state = self.state.lock();
    if state.fail_payment_status_writes {
      return Err(injected("payment status write"));
    }
    let mut written = 0;
    for order in state
      .orders
      .iter_mut()
      .filter(|o| o.tracking_id.as_deref() == Some(tracking_id))
    {
      if is_terminal_payment_status(&order.payment_status) {
        continue;
      }
      order.payment_status = status.to_string();
      order.updated_at = Utc::now();
      written += 1;
    }
    Ok(written)
  }

  async fn delete_order(&self, id: Uuid) -> Result<()> {
    let mut state = self.state.lock();
    let before = state.orders.len();
    state.orders.retain(|o| o.id != id);
    if state.orders.len() == before {
      return Err(not_found(id));
    }
    Ok(())
  }

  async fn count_undelivered(&self) -> Result<i64> {
    let state = self.state.lock();
    Ok(state.orders.iter().filter(|o| o.status != OrderStatus::Completed).count() as i64)
  }
}
