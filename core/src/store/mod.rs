// orderflow/src/store/mod.rs

//! Order persistence behind the [`OrderStore`] trait.
//!
//! [`PgOrderStore`] is the production implementation; [`InMemoryOrderStore`]
//! keeps the same semantics in process and can inject write failures.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;

use crate::error::Result;
use crate::models::{Order, OrderDraft, OrderStatus};
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u32 = 15;
pub const MAX_PAGE_SIZE: u32 = 100;

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Persists the header and every item as one atomic unit. On failure nothing remains.
  async fn create_order(&self, draft: &OrderDraft) -> Result<Order>;

  /// `OrderFlowError::NotFound` when no order has this id.
  async fn find_order(&self, id: Uuid) -> Result<Order>;

  async fn list_orders(&self, query: &ListQuery) -> Result<OrderPage>;

  async fn list_orders_for_user(&self, user_id: Uuid, sort: SortDirection, search: Option<&str>) -> Result<Vec<Order>>;

  /// `OrderFlowError::NotFound` when no order has this id.
  async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<()>;

  /// Records the gateway tracking reference and resets the payment status to
  /// pending. Only writes when the order has no tracking reference yet;
  /// returns whether a row was written.
  async fn set_tracking_reference(&self, id: Uuid, tracking_id: &str) -> Result<bool>;

  /// Mirrors a gateway payment status onto the order carrying `tracking_id`.
  ///
  /// Returns the number of rows written. Zero is not an error: the reference
  /// may be unknown, or the order may already hold a terminal payment status.
  async fn update_payment_status(&self, tracking_id: &str, status: &str) -> Result<u64>;

  /// Deletes the order and, by cascade, its items.
  async fn delete_order(&self, id: Uuid) -> Result<()>;

  /// Orders whose fulfillment status is anything but `Completed`.
  async fn count_undelivered(&self) -> Result<i64>;
}

/// Ordering by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  Asc,
  #[default]
  Desc,
}

impl SortDirection {
  /// `"asc"` (any case) is ascending; everything else, including absence, is descending.
  pub fn parse_or_default(raw: Option<&str>) -> Self {
    match raw.map(str::trim) {
      Some(s) if s.eq_ignore_ascii_case("asc") => SortDirection::Asc,
      _ => SortDirection::Desc,
    }
  }

  pub fn as_sql(self) -> &'static str {
    match self {
      SortDirection::Asc => "ASC",
      SortDirection::Desc => "DESC",
    }
  }
}

/// Offset pagination and filtering for [`OrderStore::list_orders`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
  pub page: u32,
  pub limit: u32,
  pub sort: SortDirection,
  /// Substring matched against the textual order id.
  pub search: Option<String>,
}

impl ListQuery {
  /// Clamps `page` to at least 1 and `limit` to `1..=MAX_PAGE_SIZE`; blank search terms are dropped.
  pub fn new(page: u32, limit: u32, sort: SortDirection, search: Option<String>) -> Self {
    Self {
      page: page.max(1),
      limit: limit.clamp(1, MAX_PAGE_SIZE),
      sort,
      search: search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
    }
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.limit)
  }
}

impl Default for ListQuery {
  fn default() -> Self {
    Self::new(1, DEFAULT_PAGE_SIZE, SortDirection::Desc, None)
  }
}

/// One page of orders plus the size of the whole matching set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPage {
  pub orders: Vec<Order>,
  pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
  pub total: i64,
  pub current_page: u32,
  pub limit: u32,
  pub has_prev_page: bool,
  pub has_next_page: bool,
  pub previous_page: u32,
  pub next_page: u32,
}

impl PageMetadata {
  pub fn new(query: &ListQuery, total: i64) -> Self {
    let limit = i64::from(query.limit);
    let total_pages = (total.max(0) + limit - 1) / limit;
    Self {
      total,
      current_page: query.page,
      limit: query.limit,
      has_prev_page: query.page > 1,
      has_next_page: total_pages > i64::from(query.page),
      previous_page: query.page.saturating_sub(1),
      next_page: query.page.saturating_add(1),
    }
  }
}

/// Case-insensitive substring match on the textual order id.
pub(crate) fn id_matches(id: &Uuid, search: Option<&str>) -> bool {
  match search {
    None => true,
    Some(term) => id.to_string().contains(&term.to_ascii_lowercase()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sort_defaults_to_descending() {
    assert_eq!(SortDirection::parse_or_default(None), SortDirection::Desc);
    assert_eq!(SortDirection::parse_or_default(Some("sideways")), SortDirection::Desc);
    assert_eq!(SortDirection::parse_or_default(Some("ASC")), SortDirection::Asc);
  }

  #[test]
  fn list_query_clamps_and_computes_offset() {
    let q = ListQuery::new(0, 0, SortDirection::Asc, Some("  ".into()));
    assert_eq!(q.page, 1);
    assert_eq!(q.limit, 1);
    assert_eq!(q.search, None);

    let q = ListQuery::new(2, 15, SortDirection::Desc, None);
    assert_eq!(q.offset(), 15);
  }

  #[test]
  fn metadata_reports_neighbouring_pages() {
    let q = ListQuery::new(2, 15, SortDirection::Desc, None);
    let meta = PageMetadata::new(&q, 40);
    assert!(meta.has_prev_page);
    assert!(meta.has_next_page);
    assert_eq!(meta.previous_page, 1);
    assert_eq!(meta.next_page, 3);

    let last = PageMetadata::new(&ListQuery::new(3, 15, SortDirection::Desc, None), 40);
    assert!(!last.has_next_page);

    let first = PageMetadata::new(&ListQuery::default(), 0);
    assert!(!first.has_prev_page);
    assert!(!first.has_next_page);
  }

  #[test]
  fn metadata_for_the_largest_page_number_saturates() {
    let q = ListQuery::new(u32::MAX, 15, SortDirection::Desc, None);
    let meta = PageMetadata::new(&q, 3);
    assert_eq!(meta.current_page, u32::MAX);
    assert_eq!(meta.next_page, u32::MAX);
    assert_eq!(meta.previous_page, u32::MAX - 1);
    assert!(!meta.has_next_page);
    assert!(i64::try_from(q.offset()).is_ok());
  }
}
