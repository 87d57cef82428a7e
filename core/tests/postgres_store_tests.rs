// tests/postgres_store_tests.rs
//
// Runs against a real database only when TEST_DATABASE_URL is set; otherwise each test returns early.
mod common;

use common::{sample_draft, setup_tracing};
use orderflow::{ListQuery, OrderFlowError, OrderStatus, OrderStore, PgOrderStore, SortDirection};
use serial_test::serial;
use sqlx::PgPool;
use uuid::Uuid;

async fn fresh_store() -> Option<PgOrderStore> {
  setup_tracing();
  let url = std::env::var("TEST_DATABASE_URL").ok()?;
  let pool = PgPool::connect(&url).await.expect("connect to TEST_DATABASE_URL");
  let store = PgOrderStore::new(pool);
  store.migrate().await.expect("apply migrations");
  sqlx::query("TRUNCATE orders CASCADE")
    .execute(store.pool())
    .await
    .expect("truncate orders");
  Some(store)
}

#[tokio::test]
#[serial]
async fn created_order_round_trips_with_items_in_submission_order() {
  let Some(store) = fresh_store().await else { return };
  let draft = sample_draft();

  let created = store.create_order(&draft).await.unwrap();
  let loaded = store.find_order(created.id).await.unwrap();

  assert_eq!(loaded.total, draft.total);
  assert_eq!(loaded.status, OrderStatus::Pending);
  assert_eq!(loaded.payment_status, "PENDING");
  let names: Vec<_> = loaded.order_items.iter().map(|i| i.name.as_str()).collect();
  assert_eq!(names, vec!["Kettle", "Mug"]);
  assert_eq!(loaded.order_items[1].price, draft.order_items[1].price);
}

#[tokio::test]
#[serial]
async fn failing_item_insert_rolls_back_the_whole_order() {
  let Some(store) = fresh_store().await else { return };
  let mut draft = sample_draft();
  // Violates the quantity CHECK constraint on the second item.
  draft.order_items[1].quantity = -1;

  let err = store.create_order(&draft).await.unwrap_err();

  assert!(matches!(err, OrderFlowError::Persistence(_)));
  let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(store.pool()).await.unwrap();
  let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items").fetch_one(store.pool()).await.unwrap();
  assert_eq!((orders, items), (0, 0));
}

#[tokio::test]
#[serial]
async fn second_page_of_fifteen_returns_rows_sixteen_to_thirty() {
  let Some(store) = fresh_store().await else { return };
  let mut ids = Vec::new();
  for _ in 0..32 {
    ids.push(store.create_order(&sample_draft()).await.unwrap().id);
  }

  let page = store
    .list_orders(&ListQuery::new(2, 15, SortDirection::Asc, None))
    .await
    .unwrap();

  assert_eq!(page.total, 32);
  let got: Vec<Uuid> = page.orders.iter().map(|o| o.id).collect();
  assert_eq!(got, ids[15..30].to_vec());
  assert!(page.orders.iter().all(|o| o.order_items.len() == 2));
}

#[tokio::test]
#[serial]
async fn search_is_a_literal_case_insensitive_substring() {
  let Some(store) = fresh_store().await else { return };
  let draft = sample_draft();
  let id = store.create_order(&draft).await.unwrap().id;
  store.create_order(&sample_draft()).await.unwrap();

  let needle = id.to_string()[..8].to_uppercase();
  let page = store
    .list_orders(&ListQuery::new(1, 15, SortDirection::Desc, Some(needle.clone())))
    .await
    .unwrap();
  assert!(page.orders.iter().any(|o| o.id == id));

  for term in ["%", "_", "-%-"] {
    let page = store
      .list_orders(&ListQuery::new(1, 15, SortDirection::Desc, Some(term.to_string())))
      .await
      .unwrap();
    assert_eq!(page.total, 0, "{}", term);
    let mine = store
      .list_orders_for_user(draft.user_id, SortDirection::Asc, Some(term))
      .await
      .unwrap();
    assert!(mine.is_empty(), "{}", term);
  }

  let mine = store
    .list_orders_for_user(draft.user_id, SortDirection::Asc, Some(&needle))
    .await
    .unwrap();
  assert_eq!(mine.len(), 1);
}

#[tokio::test]
#[serial]
async fn tracking_and_payment_status_rules_hold() {
  let Some(store) = fresh_store().await else { return };
  let id = store.create_order(&sample_draft()).await.unwrap().id;

  assert!(store.set_tracking_reference(id, "PG-T1").await.unwrap());
  assert!(!store.set_tracking_reference(id, "PG-T2").await.unwrap());
  assert_eq!(store.update_payment_status("PG-T1", "Completed").await.unwrap(), 1);
  assert_eq!(store.update_payment_status("PG-T1", "PENDING").await.unwrap(), 0);
  assert_eq!(store.update_payment_status("unknown", "FAILED").await.unwrap(), 0);

  let order = store.find_order(id).await.unwrap();
  assert_eq!(order.tracking_id.as_deref(), Some("PG-T1"));
  assert_eq!(order.payment_status, "Completed");
}

#[tokio::test]
#[serial]
async fn status_delete_and_undelivered_count() {
  let Some(store) = fresh_store().await else { return };
  let a = store.create_order(&sample_draft()).await.unwrap().id;
  let b = store.create_order(&sample_draft()).await.unwrap().id;

  store.update_status(a, OrderStatus::Completed).await.unwrap();
  assert_eq!(store.count_undelivered().await.unwrap(), 1);

  store.delete_order(b).await.unwrap();
  assert!(matches!(store.find_order(b).await, Err(OrderFlowError::NotFound(_))));
  let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE order_id = $1")
    .bind(b)
    .fetch_one(store.pool())
    .await
    .unwrap();
  assert_eq!(items, 0);
}
