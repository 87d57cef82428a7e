// orderflow_server/src/state.rs
use crate::config::AppConfig;
use orderflow::{NotificationHandler, OrderStore, OrderWorkflow, PaymentGateway};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn OrderStore>,
  pub workflow: Arc<OrderWorkflow>,
  pub notifications: Arc<NotificationHandler>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires both workflows to the same store and gateway handles.
  pub fn new(store: Arc<dyn OrderStore>, gateway: Arc<dyn PaymentGateway>, config: AppConfig) -> Self {
    let workflow = OrderWorkflow::new(store.clone(), gateway.clone(), config.payment_settings());
    let notifications = NotificationHandler::new(store.clone(), gateway);
    Self {
      store,
      workflow: Arc::new(workflow),
      notifications: Arc::new(notifications),
      config: Arc::new(config),
    }
  }
}
