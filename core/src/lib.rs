// src/lib.rs

//! Orderflow: the order placement and payment-confirmation workflow of a shop backend.
//!
//! The crate covers:
//!  - Order and order-item persistence behind the [`OrderStore`] trait (Postgres or in-memory).
//!  - A [`PaymentGateway`] trait with a Pesapal REST implementation.
//!  - A small named-step async [`Pipeline`] runner.
//!  - [`OrderWorkflow`], which persists an order and hands the customer a payment redirect.
//!  - [`NotificationHandler`], which reconciles payment status when the gateway calls back.

pub mod error;
pub mod gateway;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod workflow;

// --- Re-exports for the public API ---

pub use crate::error::{GatewayError, OrderFlowError, Result};

pub use crate::models::{NewOrderItem, Order, OrderDraft, OrderItem, OrderStatus};

pub use crate::store::{InMemoryOrderStore, ListQuery, OrderPage, OrderStore, PageMetadata, PgOrderStore, SortDirection};

pub use crate::gateway::{
  AccessToken, PaymentGateway, PaymentRedirect, PaymentRequest, PaymentSettings, PaymentStatusReport,
  PesapalClient, PesapalConfig,
};

pub use crate::pipeline::{ContextData, Pipeline, PipelineError, PipelineOutcome, StepControl};

pub use crate::workflow::{
  NotificationAck, NotificationHandler, NotificationOutcome, OrderWorkflow, PaymentNotification, PlacedOrder,
  WorkflowStage,
};
