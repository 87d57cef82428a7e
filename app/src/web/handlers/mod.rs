// orderflow_server/src/web/handlers/mod.rs

pub mod notification_handlers;
pub mod order_handlers;
