// orderflow_server/src/lib.rs

//! HTTP surface for the order workflow: actix-web routes, configuration,
//! bearer-token verification and error mapping.

pub mod auth;
pub mod config;
pub mod errors;
pub mod state;
pub mod web;
