//! API Handlers
//!
//! Thin adapters from HTTP to the auth service and the payment lifecycle.

pub mod auth;
pub mod health;
pub mod transactions;

pub use health::*;
