//! Data Transfer Objects
//!
//! Request and response bodies for the API. Everything on the wire is
//! camelCase.

pub mod auth;
pub mod common;
pub mod transaction;

pub use auth::*;
pub use common::*;
pub use transaction::*;
