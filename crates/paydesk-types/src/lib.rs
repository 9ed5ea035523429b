//! Paydesk Types - Canonical domain types for the payment review desk
//!
//! This crate contains the foundational types shared by every other paydesk
//! crate, with zero dependencies on them. It defines:
//!
//! - Identity types (AccountId, TransactionId, Role, Actor, Account)
//! - ISO-4217 currency codes
//! - Transaction records, kinds and the status transition table
//! - Field-level validation violations
//! - The injectable clock used for expiry and timestamps
//!
//! # Transaction Lifecycle
//!
//! ```text
//! initialized ──► pending ──┬──► approved
//!                           ├──► rejected
//!                           └──► submitted
//! ```

pub mod identity;
pub mod currency;
pub mod transaction;
pub mod clock;
pub mod error;

pub use identity::*;
pub use currency::*;
pub use transaction::*;
pub use clock::*;
pub use error::*;

/// Upper bound accepted for a single transaction amount, in currency units
pub const MAX_TRANSACTION_AMOUNT: u32 = 1_000_000;
