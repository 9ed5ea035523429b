//! Paydesk Lifecycle - the payment and transfer state machine
//!
//! - [`PaymentLifecycle`]: role-gated creation, review and deletion of
//!   transaction records
//! - [`SwiftDirectory`]: static bank directory driving transfer auto-verification
//! - [`validation`]: field rules shared with the HTTP layer

pub mod error;
pub mod lifecycle;
pub mod swift;
pub mod validation;

pub use error::{LifecycleError, LifecycleResult};
pub use lifecycle::PaymentLifecycle;
pub use swift::{SwiftDirectory, SwiftEntry};
pub use validation::{PaymentFields, TransferFields};
