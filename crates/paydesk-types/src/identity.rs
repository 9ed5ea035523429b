//! Identity types for Paydesk
//!
//! Ids are strongly typed wrappers around UUIDs so an account id can never be
//! passed where a transaction id is expected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::TypesError;

/// Macro to generate ID types with common implementations
macro_rules! define_id_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse from a string
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s.trim())?))
            }

            /// Get the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id_type!(AccountId, "Unique identifier for a bank account holder");
define_id_type!(TransactionId, "Unique identifier for a payment or transfer record");

/// Role of an account holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Bank customer; initiates payments and transfers
    Customer,
    /// Bank employee; reviews and finalizes transactions
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Employee => "employee",
        }
    }

    pub fn is_employee(&self) -> bool {
        matches!(self, Self::Employee)
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Customer
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "employee" => Ok(Self::Employee),
            other => Err(TypesError::UnknownRole(other.to_string())),
        }
    }
}

/// A registered account holder.
///
/// `account_number` is unique and never reassigned. The credential is only
/// ever held as a salted one-way hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub display_name: String,
    pub id_number: String,
    pub account_number: String,
    #[serde(skip_serializing)]
    pub credential_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Data required to create an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub display_name: String,
    pub id_number: String,
    pub account_number: String,
    pub credential_hash: String,
    pub role: Role,
}

/// Resolved identity of the caller for a single request.
///
/// Built from a verified credential plus a fresh account lookup; carries no
/// secret material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: AccountId,
    pub display_name: String,
    pub account_number: String,
    pub role: Role,
}

impl Actor {
    pub fn is_employee(&self) -> bool {
        self.role.is_employee()
    }

    /// Whether this actor may see records belonging to `account_number`
    pub fn can_view_account(&self, account_number: &str) -> bool {
        self.is_employee() || self.account_number == account_number
    }
}

impl From<&Account> for Actor {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            display_name: account.display_name.clone(),
            account_number: account.account_number.clone(),
            role: account.role,
        }
    }
}
