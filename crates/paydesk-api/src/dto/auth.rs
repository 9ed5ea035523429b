//! Authentication DTOs

use chrono::{DateTime, Utc};
use paydesk_auth::{PasswordService, Registration, Session};
use paydesk_lifecycle::validation::{self, Violations};
use paydesk_types::{Actor, FieldViolation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// =============================================================================
// Registration
// =============================================================================

/// Registration request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Letters and spaces, 2-50 characters
    pub full_name: String,
    /// 13 digits
    pub id_number: String,
    /// 10-12 digits
    pub account_number: String,
    /// At least 8 characters with a letter and a digit
    pub password: String,
}

impl RegisterRequest {
    /// Every violated rule across the account fields and the password
    pub fn violations(&self, passwords: &PasswordService) -> Vec<FieldViolation> {
        let mut violations = Violations::new();
        violations.extend(validation::account_violations(
            &self.full_name,
            &self.id_number,
            &self.account_number,
        ));
        for message in passwords.password_violations(&self.password) {
            violations.push("password", message);
        }
        violations.into_vec()
    }

    pub fn into_registration(self) -> Registration {
        Registration {
            full_name: self.full_name.trim().to_string(),
            id_number: self.id_number.trim().to_string(),
            account_number: self.account_number.trim().to_string(),
            password: self.password,
        }
    }
}

// =============================================================================
// Login
// =============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Account number is required"))]
    pub account_number: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

// =============================================================================
// Responses
// =============================================================================

/// Public view of an account holder
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActorResponse {
    pub id: String,
    pub display_name: String,
    pub account_number: String,
    /// customer or employee
    pub role: String,
}

impl From<Actor> for ActorResponse {
    fn from(actor: Actor) -> Self {
        Self {
            id: actor.id.to_string(),
            display_name: actor.display_name,
            account_number: actor.account_number,
            role: actor.role.as_str().to_string(),
        }
    }
}

/// Token issued by register or login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    /// Always `Bearer`
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub account: ActorResponse,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token.token,
            token_type: session.token.token_type,
            expires_at: session.token.expires_at,
            account: session.actor.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paydesk_auth::PasswordConfig;

    fn passwords() -> PasswordService {
        PasswordService::new(PasswordConfig::default())
    }

    #[test]
    fn test_register_collects_all_fields() {
        let request = RegisterRequest {
            full_name: "J".to_string(),
            id_number: "123".to_string(),
            account_number: "12".to_string(),
            password: "short".to_string(),
        };
        let fields: Vec<_> = request
            .violations(&passwords())
            .into_iter()
            .map(|v| v.field)
            .collect();

        assert!(fields.contains(&"fullName".to_string()));
        assert!(fields.contains(&"idNumber".to_string()));
        assert!(fields.contains(&"accountNumber".to_string()));
        assert!(fields.contains(&"password".to_string()));
    }

    #[test]
    fn test_valid_registration() {
        let request = RegisterRequest {
            full_name: " Itumeleng Ndlovu ".to_string(),
            id_number: "1234567890125".to_string(),
            account_number: "200000000001".to_string(),
            password: "Password123".to_string(),
        };
        assert!(request.violations(&passwords()).is_empty());
        assert_eq!(request.into_registration().full_name, "Itumeleng Ndlovu");
    }

    #[test]
    fn test_login_requires_every_field() {
        let request = LoginRequest {
            account_number: String::new(),
            full_name: "Thabo Mokoena".to_string(),
            password: String::new(),
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 2);
    }
}
