//! Demo accounts
//!
//! Two employees and two customers, all with the password `Password123`.
//! Seeding skips account numbers that already exist, so it is safe on every
//! start.

use paydesk_auth::{AuthError, AuthService, Registration};
use paydesk_types::Role;

pub const DEMO_PASSWORD: &str = "Password123";

/// (full name, account number, id number, role)
pub const DEMO_ACCOUNTS: [(&str, &str, &str, Role); 4] = [
    ("Thabo Mokoena", "100000000001", "1234567890123", Role::Employee),
    ("Lerato Dlamini", "100000000002", "1234567890124", Role::Employee),
    ("Itumeleng Ndlovu", "200000000001", "1234567890125", Role::Customer),
    ("Ndelisiwe Khumalo", "200000000002", "1234567890126", Role::Customer),
];

/// Insert missing demo accounts; returns how many were created
pub async fn seed_demo_accounts(auth: &AuthService) -> Result<usize, AuthError> {
    let mut created = 0;

    for (full_name, account_number, id_number, role) in DEMO_ACCOUNTS {
        let registration = Registration {
            full_name: full_name.to_string(),
            id_number: id_number.to_string(),
            account_number: account_number.to_string(),
            password: DEMO_PASSWORD.to_string(),
        };

        match auth.provision(&registration, role).await {
            Ok(actor) => {
                tracing::info!(actor_id = %actor.id, role = role.as_str(), "Demo account seeded");
                created += 1;
            }
            Err(AuthError::AccountExists) => {
                tracing::debug!(account_number, "Demo account already present");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(created)
}
