//! Password Service
//!
//! Argon2id hashing with a random salt per credential and an optional pepper.
//! Plaintext only lives in zeroized buffers for the duration of a call.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use zeroize::Zeroizing;

use crate::config::PasswordConfig;
use crate::error::{AuthError, AuthResult};

/// Symbols accepted in a password besides ASCII letters and digits
pub const PASSWORD_SYMBOLS: &str = "@$!%*?&";

/// Password service for hashing and verification
#[derive(Clone)]
pub struct PasswordService {
    config: PasswordConfig,
}

impl PasswordService {
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    /// Hash a password using Argon2id
    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        self.validate_password_strength(password)?;

        let peppered = self.peppered(password);
        let salt = SaltString::generate(&mut OsRng);

        let params = Params::new(
            self.config.memory_cost,
            self.config.time_cost,
            self.config.parallelism,
            Some(self.config.hash_length as usize),
        )
        .map_err(|e| AuthError::Config(format!("Invalid Argon2 params: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let hash = argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::PasswordHashingFailed)?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash.
    ///
    /// A mismatch is `Ok(false)`; only an unparseable hash is an error.
    pub fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let peppered = self.peppered(password);

        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Stored hash is unreadable: {}", e)))?;

        // Parameters come from the hash string itself
        match Argon2::default().verify_password(peppered.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Internal(format!("Password verification failed: {}", e))),
        }
    }

    /// Every rule the password breaks
    pub fn password_violations(&self, password: &str) -> Vec<String> {
        let mut errors = Vec::new();
        let length = password.chars().count();

        if length < self.config.min_password_length {
            errors.push(format!(
                "Password must be at least {} characters",
                self.config.min_password_length
            ));
        }
        if length > self.config.max_password_length {
            errors.push(format!(
                "Password must be at most {} characters",
                self.config.max_password_length
            ));
        }
        if !password.chars().any(|c| c.is_ascii_alphabetic()) {
            errors.push("Password must contain at least one letter".to_string());
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push("Password must contain at least one digit".to_string());
        }
        if !password.chars().all(is_password_char) {
            errors.push(format!(
                "Password may only contain letters, digits and {}",
                PASSWORD_SYMBOLS
            ));
        }

        errors
    }

    pub fn validate_password_strength(&self, password: &str) -> AuthResult<()> {
        let errors = self.password_violations(password);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AuthError::WeakPassword(errors.join("; ")))
        }
    }

    fn peppered(&self, password: &str) -> Zeroizing<String> {
        match self.config.pepper {
            Some(ref pepper) => Zeroizing::new(format!("{}{}", password, pepper)),
            None => Zeroizing::new(password.to_string()),
        }
    }
}

/// Letters, digits and the accepted symbols
pub fn is_password_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> PasswordConfig {
        PasswordConfig {
            // Use lower values for tests to be fast
            memory_cost: 4096,
            time_cost: 1,
            parallelism: 1,
            hash_length: 32,
            pepper: None,
            min_password_length: 8,
            max_password_length: 128,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let service = PasswordService::new(test_config());
        let password = "Password123";

        let hash = service.hash_password(password).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains(password));

        assert!(service.verify_password(password, &hash).unwrap());
        assert!(!service.verify_password("Password124", &hash).unwrap());
    }

    #[test]
    fn test_hash_with_pepper() {
        let mut config = test_config();
        config.pepper = Some("secret-pepper".to_string());
        let service = PasswordService::new(config);

        let password = "MySecureP@ss123";
        let hash = service.hash_password(password).unwrap();
        assert!(service.verify_password(password, &hash).unwrap());

        let service_no_pepper = PasswordService::new(test_config());
        assert!(!service_no_pepper.verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_password_rules() {
        let service = PasswordService::new(test_config());

        assert!(service.validate_password_strength("Password123").is_ok());
        assert!(service.validate_password_strength("abc12345").is_ok());
        assert!(service.validate_password_strength("P@ss!w0rd").is_ok());

        // Too short
        assert!(service.validate_password_strength("Ab1").is_err());
        // No digit
        assert!(service.validate_password_strength("Passwordonly").is_err());
        // No letter
        assert!(service.validate_password_strength("1234567890").is_err());
        // Disallowed symbol
        assert!(service.validate_password_strength("Password#123").is_err());
        // Too long
        let long = format!("a1{}", "b".repeat(127));
        assert!(service.validate_password_strength(&long).is_err());
    }

    #[test]
    fn test_violations_are_collected() {
        let service = PasswordService::new(test_config());
        let violations = service.password_violations("#");
        // length, letter, digit and charset
        assert_eq!(violations.len(), 4);
    }

    #[test]
    fn test_weak_password_is_not_hashed() {
        let service = PasswordService::new(test_config());
        assert!(matches!(
            service.hash_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_different_passwords_different_hashes() {
        let service = PasswordService::new(test_config());
        let password = "MySecureP@ss123";

        let hash1 = service.hash_password(password).unwrap();
        let hash2 = service.hash_password(password).unwrap();
        assert_ne!(hash1, hash2);

        assert!(service.verify_password(password, &hash1).unwrap());
        assert!(service.verify_password(password, &hash2).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_internal_error() {
        let service = PasswordService::new(test_config());
        assert!(matches!(
            service.verify_password("Password123", "not-a-hash"),
            Err(AuthError::Internal(_))
        ));
    }
}
