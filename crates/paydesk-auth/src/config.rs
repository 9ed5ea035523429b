//! Authentication configuration
//!
//! Everything the identity gate, credential hashing and abuse guard need is
//! handed in through these structs at construction time.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Password hashing configuration
    pub password: PasswordConfig,
    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
}

/// JWT token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// HMAC secret for signing tokens (at least 256 bits)
    pub secret: String,
    /// How long an issued token stays valid
    #[serde(with = "humantime_serde")]
    pub token_lifetime: Duration,
    /// Token issuer claim
    pub issuer: String,
    /// Token audience claim
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set in production
            token_lifetime: Duration::from_secs(24 * 60 * 60),
            issuer: "paydesk".to_string(),
            audience: "paydesk-api".to_string(),
        }
    }
}

/// Password hashing configuration (Argon2id)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    /// Memory cost in KiB (OWASP recommends 19456 KiB = 19 MiB minimum)
    pub memory_cost: u32,
    /// Time cost (iterations) - OWASP recommends 2 minimum
    pub time_cost: u32,
    /// Parallelism factor
    pub parallelism: u32,
    /// Output hash length in bytes
    pub hash_length: u32,
    /// Pepper (additional secret, optional)
    pub pepper: Option<String>,
    /// Minimum password length
    pub min_password_length: usize,
    /// Maximum password length (to prevent DoS)
    pub max_password_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 19456,
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
            pepper: None,
            min_password_length: 8,
            max_password_length: 128,
        }
    }
}

/// Threshold and window for one rate-limit bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketLimit {
    /// Requests admitted per window
    pub limit: u32,
    /// Sliding window length
    #[serde(with = "humantime_serde")]
    pub window: Duration,
}

impl BucketLimit {
    pub const fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

const FIFTEEN_MINUTES: Duration = Duration::from_secs(15 * 60);

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// When false every request is admitted
    pub enabled: bool,
    /// Ordinary authenticated traffic
    pub general: BucketLimit,
    /// Payment and transfer creation
    pub payment_create: BucketLimit,
    /// Login and registration attempts
    pub auth: BucketLimit,
    /// Key clients on `CF-Connecting-IP`, `X-Real-IP` and `X-Forwarded-For`.
    /// Only enable behind a proxy that overwrites these headers.
    pub trust_proxy_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general: BucketLimit::new(100, FIFTEEN_MINUTES),
            payment_create: BucketLimit::new(20, FIFTEEN_MINUTES),
            auth: BucketLimit::new(10, FIFTEEN_MINUTES),
            trust_proxy_headers: false,
        }
    }
}

impl AuthConfig {
    /// Validate the configuration, reporting every problem found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.jwt.secret.is_empty() {
            errors.push("JWT secret must be set".to_string());
        } else if self.jwt.secret.len() < 32 {
            errors.push("JWT secret should be at least 256 bits (32 bytes)".to_string());
        }
        if self.jwt.token_lifetime.is_zero() {
            errors.push("JWT token lifetime must be greater than zero".to_string());
        }

        if self.password.memory_cost < 19456 {
            errors.push("Argon2 memory cost should be at least 19456 KiB (OWASP recommendation)".to_string());
        }
        if self.password.time_cost < 2 {
            errors.push("Argon2 time cost should be at least 2 (OWASP recommendation)".to_string());
        }
        if self.password.min_password_length > self.password.max_password_length {
            errors.push("Minimum password length exceeds the maximum".to_string());
        }

        for (name, bucket) in [
            ("general", self.rate_limit.general),
            ("payment_create", self.rate_limit.payment_create),
            ("auth", self.rate_limit.auth),
        ] {
            if bucket.limit == 0 || bucket.window.is_zero() {
                errors.push(format!("Rate limit bucket {name} needs a non-zero limit and window"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
