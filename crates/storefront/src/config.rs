//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BAZAAR_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `BAZAAR_HOST` - Bind address (default: 127.0.0.1)
//! - `BAZAAR_PORT` - Listen port (default: 3000)
//! - `BAZAAR_TAX_RATE` - Tax rate as a decimal fraction (default: 0.18)
//! - `BAZAAR_FREE_SHIPPING_THRESHOLD` - Subtotal for free shipping (default: 500.00)
//! - `BAZAAR_SHIPPING_FEE` - Flat shipping fee (default: 50.00)
//! - `BAZAAR_DEMO_MAX_SESSIONS` - Cap on live demo sessions (default: 10000)
//! - `BAZAAR_DEMO_IDLE_TTL_SECS` - Idle lifetime of a demo session (default: 7200)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

use bazaar_core::Money;

use crate::demo::{DEFAULT_IDLE_TTL, DEFAULT_MAX_SESSIONS, DemoSessionConfig};
use crate::services::CheckoutPricing;
use crate::services::pricing::{
    DEFAULT_FREE_SHIPPING_THRESHOLD, DEFAULT_SHIPPING_FEE, DEFAULT_TAX_RATE,
};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shipping and tax constants
    pub pricing: CheckoutPricing,
    /// Demo session cache sizing
    pub demo: DemoSessionConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_source(source: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(source);

        let database_url = env.database_url("BAZAAR_DATABASE_URL")?;
        let host = env.parse_or("BAZAAR_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or("BAZAAR_PORT", 3000u16)?;

        let pricing = CheckoutPricing {
            tax_rate: env.parse_or::<Decimal>("BAZAAR_TAX_RATE", DEFAULT_TAX_RATE)?,
            free_shipping_threshold: env.parse_or::<Money>(
                "BAZAAR_FREE_SHIPPING_THRESHOLD",
                DEFAULT_FREE_SHIPPING_THRESHOLD,
            )?,
            shipping_fee: env.parse_or::<Money>("BAZAAR_SHIPPING_FEE", DEFAULT_SHIPPING_FEE)?,
        };
        if pricing.tax_rate.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "BAZAAR_TAX_RATE".to_string(),
                "must not be negative".to_string(),
            ));
        }

        let demo = DemoSessionConfig {
            max_sessions: env.nonzero_or("BAZAAR_DEMO_MAX_SESSIONS", DEFAULT_MAX_SESSIONS)?,
            idle_ttl: Duration::from_secs(
                env.nonzero_or("BAZAAR_DEMO_IDLE_TTL_SECS", DEFAULT_IDLE_TTL.as_secs())?,
            ),
        };

        Ok(Self {
            database_url,
            host,
            port,
            pricing,
            demo,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }

    /// Parse a variable, or use `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Like [`Self::parse_or`], rejecting zero. A zero-sized demo cache keeps no sessions.
    fn nonzero_or(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        match self.parse_or(key, default)? {
            0 => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be greater than zero".to_string(),
            )),
            value => Ok(value),
        }
    }
}
