//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `NORETMY` prefix and
//! `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use noretmy::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod error;
mod payment;
mod pricing;
mod promotion;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use pricing::PricingConfig;
pub use promotion::PromotionConfig;
pub use server::{Environment, LogFormat, ServerConfig};

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Access-token verification
    pub auth: AuthConfig,

    /// Payment configuration (Stripe)
    pub payment: PaymentConfig,

    /// Platform fee and VAT
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Expiry sweep, notification links, backfill
    #[serde(default)]
    pub promotion: PromotionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present (development)
    /// 2. Reads variables with the `NORETMY` prefix
    /// 3. Splits nested keys on `__`
    ///
    /// - `NORETMY__SERVER__PORT=5000` -> `server.port = 5000`
    /// - `NORETMY__PRICING__COUNTRY_VAT_RATES=DE=0.19` -> `pricing.country_vat_rates`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or a value
    /// cannot be parsed into its field type.
    pub fn load() -> Result<Self, ConfigError> {
        load_sections()
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.payment.validate()?;
        self.pricing.validate()?;
        self.promotion.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

/// Deserializes any subset of the sections from the environment.
///
/// Tools that only touch the database use this to avoid requiring the
/// payment and auth secrets the server needs.
pub fn load_sections<T: DeserializeOwned>() -> Result<T, ConfigError> {
    dotenvy::dotenv().ok();

    let config = config::Config::builder()
        .add_source(
            config::Environment::default()
                .prefix("NORETMY")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?
        .try_deserialize()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const MINIMAL: [(&str, &str); 4] = [
        ("NORETMY__DATABASE__URL", "postgresql://test@localhost/noretmy"),
        ("NORETMY__AUTH__JWT_SECRET", "dev-secret"),
        ("NORETMY__PAYMENT__STRIPE_API_KEY", "sk_test_xxx"),
        ("NORETMY__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_xxx"),
    ];

    const EXTRA: [&str; 4] = [
        "NORETMY__SERVER__PORT",
        "NORETMY__SERVER__ENVIRONMENT",
        "NORETMY__PRICING__PLATFORM_FEE_RATE",
        "NORETMY__PRICING__COUNTRY_VAT_RATES",
    ];

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        for (key, value) in MINIMAL.iter().chain(extra) {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        for (key, _) in MINIMAL {
            env::remove_var(key);
        }
        for key in EXTRA {
            env::remove_var(key);
        }
        result
    }

    #[test]
    fn test_load_minimal_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[]).unwrap();

        assert_eq!(config.database.url, "postgresql://test@localhost/noretmy");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.payment.currency, "usd");
        assert_eq!(config.promotion.expiry_sweep_interval_secs, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_are_applied() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[
            ("NORETMY__SERVER__PORT", "3000"),
            ("NORETMY__PRICING__PLATFORM_FEE_RATE", "0.1"),
            ("NORETMY__PRICING__COUNTRY_VAT_RATES", "DE=0.19"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.pricing.platform_fee().unwrap().basis_points(), 1_000);
        assert_eq!(config.pricing.country_rates().unwrap()["DE"].basis_points(), 1_900);
    }

    #[test]
    fn test_load_sections_reads_a_subset() {
        #[derive(Deserialize)]
        struct DatabaseOnly {
            database: DatabaseConfig,
        }

        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("NORETMY__DATABASE__URL", "postgresql://only@localhost/noretmy");
        let loaded: Result<DatabaseOnly, ConfigError> = load_sections();
        env::remove_var("NORETMY__DATABASE__URL");

        assert_eq!(loaded.unwrap().database.url, "postgresql://only@localhost/noretmy");
    }

    #[test]
    fn test_production_rejects_short_jwt_secret() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[("NORETMY__SERVER__ENVIRONMENT", "production")]).unwrap();

        assert!(config.is_production());
        assert_eq!(config.validate(), Err(ValidationError::WeakJwtSecret));
    }
}
