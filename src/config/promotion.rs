//! Promotion workflow configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct PromotionConfig {
    /// How often lapsed promotions are expired and unbadged
    #[serde(default = "default_sweep_interval")]
    pub expiry_sweep_interval_secs: u64,

    /// Link attached to the buyer's activation notification
    #[serde(default = "default_seller_link")]
    pub seller_notification_link: String,

    /// Link attached to the admin's sale notification
    #[serde(default = "default_admin_link")]
    pub admin_notification_link: String,

    /// Rows per batch for the legacy backfill
    #[serde(default = "default_backfill_batch_size")]
    pub backfill_batch_size: u32,
}

impl PromotionConfig {
    pub fn expiry_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.expiry_sweep_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.expiry_sweep_interval_secs < 10 {
            return Err(ValidationError::InvalidInterval("expiry_sweep_interval_secs"));
        }
        if self.backfill_batch_size == 0 || self.backfill_batch_size > 1_000 {
            return Err(ValidationError::InvalidInterval("backfill_batch_size"));
        }
        Ok(())
    }
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            expiry_sweep_interval_secs: default_sweep_interval(),
            seller_notification_link: default_seller_link(),
            admin_notification_link: default_admin_link(),
            backfill_batch_size: default_backfill_batch_size(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_seller_link() -> String {
    "/promote-gigs".to_string()
}

fn default_admin_link() -> String {
    "/admin/promotions".to_string()
}

fn default_backfill_batch_size() -> u32 {
    200
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PromotionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.expiry_sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.seller_notification_link, "/promote-gigs");
    }

    #[test]
    fn test_rejects_tight_sweep_and_bad_batch() {
        let config = PromotionConfig {
            expiry_sweep_interval_secs: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PromotionConfig {
            backfill_batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
