//! Pricing configuration

use serde::Deserialize;
use std::collections::HashMap;

use crate::domain::promotion::Rate;

use super::error::ValidationError;

/// Platform fee and VAT rates, as fractions (`0.05` = 5%).
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    /// Marketplace cut added on top of base + VAT
    #[serde(default = "default_platform_fee_rate")]
    pub platform_fee_rate: f64,

    /// VAT applied when the buyer's country has no entry
    #[serde(default)]
    pub default_vat_rate: f64,

    /// Per-country VAT, e.g. `DE=0.19,FR=0.2`
    pub country_vat_rates: Option<String>,
}

impl PricingConfig {
    pub fn platform_fee(&self) -> Result<Rate, ValidationError> {
        to_rate("platform_fee_rate", self.platform_fee_rate)
    }

    pub fn default_vat(&self) -> Result<Rate, ValidationError> {
        to_rate("default_vat_rate", self.default_vat_rate)
    }

    /// Parses `country_vat_rates` into upper-cased country codes.
    pub fn country_rates(&self) -> Result<HashMap<String, Rate>, ValidationError> {
        let Some(raw) = self.country_vat_rates.as_deref() else {
            return Ok(HashMap::new());
        };

        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let invalid = || ValidationError::InvalidRate {
                    field: "country_vat_rates",
                    value: entry.to_string(),
                };
                let (code, rate) = entry.split_once('=').ok_or_else(invalid)?;
                let code = code.trim().to_ascii_uppercase();
                if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(invalid());
                }
                let fraction: f64 = rate.trim().parse().map_err(|_| invalid())?;
                let rate = Rate::from_fraction(fraction).map_err(|_| invalid())?;
                Ok((code, rate))
            })
            .collect()
    }

    /// Validate pricing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.platform_fee()?;
        self.default_vat()?;
        self.country_rates()?;
        Ok(())
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            platform_fee_rate: default_platform_fee_rate(),
            default_vat_rate: 0.0,
            country_vat_rates: None,
        }
    }
}

fn to_rate(field: &'static str, fraction: f64) -> Result<Rate, ValidationError> {
    Rate::from_fraction(fraction).map_err(|_| ValidationError::InvalidRate {
        field,
        value: fraction.to_string(),
    })
}

fn default_platform_fee_rate() -> f64 {
    0.05
}
