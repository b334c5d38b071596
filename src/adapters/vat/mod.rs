//! VAT rate lookup backed by configuration.
//!
//! Rates come from `pricing.country_vat_rates`, keyed by ISO country code.
//! Buyers without a country, or from a country not listed, pay the
//! configured default rate.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::promotion::Rate;
use crate::domain::user::User;
use crate::ports::VatRateProvider;

#[derive(Debug, Clone)]
pub struct ConfiguredVatRates {
    default_rate: Rate,
    by_country: HashMap<String, Rate>,
}

impl ConfiguredVatRates {
    pub fn new(default_rate: Rate, by_country: HashMap<String, Rate>) -> Self {
        let by_country = by_country
            .into_iter()
            .map(|(code, rate)| (code.trim().to_ascii_uppercase(), rate))
            .collect();
        Self {
            default_rate,
            by_country,
        }
    }

    pub fn rate_for_country(&self, country_code: Option<&str>) -> Rate {
        country_code
            .map(|code| code.trim().to_ascii_uppercase())
            .and_then(|code| self.by_country.get(&code).copied())
            .unwrap_or(self.default_rate)
    }
}

#[async_trait]
impl VatRateProvider for ConfiguredVatRates {
    async fn vat_rate_for(&self, user: &User) -> Result<Rate, DomainError> {
        Ok(self.rate_for_country(user.country_code.as_deref()))
    }
}
