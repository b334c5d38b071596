//! Price breakdown for promotion purchases.
//!
//! `total = base + vat + platform_fee`, each component rounded half-up to
//! the cent independently. Rates are held in basis points so equal inputs
//! always produce equal breakdowns.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::foundation::Money;

const BASIS_POINTS: i128 = 10_000;

/// A percentage in basis points (1 bp = 0.01 %), between 0 and 100 %.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(u32);

impl Rate {
    pub const ZERO: Rate = Rate(0);

    pub fn from_basis_points(bp: u32) -> Result<Self, PricingError> {
        if bp as i128 > BASIS_POINTS {
            return Err(PricingError::InvalidRate(bp as f64 / BASIS_POINTS as f64));
        }
        Ok(Self(bp))
    }

    /// Converts a fraction such as `0.2` into a rate.
    pub fn from_fraction(fraction: f64) -> Result<Self, PricingError> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(PricingError::InvalidRate(fraction));
        }
        Ok(Self((fraction * BASIS_POINTS as f64).round() as u32))
    }

    pub fn basis_points(&self) -> u32 {
        self.0
    }

    pub fn as_fraction(&self) -> f64 {
        self.0 as f64 / BASIS_POINTS as f64
    }

    /// `amount × rate`, rounded half-up to the cent.
    fn apply(&self, amount: Money) -> Result<Money, PricingError> {
        let product = (amount.cents() as i128) * (self.0 as i128);
        let rounded = (product + BASIS_POINTS / 2) / BASIS_POINTS;
        i64::try_from(rounded)
            .map(Money::from_cents)
            .map_err(|_| PricingError::Overflow)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_fraction())
    }
}

/// Why a breakdown could not be computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("rate {0} is outside 0..=1")]
    InvalidRate(f64),

    #[error("amount must not be negative, got {0}")]
    NegativeAmount(Money),

    #[error("price computation overflowed")]
    Overflow,
}

/// What the buyer is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base_price: Money,
    pub vat_rate: Rate,
    pub vat_amount: Money,
    pub platform_fee: Money,
    pub total_price: Money,
}

/// Marketplace-wide pricing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub platform_fee_rate: Rate,
}

impl PricingPolicy {
    pub fn new(platform_fee_rate: Rate) -> Self {
        Self { platform_fee_rate }
    }

    /// Computes the breakdown for a plan price at the buyer's VAT rate.
    pub fn breakdown(&self, base: Money, vat_rate: Rate) -> Result<PriceBreakdown, PricingError> {
        if base.cents() < 0 {
            return Err(PricingError::NegativeAmount(base));
        }

        let vat_amount = vat_rate.apply(base)?;
        let platform_fee = self.platform_fee_rate.apply(base)?;
        let total_price = base
            .checked_add(vat_amount)
            .and_then(|sum| sum.checked_add(platform_fee))
            .ok_or(PricingError::Overflow)?;

        Ok(PriceBreakdown {
            base_price: base,
            vat_rate,
            vat_amount,
            platform_fee,
            total_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn policy(fee: f64) -> PricingPolicy {
        PricingPolicy::new(Rate::from_fraction(fee).unwrap())
    }

    #[test]
    fn basic_plan_at_twenty_percent_vat() {
        let breakdown = policy(0.05)
            .breakdown(Money::from_units(40), Rate::from_fraction(0.2).unwrap())
            .unwrap();

        assert_eq!(breakdown.base_price, Money::from_units(40));
        assert_eq!(breakdown.vat_amount, Money::from_units(8));
        assert_eq!(breakdown.platform_fee, Money::from_units(2));
        assert_eq!(
            breakdown.total_price,
            Money::from_units(48).checked_add(breakdown.platform_fee).unwrap()
        );
    }

    #[test]
    fn zero_fee_policy_charges_base_plus_vat() {
        let breakdown = policy(0.0)
            .breakdown(Money::from_units(10), Rate::from_fraction(0.19).unwrap())
            .unwrap();
        assert_eq!(breakdown.vat_amount, Money::from_cents(190));
        assert_eq!(breakdown.platform_fee, Money::ZERO);
        assert_eq!(breakdown.total_price, Money::from_cents(1_190));
    }

    #[test]
    fn rounds_half_up_to_the_cent() {
        // 0.05 × 0.10 = 0.005 → 0.01
        let breakdown = policy(0.10)
            .breakdown(Money::from_cents(5), Rate::ZERO)
            .unwrap();
        assert_eq!(breakdown.platform_fee, Money::from_cents(1));
    }

    #[test]
    fn rejects_rates_outside_unit_interval() {
        assert!(Rate::from_fraction(-0.01).is_err());
        assert!(Rate::from_fraction(1.01).is_err());
        assert!(Rate::from_fraction(f64::NAN).is_err());
        assert!(Rate::from_basis_points(10_001).is_err());
        assert!(Rate::from_fraction(1.0).is_ok());
    }

    #[test]
    fn rejects_negative_base() {
        let err = policy(0.05)
            .breakdown(Money::from_cents(-1), Rate::ZERO)
            .unwrap_err();
        assert_eq!(err, PricingError::NegativeAmount(Money::from_cents(-1)));
    }

    #[test]
    fn overflow_is_an_error_not_a_wrap() {
        let err = policy(1.0)
            .breakdown(Money::from_cents(i64::MAX), Rate::from_fraction(1.0).unwrap())
            .unwrap_err();
        assert_eq!(err, PricingError::Overflow);
    }

    #[test]
    fn fraction_round_trips_for_common_rates() {
        for fraction in [0.0, 0.05, 0.19, 0.2, 0.25] {
            assert_eq!(Rate::from_fraction(fraction).unwrap().as_fraction(), fraction);
        }
    }

    proptest! {
        #[test]
        fn total_is_sum_of_components(base in 0i64..10_000_000, vat_bp in 0u32..=10_000, fee_bp in 0u32..=10_000) {
            let policy = PricingPolicy::new(Rate::from_basis_points(fee_bp).unwrap());
            let b = policy.breakdown(Money::from_cents(base), Rate::from_basis_points(vat_bp).unwrap()).unwrap();
            prop_assert_eq!(
                b.total_price.cents(),
                b.base_price.cents() + b.vat_amount.cents() + b.platform_fee.cents()
            );
            prop_assert!(b.vat_amount.cents() <= base);
            prop_assert!(b.platform_fee.cents() <= base);
        }

        #[test]
        fn breakdown_is_deterministic(base in 0i64..10_000_000, vat_bp in 0u32..=10_000) {
            let policy = PricingPolicy::new(Rate::from_basis_points(500).unwrap());
            let vat = Rate::from_basis_points(vat_bp).unwrap();
            prop_assert_eq!(
                policy.breakdown(Money::from_cents(base), vat),
                policy.breakdown(Money::from_cents(base), vat)
            );
        }
    }
}
