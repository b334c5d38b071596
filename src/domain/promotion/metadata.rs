//! Metadata carried on a promotion payment intent.
//!
//! Initiation writes it, completion reads it back. It is the only link
//! between the two steps, so completion treats it as authoritative.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{GigId, Money, UserId};

use super::{PriceBreakdown, PromotionError, PromotionScope, PromotionTarget, Rate};

const PURPOSE: &str = "purpose";
const PROMOTION_PLAN: &str = "promotion_plan";
const USER_ID: &str = "user_id";
const GIG_ID: &str = "gig_id";
const IS_FOR_ALL: &str = "is_for_all";
const VAT_RATE_BP: &str = "vat_rate_bp";
const BASE_AMOUNT: &str = "base_amount_cents";
const VAT_AMOUNT: &str = "vat_amount_cents";
const PLATFORM_FEE: &str = "platform_fee_cents";
const TOTAL_AMOUNT: &str = "total_amount_cents";

/// Payment purpose recorded on the intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentPurpose {
    /// All-gigs promotion.
    MonthlyPromotion,
    /// Single-gig promotion.
    GigPromotion,
}

impl PaymentPurpose {
    pub fn for_scope(scope: PromotionScope) -> Self {
        match scope {
            PromotionScope::AllGigs => PaymentPurpose::MonthlyPromotion,
            PromotionScope::SingleGig => PaymentPurpose::GigPromotion,
        }
    }

    pub fn scope(&self) -> PromotionScope {
        match self {
            PaymentPurpose::MonthlyPromotion => PromotionScope::AllGigs,
            PaymentPurpose::GigPromotion => PromotionScope::SingleGig,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentPurpose::MonthlyPromotion => "monthly_promotion",
            PaymentPurpose::GigPromotion => "gig_promotion",
        }
    }
}

impl fmt::Display for PaymentPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly_promotion" => Ok(PaymentPurpose::MonthlyPromotion),
            "gig_promotion" => Ok(PaymentPurpose::GigPromotion),
            other => Err(format!("not a promotion payment: {}", other)),
        }
    }
}

/// Typed view of the intent metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionIntentMetadata {
    pub plan_key: String,
    pub user_id: UserId,
    pub target: PromotionTarget,
    pub breakdown: PriceBreakdown,
}

impl PromotionIntentMetadata {
    pub fn purpose(&self) -> PaymentPurpose {
        PaymentPurpose::for_scope(self.target.scope())
    }

    /// Flattens into string pairs for the processor.
    pub fn to_map(&self) -> HashMap<String, String> {
        let b = &self.breakdown;
        let mut map = HashMap::new();
        map.insert(PURPOSE.to_string(), self.purpose().to_string());
        map.insert(PROMOTION_PLAN.to_string(), self.plan_key.clone());
        map.insert(USER_ID.to_string(), self.user_id.to_string());
        map.insert(
            IS_FOR_ALL.to_string(),
            (self.target == PromotionTarget::AllGigs).to_string(),
        );
        if let Some(gig_id) = self.target.gig_id() {
            map.insert(GIG_ID.to_string(), gig_id.to_string());
        }
        map.insert(VAT_RATE_BP.to_string(), b.vat_rate.basis_points().to_string());
        map.insert(BASE_AMOUNT.to_string(), b.base_price.cents().to_string());
        map.insert(VAT_AMOUNT.to_string(), b.vat_amount.cents().to_string());
        map.insert(PLATFORM_FEE.to_string(), b.platform_fee.cents().to_string());
        map.insert(TOTAL_AMOUNT.to_string(), b.total_price.cents().to_string());
        map
    }

    /// True when the map was written for a promotion purchase.
    pub fn is_promotion(map: &HashMap<String, String>) -> bool {
        map.get(PURPOSE)
            .map_or(false, |p| p.parse::<PaymentPurpose>().is_ok())
    }

    /// Parses metadata written by `to_map`.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, PromotionError> {
        let purpose: PaymentPurpose = required(map, PURPOSE)?
            .parse()
            .map_err(|e: String| PromotionError::validation(PURPOSE, e))?;

        let user_id: UserId = required(map, USER_ID)?
            .parse()
            .map_err(|_| PromotionError::validation(USER_ID, "Invalid user id in payment metadata"))?;

        let gig_id = match map.get(GIG_ID).filter(|v| !v.is_empty()) {
            Some(raw) => Some(raw.parse::<GigId>().map_err(|_| {
                PromotionError::validation(GIG_ID, "Invalid gig id in payment metadata")
            })?),
            None => None,
        };

        let target = PromotionTarget::from_parts(purpose.scope(), gig_id)
            .map_err(|reason| PromotionError::validation(GIG_ID, reason))?;

        let vat_rate = u32::try_from(cents(map, VAT_RATE_BP)?)
            .ok()
            .and_then(|bp| Rate::from_basis_points(bp).ok())
            .ok_or_else(|| PromotionError::validation(VAT_RATE_BP, "Invalid VAT rate in payment metadata"))?;

        Ok(Self {
            plan_key: required(map, PROMOTION_PLAN)?.to_string(),
            user_id,
            target,
            breakdown: PriceBreakdown {
                base_price: Money::from_cents(cents(map, BASE_AMOUNT)?),
                vat_rate,
                vat_amount: Money::from_cents(cents(map, VAT_AMOUNT)?),
                platform_fee: Money::from_cents(cents(map, PLATFORM_FEE)?),
                total_price: Money::from_cents(cents(map, TOTAL_AMOUNT)?),
            },
        })
    }
}

fn required<'a>(map: &'a HashMap<String, String>, key: &str) -> Result<&'a str, PromotionError> {
    map.get(key)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| PromotionError::validation(key, format!("Payment metadata is missing '{}'", key)))
}

fn cents(map: &HashMap<String, String>, key: &str) -> Result<i64, PromotionError> {
    let raw = required(map, key)?;
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|v| *v >= 0)
        .ok_or_else(|| PromotionError::validation(key, format!("Invalid amount '{}' in payment metadata", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown() -> PriceBreakdown {
        PriceBreakdown {
            base_price: Money::from_units(40),
            vat_rate: Rate::from_fraction(0.2).unwrap(),
            vat_amount: Money::from_units(8),
            platform_fee: Money::from_units(2),
            total_price: Money::from_units(50),
        }
    }

    #[test]
    fn all_gigs_metadata_round_trips() {
        let meta = PromotionIntentMetadata {
            plan_key: "basic".to_string(),
            user_id: UserId::new(),
            target: PromotionTarget::AllGigs,
            breakdown: breakdown(),
        };
        let map = meta.to_map();

        assert_eq!(map.get("purpose").unwrap(), "monthly_promotion");
        assert_eq!(map.get("is_for_all").unwrap(), "true");
        assert!(!map.contains_key("gig_id"));
        assert_eq!(PromotionIntentMetadata::from_map(&map).unwrap(), meta);
    }

    #[test]
    fn single_gig_metadata_carries_gig() {
        let gig = GigId::new();
        let meta = PromotionIntentMetadata {
            plan_key: "featured".to_string(),
            user_id: UserId::new(),
            target: PromotionTarget::SingleGig(gig),
            breakdown: breakdown(),
        };
        let map = meta.to_map();

        assert_eq!(map.get("purpose").unwrap(), "gig_promotion");
        assert_eq!(map.get("gig_id").unwrap(), &gig.to_string());
        assert_eq!(PromotionIntentMetadata::from_map(&map).unwrap().target, meta.target);
    }

    #[test]
    fn foreign_purpose_is_not_a_promotion() {
        let mut map = HashMap::new();
        map.insert("purpose".to_string(), "order".to_string());
        assert!(!PromotionIntentMetadata::is_promotion(&map));
        assert!(PromotionIntentMetadata::from_map(&map).is_err());
    }

    #[test]
    fn missing_user_is_a_validation_error() {
        let meta = PromotionIntentMetadata {
            plan_key: "basic".to_string(),
            user_id: UserId::new(),
            target: PromotionTarget::AllGigs,
            breakdown: breakdown(),
        };
        let mut map = meta.to_map();
        map.remove("user_id");

        match PromotionIntentMetadata::from_map(&map) {
            Err(PromotionError::ValidationFailed { field, .. }) => assert_eq!(field, "user_id"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn negative_amount_is_rejected() {
        let meta = PromotionIntentMetadata {
            plan_key: "basic".to_string(),
            user_id: UserId::new(),
            target: PromotionTarget::AllGigs,
            breakdown: breakdown(),
        };
        let mut map = meta.to_map();
        map.insert("platform_fee_cents".to_string(), "-5".to_string());
        assert!(PromotionIntentMetadata::from_map(&map).is_err());
    }
}
