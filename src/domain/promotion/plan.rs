//! Promotion plan catalog.
//!
//! Plans are fixed. Keys are only unique within a scope: `homepage`
//! exists both as an all-gigs plan and as a single-gig plan, at
//! different prices.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::Money;

/// Every plan runs for thirty days.
pub const PROMOTION_DURATION_DAYS: i64 = 30;

/// What a promotion applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionScope {
    /// Every gig owned by the purchasing seller.
    AllGigs,
    /// One gig.
    SingleGig,
}

impl PromotionScope {
    /// Stored `promotion_type` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            PromotionScope::AllGigs => "all_gigs",
            PromotionScope::SingleGig => "single_gig",
        }
    }
}

impl fmt::Display for PromotionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromotionScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all_gigs" => Ok(PromotionScope::AllGigs),
            "single_gig" => Ok(PromotionScope::SingleGig),
            other => Err(format!("unknown promotion type: {}", other)),
        }
    }
}

/// A purchasable plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanDefinition {
    pub key: &'static str,
    pub name: &'static str,
    pub scope: PromotionScope,
    pub price: Money,
    /// Higher sorts first in listings.
    pub priority: i32,
    pub duration_days: i64,
}

impl PlanDefinition {
    const fn new(
        key: &'static str,
        name: &'static str,
        scope: PromotionScope,
        price_units: i64,
        priority: i32,
    ) -> Self {
        Self {
            key,
            name,
            scope,
            price: Money::from_units(price_units),
            priority,
            duration_days: PROMOTION_DURATION_DAYS,
        }
    }

    /// Looks up a plan by key within a scope.
    pub fn find(scope: PromotionScope, key: &str) -> Option<&'static PlanDefinition> {
        let key = key.trim();
        CATALOG
            .iter()
            .find(|plan| plan.scope == scope && plan.key.eq_ignore_ascii_case(key))
    }

    /// All plans, all-gigs first, each scope by descending priority.
    pub fn all() -> &'static [PlanDefinition] {
        CATALOG.as_slice()
    }
}

static CATALOG: Lazy<Vec<PlanDefinition>> = Lazy::new(|| {
    use PromotionScope::*;
    vec![
        PlanDefinition::new("homepage", "Homepage Spotlight", AllGigs, 70, 4),
        PlanDefinition::new("premium", "Premium Boost", AllGigs, 60, 3),
        PlanDefinition::new("standard", "Standard Boost", AllGigs, 50, 2),
        PlanDefinition::new("basic", "Basic Boost", AllGigs, 40, 1),
        PlanDefinition::new("homepage", "Homepage Gig Spotlight", SingleGig, 30, 3),
        PlanDefinition::new("sponsored", "Sponsored Gig", SingleGig, 20, 2),
        PlanDefinition::new("featured", "Featured Gig", SingleGig, 10, 1),
    ]
});

/// Plans available for one scope.
pub fn plans_for_scope(scope: PromotionScope) -> impl Iterator<Item = &'static PlanDefinition> {
    CATALOG.iter().filter(move |plan| plan.scope == scope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_gigs_prices_match_catalog() {
        let prices: Vec<(&str, i64)> = plans_for_scope(PromotionScope::AllGigs)
            .map(|p| (p.key, p.price.cents()))
            .collect();
        assert_eq!(
            prices,
            vec![
                ("homepage", 7_000),
                ("premium", 6_000),
                ("standard", 5_000),
                ("basic", 4_000)
            ]
        );
    }

    #[test]
    fn single_gig_prices_match_catalog() {
        let prices: Vec<(&str, i64)> = plans_for_scope(PromotionScope::SingleGig)
            .map(|p| (p.key, p.price.cents()))
            .collect();
        assert_eq!(
            prices,
            vec![("homepage", 3_000), ("sponsored", 2_000), ("featured", 1_000)]
        );
    }

    #[test]
    fn homepage_key_resolves_per_scope() {
        let all = PlanDefinition::find(PromotionScope::AllGigs, "homepage").unwrap();
        let single = PlanDefinition::find(PromotionScope::SingleGig, "homepage").unwrap();
        assert_eq!(all.price, Money::from_units(70));
        assert_eq!(single.price, Money::from_units(30));
        assert_ne!(all.priority, single.priority);
    }

    #[test]
    fn plan_keys_do_not_cross_scopes() {
        assert!(PlanDefinition::find(PromotionScope::AllGigs, "featured").is_none());
        assert!(PlanDefinition::find(PromotionScope::SingleGig, "basic").is_none());
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        assert!(PlanDefinition::find(PromotionScope::AllGigs, " Basic ").is_some());
    }

    #[test]
    fn every_plan_lasts_thirty_days() {
        assert!(PlanDefinition::all().iter().all(|p| p.duration_days == 30));
    }

    #[test]
    fn priorities_descend_within_scope() {
        for scope in [PromotionScope::AllGigs, PromotionScope::SingleGig] {
            let priorities: Vec<i32> = plans_for_scope(scope).map(|p| p.priority).collect();
            assert!(priorities.windows(2).all(|w| w[0] > w[1]));
        }
    }

    #[test]
    fn scope_round_trips_through_stored_value() {
        for scope in [PromotionScope::AllGigs, PromotionScope::SingleGig] {
            assert_eq!(scope.as_str().parse::<PromotionScope>().unwrap(), scope);
        }
    }
}
