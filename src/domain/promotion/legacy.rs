//! Records from the legacy `promotions` table.
//!
//! New code never writes these. The backfill job copies each one into
//! `promotion_purchases` exactly once, keyed by the legacy id.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GigId, Money, PromotionId, Timestamp, UserId};

use super::{
    PlanDefinition, PromotionCharges, PromotionError, PromotionPurchase, PromotionScope,
    PromotionStatus, PromotionTarget, PROMOTION_DURATION_DAYS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyPromotionStatus {
    Pending,
    Active,
    Cancelled,
    Expired,
}

impl LegacyPromotionStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "cancelled" => Some(Self::Cancelled),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

impl From<LegacyPromotionStatus> for PromotionStatus {
    fn from(status: LegacyPromotionStatus) -> Self {
        match status {
            LegacyPromotionStatus::Pending => PromotionStatus::Pending,
            LegacyPromotionStatus::Active => PromotionStatus::Active,
            LegacyPromotionStatus::Cancelled => PromotionStatus::Cancelled,
            LegacyPromotionStatus::Expired => PromotionStatus::Expired,
        }
    }
}

/// A row of the legacy table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyPromotion {
    pub id: String,
    pub user_id: UserId,
    pub gig_id: Option<GigId>,
    pub is_for_all: bool,
    pub promotion_plan: String,
    pub status: LegacyPromotionStatus,
    pub promotion_start_date: Option<Timestamp>,
    pub promotion_end_date: Option<Timestamp>,
    pub amount_paid: Money,
    pub created_at: Timestamp,
}

impl LegacyPromotion {
    pub fn scope(&self) -> PromotionScope {
        if self.is_for_all {
            PromotionScope::AllGigs
        } else {
            PromotionScope::SingleGig
        }
    }

    /// Converts into the authoritative purchase shape.
    ///
    /// Unknown plan keys are kept verbatim with priority 0 so that the
    /// record survives even if the catalog has since changed.
    pub fn to_purchase(&self) -> Result<PromotionPurchase, PromotionError> {
        let scope = self.scope();
        let target = PromotionTarget::from_parts(scope, self.gig_id)
            .map_err(|reason| PromotionError::validation("gig_id", reason))?;

        let (plan_name, plan_priority) = match PlanDefinition::find(scope, &self.promotion_plan) {
            Some(plan) => (plan.name.to_string(), plan.priority),
            None => (self.promotion_plan.clone(), 0),
        };

        let duration_days = match (self.promotion_start_date, self.promotion_end_date) {
            (Some(start), Some(end)) if end.is_after(&start) => end.duration_since(&start).num_days(),
            _ => PROMOTION_DURATION_DAYS,
        };

        let purchased_at = self.promotion_start_date.unwrap_or(self.created_at);

        Ok(PromotionPurchase {
            id: PromotionId::new(),
            legacy_promotion_id: Some(self.id.clone()),
            stripe_payment_intent_id: None,
            user_id: self.user_id,
            plan_key: self.promotion_plan.trim().to_ascii_lowercase(),
            plan_name,
            plan_priority,
            target,
            status: self.status.into(),
            purchased_at,
            activated_at: self.promotion_start_date,
            expires_at: self.promotion_end_date,
            charges: PromotionCharges {
                base_amount: self.amount_paid,
                total_amount: self.amount_paid,
                ..PromotionCharges::default()
            },
            duration_days,
            created_at: self.created_at,
            updated_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    fn legacy_gig_promotion() -> LegacyPromotion {
        LegacyPromotion {
            id: "64b7f0c2e4b0a1a2b3c4d5e6".to_string(),
            user_id: UserId::new(),
            gig_id: Some(GigId::new()),
            is_for_all: false,
            promotion_plan: "sponsored".to_string(),
            status: LegacyPromotionStatus::Active,
            promotion_start_date: Some(at(0)),
            promotion_end_date: Some(at(30 * 86_400)),
            amount_paid: Money::from_units(20),
            created_at: at(0),
        }
    }

    #[test]
    fn converts_single_gig_promotion() {
        let legacy = legacy_gig_promotion();
        let purchase = legacy.to_purchase().unwrap();

        assert_eq!(purchase.legacy_promotion_id.as_deref(), Some(legacy.id.as_str()));
        assert_eq!(purchase.stripe_payment_intent_id, None);
        assert_eq!(purchase.target, PromotionTarget::SingleGig(legacy.gig_id.unwrap()));
        assert_eq!(purchase.plan_name, "Sponsored Gig");
        assert_eq!(purchase.plan_priority, 2);
        assert_eq!(purchase.status, PromotionStatus::Active);
        assert_eq!(purchase.expires_at, legacy.promotion_end_date);
        assert_eq!(purchase.duration_days, 30);
        assert_eq!(purchase.charges.total_amount, Money::from_units(20));
    }

    #[test]
    fn converts_all_gigs_promotion_ignoring_gig() {
        let legacy = LegacyPromotion {
            is_for_all: true,
            promotion_plan: "Premium".to_string(),
            ..legacy_gig_promotion()
        };
        let purchase = legacy.to_purchase().unwrap();
        assert_eq!(purchase.target, PromotionTarget::AllGigs);
        assert_eq!(purchase.plan_key, "premium");
        assert_eq!(purchase.plan_priority, 3);
    }

    #[test]
    fn single_gig_without_gig_is_rejected() {
        let legacy = LegacyPromotion {
            gig_id: None,
            ..legacy_gig_promotion()
        };
        assert!(matches!(
            legacy.to_purchase(),
            Err(PromotionError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn unknown_plan_is_preserved() {
        let legacy = LegacyPromotion {
            promotion_plan: "gold".to_string(),
            ..legacy_gig_promotion()
        };
        let purchase = legacy.to_purchase().unwrap();
        assert_eq!(purchase.plan_name, "gold");
        assert_eq!(purchase.plan_priority, 0);
    }

    #[test]
    fn missing_dates_default_duration() {
        let legacy = LegacyPromotion {
            status: LegacyPromotionStatus::Pending,
            promotion_start_date: None,
            promotion_end_date: None,
            ..legacy_gig_promotion()
        };
        let purchase = legacy.to_purchase().unwrap();
        assert_eq!(purchase.duration_days, PROMOTION_DURATION_DAYS);
        assert_eq!(purchase.status, PromotionStatus::Pending);
        assert_eq!(purchase.purchased_at, legacy.created_at);
    }

    #[test]
    fn migrated_active_record_keeps_its_window() {
        let purchase = legacy_gig_promotion().to_purchase().unwrap();
        assert!(purchase.is_active_at(at(86_400)));
        assert!(purchase.ensure_deletable(at(86_400)).is_err());
    }
}
