//! Promotion purchase aggregate.
//!
//! The single durable record of a promotion. Rows migrated from the
//! legacy promotions table keep their old id in `legacy_promotion_id`.
//!
//! # Invariants
//!
//! - `expires_at == activated_at + duration_days` for purchases activated here
//! - the active window is `[activated_at, expires_at)`
//! - a stored `Active` status past `expires_at` reads as `Expired`

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GigId, Money, PromotionId, StateMachine, Timestamp, UserId};

use super::{
    PlanDefinition, PriceBreakdown, PromotionError, PromotionScope, PromotionStatus, Rate,
};

const SECONDS_PER_DAY: i64 = 86_400;

/// What a purchase boosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "promotion_type", content = "gig_id", rename_all = "snake_case")]
pub enum PromotionTarget {
    AllGigs,
    SingleGig(GigId),
}

impl PromotionTarget {
    pub fn scope(&self) -> PromotionScope {
        match self {
            PromotionTarget::AllGigs => PromotionScope::AllGigs,
            PromotionTarget::SingleGig(_) => PromotionScope::SingleGig,
        }
    }

    pub fn gig_id(&self) -> Option<GigId> {
        match self {
            PromotionTarget::AllGigs => None,
            PromotionTarget::SingleGig(id) => Some(*id),
        }
    }

    /// Rebuilds a target from stored columns.
    pub fn from_parts(scope: PromotionScope, gig_id: Option<GigId>) -> Result<Self, String> {
        match (scope, gig_id) {
            (PromotionScope::AllGigs, _) => Ok(PromotionTarget::AllGigs),
            (PromotionScope::SingleGig, Some(id)) => Ok(PromotionTarget::SingleGig(id)),
            (PromotionScope::SingleGig, None) => {
                Err("single_gig promotion is missing its gig_id".to_string())
            }
        }
    }
}

/// Amounts recorded at purchase time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PromotionCharges {
    pub base_amount: Money,
    pub vat_rate: Rate,
    pub vat_amount: Money,
    pub platform_fee: Money,
    pub total_amount: Money,
}

impl From<PriceBreakdown> for PromotionCharges {
    fn from(b: PriceBreakdown) -> Self {
        Self {
            base_amount: b.base_price,
            vat_rate: b.vat_rate,
            vat_amount: b.vat_amount,
            platform_fee: b.platform_fee,
            total_amount: b.total_price,
        }
    }
}

/// A promotion purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionPurchase {
    pub id: PromotionId,
    /// Id of the legacy promotion this row was copied from.
    pub legacy_promotion_id: Option<String>,
    /// Idempotency key. Absent only on migrated legacy rows.
    pub stripe_payment_intent_id: Option<String>,
    pub user_id: UserId,
    pub plan_key: String,
    pub plan_name: String,
    pub plan_priority: i32,
    pub target: PromotionTarget,
    pub status: PromotionStatus,
    pub purchased_at: Timestamp,
    pub activated_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub charges: PromotionCharges,
    pub duration_days: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PromotionPurchase {
    /// Creates an active purchase for a confirmed payment.
    ///
    /// # Errors
    ///
    /// `InvalidPlan` when the plan is not offered for the target's scope.
    pub fn activate(
        payment_intent_id: impl Into<String>,
        user_id: UserId,
        plan: &PlanDefinition,
        target: PromotionTarget,
        charges: PromotionCharges,
        now: Timestamp,
    ) -> Result<Self, PromotionError> {
        if plan.scope != target.scope() {
            return Err(PromotionError::invalid_plan(target.scope(), plan.key));
        }

        Ok(Self {
            id: PromotionId::new(),
            legacy_promotion_id: None,
            stripe_payment_intent_id: Some(payment_intent_id.into()),
            user_id,
            plan_key: plan.key.to_string(),
            plan_name: plan.name.to_string(),
            plan_priority: plan.priority,
            target,
            status: PromotionStatus::Active,
            purchased_at: now,
            activated_at: Some(now),
            expires_at: Some(now.add_days(plan.duration_days)),
            charges,
            duration_days: plan.duration_days,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn scope(&self) -> PromotionScope {
        self.target.scope()
    }

    pub fn gig_id(&self) -> Option<GigId> {
        self.target.gig_id()
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    /// Active status and `now` inside `[activated_at, expires_at)`.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.status == PromotionStatus::Active
            && self.activated_at.map_or(false, |start| start <= now)
            && self.expires_at.map_or(false, |end| now < end)
    }

    /// Stored `Active` rows whose window has closed.
    pub fn is_stale_at(&self, now: Timestamp) -> bool {
        self.status == PromotionStatus::Active && self.expires_at.map_or(true, |end| end <= now)
    }

    /// Status as clients should see it at `now`.
    pub fn effective_status(&self, now: Timestamp) -> PromotionStatus {
        if self.is_stale_at(now) {
            PromotionStatus::Expired
        } else {
            self.status
        }
    }

    /// Whole days left, rounded up. Zero when not active.
    pub fn remaining_days(&self, now: Timestamp) -> i64 {
        match self.expires_at {
            Some(end) if self.is_active_at(now) => {
                let secs = end.duration_since(&now).num_seconds();
                (secs + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
            }
            _ => 0,
        }
    }

    /// Stops an active promotion early.
    pub fn cancel(&mut self, now: Timestamp) -> Result<(), PromotionError> {
        if !self.is_active_at(now) {
            return Err(PromotionError::invalid_state(
                self.effective_status(now),
                "cancel",
            ));
        }
        self.transition(PromotionStatus::Cancelled, "cancel", now)
    }

    /// Records that the window has closed.
    pub fn expire(&mut self, now: Timestamp) -> Result<(), PromotionError> {
        if !self.is_stale_at(now) {
            return Err(PromotionError::invalid_state(self.status, "expire"));
        }
        self.transition(PromotionStatus::Expired, "expire", now)
    }

    /// Active promotions must be cancelled before they can be deleted.
    pub fn ensure_deletable(&self, now: Timestamp) -> Result<(), PromotionError> {
        if self.is_active_at(now) {
            return Err(PromotionError::invalid_state(PromotionStatus::Active, "delete"));
        }
        Ok(())
    }

    fn transition(
        &mut self,
        target: PromotionStatus,
        action: &str,
        now: Timestamp,
    ) -> Result<(), PromotionError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|_| PromotionError::invalid_state(self.status, action))?;
        self.updated_at = now;
        Ok(())
    }
}
