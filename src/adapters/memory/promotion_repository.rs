//! In-memory promotion purchase store.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, PromotionId, Timestamp, UserId};
use crate::domain::promotion::{PromotionPurchase, PromotionStatus, PromotionTarget};
use crate::ports::{HistoryQuery, PromotionRepository};

/// Purchases kept in insertion order.
pub struct InMemoryPromotionRepository {
    purchases: RwLock<Vec<PromotionPurchase>>,
}

impl InMemoryPromotionRepository {
    pub fn new() -> Self {
        Self {
            purchases: RwLock::new(Vec::new()),
        }
    }

    // === Test Helpers ===

    /// Every stored purchase, oldest insert first.
    pub fn all(&self) -> Vec<PromotionPurchase> {
        self.read().clone()
    }

    pub fn get(&self, id: &PromotionId) -> Option<PromotionPurchase> {
        self.read().iter().find(|p| &p.id == id).cloned()
    }

    /// Overwrites the stored status, bypassing the state machine.
    pub fn set_status(&self, id: &PromotionId, status: PromotionStatus) {
        let mut purchases = self.write();
        if let Some(purchase) = purchases.iter_mut().find(|p| &p.id == id) {
            purchase.status = status;
        }
    }

    /// True if a purchase already carries this legacy id.
    pub fn has_legacy(&self, legacy_id: &str) -> bool {
        self.read()
            .iter()
            .any(|p| p.legacy_promotion_id.as_deref() == Some(legacy_id))
    }

    /// Synchronous insert with the same uniqueness rules as [`insert`].
    ///
    /// [`insert`]: PromotionRepository::insert
    pub fn insert_now(&self, purchase: &PromotionPurchase) -> Result<(), DomainError> {
        let mut purchases = self.write();

        if let Some(intent) = purchase.stripe_payment_intent_id.as_deref() {
            if purchases
                .iter()
                .any(|p| p.stripe_payment_intent_id.as_deref() == Some(intent))
            {
                return Err(DomainError::new(
                    ErrorCode::DuplicatePaymentIntent,
                    format!("payment intent {} already recorded", intent),
                ));
            }
        }
        if let Some(legacy) = purchase.legacy_promotion_id.as_deref() {
            if purchases
                .iter()
                .any(|p| p.legacy_promotion_id.as_deref() == Some(legacy))
            {
                return Err(DomainError::new(
                    ErrorCode::DuplicatePaymentIntent,
                    format!("legacy promotion {} already migrated", legacy),
                ));
            }
        }
        if purchase.status == PromotionStatus::Active
            && purchases
                .iter()
                .any(|p| p.status == PromotionStatus::Active && same_slot(p, purchase))
        {
            return Err(DomainError::new(
                ErrorCode::PromotionConflict,
                "an active promotion already covers this target",
            ));
        }

        purchases.push(purchase.clone());
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<PromotionPurchase>> {
        self.purchases
            .read()
            .expect("InMemoryPromotionRepository: lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<PromotionPurchase>> {
        self.purchases
            .write()
            .expect("InMemoryPromotionRepository: lock poisoned")
    }

    fn filtered<F>(&self, keep: F) -> Vec<PromotionPurchase>
    where
        F: Fn(&PromotionPurchase) -> bool,
    {
        self.read().iter().filter(|p| keep(p)).cloned().collect()
    }
}

impl Default for InMemoryPromotionRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Mirrors the partial unique indexes: one active row per gig, and one
/// active all-gigs row per seller.
fn same_slot(a: &PromotionPurchase, b: &PromotionPurchase) -> bool {
    match (a.target, b.target) {
        (PromotionTarget::AllGigs, PromotionTarget::AllGigs) => a.user_id == b.user_id,
        (PromotionTarget::SingleGig(x), PromotionTarget::SingleGig(y)) => x == y,
        _ => false,
    }
}

fn newest_first(purchases: &mut [PromotionPurchase]) {
    purchases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl PromotionRepository for InMemoryPromotionRepository {
    async fn insert(&self, purchase: &PromotionPurchase) -> Result<(), DomainError> {
        self.insert_now(purchase)
    }

    async fn update(&self, purchase: &PromotionPurchase) -> Result<(), DomainError> {
        let mut purchases = self.write();
        match purchases.iter_mut().find(|p| p.id == purchase.id) {
            Some(stored) => {
                *stored = purchase.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::PromotionNotFound,
                format!("promotion {} not found", purchase.id),
            )),
        }
    }

    async fn delete(&self, id: &PromotionId) -> Result<bool, DomainError> {
        let mut purchases = self.write();
        let before = purchases.len();
        purchases.retain(|p| &p.id != id);
        Ok(purchases.len() < before)
    }

    async fn find_by_id(&self, id: &PromotionId) -> Result<Option<PromotionPurchase>, DomainError> {
        Ok(self.get(id))
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<PromotionPurchase>, DomainError> {
        if let Ok(id) = reference.parse::<PromotionId>() {
            if let Some(found) = self.get(&id) {
                return Ok(Some(found));
            }
        }
        Ok(self
            .read()
            .iter()
            .find(|p| p.legacy_promotion_id.as_deref() == Some(reference))
            .cloned())
    }

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<PromotionPurchase>, DomainError> {
        Ok(self
            .read()
            .iter()
            .find(|p| p.stripe_payment_intent_id.as_deref() == Some(payment_intent_id))
            .cloned())
    }

    async fn find_active_for_target(
        &self,
        user_id: &UserId,
        target: &PromotionTarget,
        now: Timestamp,
    ) -> Result<Option<PromotionPurchase>, DomainError> {
        Ok(self
            .read()
            .iter()
            .find(|p| {
                p.is_active_at(now)
                    && p.target == *target
                    && (target.gig_id().is_some() || &p.user_id == user_id)
            })
            .cloned())
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<PromotionPurchase>, DomainError> {
        let mut purchases = self.filtered(|p| &p.user_id == user_id);
        newest_first(&mut purchases);
        Ok(purchases)
    }

    async fn list_active_by_user(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<Vec<PromotionPurchase>, DomainError> {
        let mut purchases = self.filtered(|p| &p.user_id == user_id && p.is_active_at(now));
        purchases.sort_by_key(|p| p.expires_at);
        Ok(purchases)
    }

    async fn list_history(
        &self,
        user_id: &UserId,
        query: HistoryQuery,
    ) -> Result<Vec<PromotionPurchase>, DomainError> {
        let mut purchases = self.filtered(|p| {
            &p.user_id == user_id
                && query.status.map_or(true, |s| p.effective_status(query.now) == s)
        });
        newest_first(&mut purchases);
        Ok(purchases
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn count_history(
        &self,
        user_id: &UserId,
        status: Option<PromotionStatus>,
        now: Timestamp,
    ) -> Result<u64, DomainError> {
        let count = self
            .read()
            .iter()
            .filter(|p| {
                &p.user_id == user_id && status.map_or(true, |s| p.effective_status(now) == s)
            })
            .count();
        Ok(count as u64)
    }

    async fn find_stale_active(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<PromotionPurchase>, DomainError> {
        Ok(self
            .read()
            .iter()
            .filter(|p| p.is_stale_at(now))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
