//! Promotion purchase repository port.
//!
//! The store is the last line of defence against double activation:
//! implementations must reject
//!
//! - a second purchase for the same payment intent (`DuplicatePaymentIntent`)
//! - a second active purchase for the same gig, or a second active
//!   all-gigs purchase for the same seller (`PromotionConflict`)
//! - a second copy of the same legacy promotion (`DuplicatePaymentIntent`)

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PromotionId, Timestamp, UserId};
use crate::domain::promotion::{PromotionPurchase, PromotionStatus, PromotionTarget};

/// Filter and window for purchase history.
///
/// `status` matches the status as seen at `now`: a stored `active` row whose
/// window has closed counts as `expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    pub status: Option<PromotionStatus>,
    pub now: Timestamp,
    pub offset: u32,
    pub limit: u32,
}

#[async_trait]
pub trait PromotionRepository: Send + Sync {
    /// Insert a new purchase.
    ///
    /// # Errors
    ///
    /// - `DuplicatePaymentIntent` if the intent (or legacy id) is already recorded
    /// - `PromotionConflict` if an active purchase already covers the target
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, purchase: &PromotionPurchase) -> Result<(), DomainError>;

    /// Persist status and timestamp changes of an existing purchase.
    ///
    /// # Errors
    ///
    /// - `PromotionNotFound` if the purchase doesn't exist
    async fn update(&self, purchase: &PromotionPurchase) -> Result<(), DomainError>;

    /// Remove a purchase. Returns false if nothing was deleted.
    async fn delete(&self, id: &PromotionId) -> Result<bool, DomainError>;

    async fn find_by_id(&self, id: &PromotionId) -> Result<Option<PromotionPurchase>, DomainError>;

    /// Resolve a client-supplied id: a purchase id, or the id of the legacy
    /// promotion a purchase was migrated from.
    async fn find_by_reference(&self, reference: &str)
        -> Result<Option<PromotionPurchase>, DomainError>;

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<PromotionPurchase>, DomainError>;

    /// The active purchase covering `target` at `now`, if any.
    ///
    /// All-gigs targets are scoped to `user_id`; single-gig targets to the gig.
    async fn find_active_for_target(
        &self,
        user_id: &UserId,
        target: &PromotionTarget,
        now: Timestamp,
    ) -> Result<Option<PromotionPurchase>, DomainError>;

    /// All purchases of a user, newest first.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<PromotionPurchase>, DomainError>;

    /// Purchases active at `now`, ending soonest first.
    async fn list_active_by_user(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<Vec<PromotionPurchase>, DomainError>;

    /// One page of purchase history, newest first.
    async fn list_history(
        &self,
        user_id: &UserId,
        query: HistoryQuery,
    ) -> Result<Vec<PromotionPurchase>, DomainError>;

    /// Total rows matching the history filter, with status judged at `now`.
    async fn count_history(
        &self,
        user_id: &UserId,
        status: Option<PromotionStatus>,
        now: Timestamp,
    ) -> Result<u64, DomainError>;

    /// Stored-active purchases whose window closed at or before `now`.
    async fn find_stale_active(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<PromotionPurchase>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn PromotionRepository) {}
    }
}
