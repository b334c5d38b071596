//! CancelPromotionHandler - Stops an active promotion early.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::promotion::{PromotionError, PromotionPurchase};
use crate::ports::{GigRepository, PromotionRepository};

use super::badges::release_badges;

#[derive(Debug, Clone)]
pub struct CancelPromotionCommand {
    pub user_id: UserId,
    /// Purchase id or legacy promotion id.
    pub promotion_ref: String,
}

pub struct CancelPromotionHandler {
    promotions: Arc<dyn PromotionRepository>,
    gigs: Arc<dyn GigRepository>,
}

impl CancelPromotionHandler {
    pub fn new(promotions: Arc<dyn PromotionRepository>, gigs: Arc<dyn GigRepository>) -> Self {
        Self { promotions, gigs }
    }

    pub async fn handle(
        &self,
        cmd: CancelPromotionCommand,
    ) -> Result<PromotionPurchase, PromotionError> {
        let now = Timestamp::now();

        // 1. Load and check ownership
        let mut purchase = load_owned(self.promotions.as_ref(), &cmd.promotion_ref, &cmd.user_id)
            .await?;

        // 2. Transition
        purchase.cancel(now)?;
        self.promotions.update(&purchase).await?;

        // 3. Take the badge off the listings
        release_badges(self.gigs.as_ref(), self.promotions.as_ref(), &purchase, now).await?;

        tracing::info!(purchase_id = %purchase.id, user_id = %cmd.user_id, "Promotion cancelled");
        Ok(purchase)
    }
}

/// Resolves a client reference and requires the caller to own it.
pub(crate) async fn load_owned(
    promotions: &dyn PromotionRepository,
    reference: &str,
    user_id: &UserId,
) -> Result<PromotionPurchase, PromotionError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(PromotionError::validation("promotion_id", "Promotion ID is required"));
    }
    let purchase = promotions
        .find_by_reference(reference)
        .await?
        .ok_or_else(|| PromotionError::not_found(reference))?;
    if !purchase.is_owned_by(user_id) {
        return Err(PromotionError::forbidden(
            "You are not authorized to modify this promotion",
        ));
    }
    Ok(purchase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::promotion::test_support::TestWorld;
    use crate::domain::promotion::{PromotionStatus, PromotionTarget};

    fn cancel(user_id: UserId, reference: impl Into<String>) -> CancelPromotionCommand {
        CancelPromotionCommand {
            user_id,
            promotion_ref: reference.into(),
        }
    }

    #[tokio::test]
    async fn owner_cancels_and_badge_is_cleared() {
        let world = TestWorld::new();
        let seller = world.seller();
        let gig = world.gig_of(&seller);
        let purchase =
            world.activate_directly(&seller, PromotionTarget::SingleGig(gig.id), "featured");

        let cancelled = world
            .cancel_handler()
            .handle(cancel(seller.id, purchase.id.to_string()))
            .await
            .unwrap();

        assert_eq!(cancelled.status, PromotionStatus::Cancelled);
        assert_eq!(
            world.promotions.get(&purchase.id).unwrap().status,
            PromotionStatus::Cancelled
        );
        assert!(!world.gigs.get(&gig.id).unwrap().is_promoted());
    }

    #[tokio::test]
    async fn cancelling_single_gig_keeps_all_gigs_badge() {
        let world = TestWorld::new();
        let seller = world.seller();
        let gig = world.gig_of(&seller);
        let all = world.activate_directly(&seller, PromotionTarget::AllGigs, "basic");
        let single =
            world.activate_directly(&seller, PromotionTarget::SingleGig(gig.id), "homepage");

        world
            .cancel_handler()
            .handle(cancel(seller.id, single.id.to_string()))
            .await
            .unwrap();

        let badge = world.gigs.get(&gig.id).unwrap().promotion.unwrap();
        assert_eq!(badge.purchase_id, all.id);
    }

    #[tokio::test]
    async fn resolves_legacy_id() {
        let world = TestWorld::new();
        let seller = world.seller();
        let purchase = world.backfilled(&seller, "64f1c2aa9b1e8a0012345678");

        let cancelled = world
            .cancel_handler()
            .handle(cancel(seller.id, "64f1c2aa9b1e8a0012345678"))
            .await
            .unwrap();

        assert_eq!(cancelled.id, purchase.id);
    }

    #[tokio::test]
    async fn non_owner_is_forbidden() {
        let world = TestWorld::new();
        let seller = world.seller();
        let purchase = world.activate_directly(&seller, PromotionTarget::AllGigs, "basic");

        let result = world
            .cancel_handler()
            .handle(cancel(world.seller().id, purchase.id.to_string()))
            .await;

        assert!(matches!(result, Err(PromotionError::Forbidden(_))));
    }

    #[tokio::test]
    async fn cancelling_twice_reports_current_status() {
        let world = TestWorld::new();
        let seller = world.seller();
        let purchase = world.activate_directly(&seller, PromotionTarget::AllGigs, "basic");
        let handler = world.cancel_handler();

        handler.handle(cancel(seller.id, purchase.id.to_string())).await.unwrap();
        let result = handler.handle(cancel(seller.id, purchase.id.to_string())).await;

        assert_eq!(
            result.unwrap_err(),
            PromotionError::invalid_state(PromotionStatus::Cancelled, "cancel")
        );
    }

    #[tokio::test]
    async fn lapsed_promotion_cannot_be_cancelled() {
        let world = TestWorld::new();
        let seller = world.seller();
        let purchase = world.activate_lapsed(&seller, PromotionTarget::AllGigs, "basic");

        let result = world
            .cancel_handler()
            .handle(cancel(seller.id, purchase.id.to_string()))
            .await;

        assert_eq!(
            result.unwrap_err(),
            PromotionError::invalid_state(PromotionStatus::Expired, "cancel")
        );
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let world = TestWorld::new();
        let result = world
            .cancel_handler()
            .handle(cancel(UserId::new(), "does-not-exist"))
            .await;
        assert!(matches!(result, Err(PromotionError::NotFound(_))));
    }
}
