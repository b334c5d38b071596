//! CheckGigPromotionHandler - Is a gig under a live single-gig promotion?

use std::sync::Arc;

use crate::domain::foundation::{GigId, Timestamp, UserId};
use crate::domain::promotion::{PromotionError, PromotionTarget};
use crate::ports::PromotionRepository;

use super::views::PromotionView;

#[derive(Debug, Clone)]
pub struct CheckGigPromotionQuery {
    pub caller: UserId,
    pub gig_id: GigId,
}

#[derive(Debug, Clone)]
pub struct CheckGigPromotionResult {
    pub gig_id: GigId,
    pub active: Option<PromotionView>,
}

impl CheckGigPromotionResult {
    pub fn has_active_promotion(&self) -> bool {
        self.active.is_some()
    }
}

/// Looks up the live single-gig purchase for a gig.
///
/// Any signed-in user may ask; all-gigs purchases are not considered.
pub struct CheckGigPromotionHandler {
    promotions: Arc<dyn PromotionRepository>,
}

impl CheckGigPromotionHandler {
    pub fn new(promotions: Arc<dyn PromotionRepository>) -> Self {
        Self { promotions }
    }

    pub async fn handle(
        &self,
        query: CheckGigPromotionQuery,
    ) -> Result<CheckGigPromotionResult, PromotionError> {
        let now = Timestamp::now();
        let target = PromotionTarget::SingleGig(query.gig_id);
        let active = self
            .promotions
            .find_active_for_target(&query.caller, &target, now)
            .await?
            .map(|purchase| PromotionView::at(purchase, None, now));

        Ok(CheckGigPromotionResult {
            gig_id: query.gig_id,
            active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::promotion::test_support::TestWorld;
    use crate::domain::promotion::PromotionStatus;

    #[tokio::test]
    async fn reports_live_promotion_to_any_caller() {
        let world = TestWorld::new();
        let seller = world.seller();
        let gig = world.gig_of(&seller);
        world.activate_directly(&seller, PromotionTarget::SingleGig(gig.id), "homepage");

        let result = world
            .check_gig_handler()
            .handle(CheckGigPromotionQuery {
                caller: world.client().id,
                gig_id: gig.id,
            })
            .await
            .unwrap();

        assert!(result.has_active_promotion());
        let view = result.active.unwrap();
        assert_eq!(view.purchase.plan_key, "homepage");
        assert_eq!(view.remaining_days, 30);
    }

    #[tokio::test]
    async fn all_gigs_promotion_does_not_count() {
        let world = TestWorld::new();
        let seller = world.seller();
        let gig = world.gig_of(&seller);
        world.activate_directly(&seller, PromotionTarget::AllGigs, "premium");

        let result = world
            .check_gig_handler()
            .handle(CheckGigPromotionQuery {
                caller: seller.id,
                gig_id: gig.id,
            })
            .await
            .unwrap();

        assert!(!result.has_active_promotion());
    }

    #[tokio::test]
    async fn cancelled_promotion_is_not_active() {
        let world = TestWorld::new();
        let seller = world.seller();
        let gig = world.gig_of(&seller);
        let purchase =
            world.activate_directly(&seller, PromotionTarget::SingleGig(gig.id), "featured");
        world.set_status(&purchase.id, PromotionStatus::Cancelled);

        let result = world
            .check_gig_handler()
            .handle(CheckGigPromotionQuery {
                caller: seller.id,
                gig_id: gig.id,
            })
            .await
            .unwrap();

        assert!(result.active.is_none());
    }
}
