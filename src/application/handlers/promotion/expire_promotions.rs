//! ExpirePromotionsHandler - Reconciles promotions whose window has closed.
//!
//! Reads never write; stale `active` rows are flipped here, on a schedule.

use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::domain::promotion::PromotionError;
use crate::ports::{GigRepository, PromotionRepository};

use super::badges::release_badges;

/// Rows handled per repository round trip.
const SWEEP_BATCH: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpirePromotionsResult {
    pub expired: usize,
    pub badges_cleared: u64,
}

pub struct ExpirePromotionsHandler {
    promotions: Arc<dyn PromotionRepository>,
    gigs: Arc<dyn GigRepository>,
}

impl ExpirePromotionsHandler {
    pub fn new(promotions: Arc<dyn PromotionRepository>, gigs: Arc<dyn GigRepository>) -> Self {
        Self { promotions, gigs }
    }

    /// Expires every stale purchase as of `now`.
    pub async fn handle(&self, now: Timestamp) -> Result<ExpirePromotionsResult, PromotionError> {
        let mut result = ExpirePromotionsResult::default();

        loop {
            let batch = self.promotions.find_stale_active(now, SWEEP_BATCH).await?;
            if batch.is_empty() {
                break;
            }
            let batch_len = batch.len();

            for mut purchase in batch {
                purchase.expire(now)?;
                self.promotions.update(&purchase).await?;
                result.badges_cleared +=
                    release_badges(self.gigs.as_ref(), self.promotions.as_ref(), &purchase, now)
                        .await?;
                result.expired += 1;
            }

            if batch_len < SWEEP_BATCH as usize {
                break;
            }
        }

        if result.expired > 0 {
            tracing::info!(
                expired = result.expired,
                badges_cleared = result.badges_cleared,
                "Expired stale promotions"
            );
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::promotion::test_support::TestWorld;
    use crate::domain::promotion::{PromotionStatus, PromotionTarget};

    #[tokio::test]
    async fn flips_lapsed_promotions_and_clears_badges() {
        let world = TestWorld::new();
        let seller = world.seller();
        let gig = world.gig_of(&seller);
        let lapsed =
            world.activate_lapsed(&seller, PromotionTarget::SingleGig(gig.id), "featured");
        let live = world.activate_directly(&seller, PromotionTarget::AllGigs, "basic");

        let result = world.expire_handler().handle(Timestamp::now()).await.unwrap();

        assert_eq!(result.expired, 1);
        assert_eq!(
            world.promotions.get(&lapsed.id).unwrap().status,
            PromotionStatus::Expired
        );
        assert_eq!(
            world.promotions.get(&live.id).unwrap().status,
            PromotionStatus::Active
        );
        let badge = world.gigs.get(&gig.id).unwrap().promotion.unwrap();
        assert_eq!(badge.purchase_id, live.id);
    }

    #[tokio::test]
    async fn nothing_to_do_is_a_no_op() {
        let world = TestWorld::new();
        let seller = world.seller();
        world.activate_directly(&seller, PromotionTarget::AllGigs, "basic");

        let result = world.expire_handler().handle(Timestamp::now()).await.unwrap();

        assert_eq!(result, ExpirePromotionsResult::default());
    }

    #[tokio::test]
    async fn sweep_is_repeatable() {
        let world = TestWorld::new();
        let seller = world.seller();
        world.activate_lapsed(&seller, PromotionTarget::AllGigs, "basic");
        let handler = world.expire_handler();

        let first = handler.handle(Timestamp::now()).await.unwrap();
        let second = handler.handle(Timestamp::now()).await.unwrap();

        assert_eq!(first.expired, 1);
        assert_eq!(second.expired, 0);
    }
}
