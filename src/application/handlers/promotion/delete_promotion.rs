//! DeletePromotionHandler - Removes a promotion that is no longer running.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::promotion::PromotionError;
use crate::ports::{GigRepository, PromotionRepository};

use super::badges::release_badges;
use super::cancel_promotion::load_owned;

#[derive(Debug, Clone)]
pub struct DeletePromotionCommand {
    pub user_id: UserId,
    /// Purchase id or legacy promotion id.
    pub promotion_ref: String,
}

pub struct DeletePromotionHandler {
    promotions: Arc<dyn PromotionRepository>,
    gigs: Arc<dyn GigRepository>,
}

impl DeletePromotionHandler {
    pub fn new(promotions: Arc<dyn PromotionRepository>, gigs: Arc<dyn GigRepository>) -> Self {
        Self { promotions, gigs }
    }

    pub async fn handle(&self, cmd: DeletePromotionCommand) -> Result<(), PromotionError> {
        let now = Timestamp::now();
        let purchase =
            load_owned(self.promotions.as_ref(), &cmd.promotion_ref, &cmd.user_id).await?;

        // Running promotions must be cancelled first
        purchase.ensure_deletable(now)?;

        // Lapsed rows the sweep has not reached may still badge listings
        release_badges(self.gigs.as_ref(), self.promotions.as_ref(), &purchase, now).await?;

        if !self.promotions.delete(&purchase.id).await? {
            return Err(PromotionError::not_found(cmd.promotion_ref));
        }

        tracing::info!(purchase_id = %purchase.id, user_id = %cmd.user_id, "Promotion deleted");
        Ok(())
    }
}
