//! BackfillLegacyPromotionsHandler - Copies legacy promotions into purchases.
//!
//! Safe to re-run: rows already carrying a purchase are not listed again,
//! and the store rejects a second copy of the same legacy id.

use std::sync::Arc;

use crate::domain::foundation::ErrorCode;
use crate::domain::promotion::PromotionError;
use crate::ports::{LegacyPromotionSource, PromotionRepository};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillLegacyPromotionsResult {
    pub migrated: usize,
    /// Rows left behind: unconvertible, or overlapping an active purchase.
    pub skipped: usize,
}

pub struct BackfillLegacyPromotionsHandler {
    source: Arc<dyn LegacyPromotionSource>,
    promotions: Arc<dyn PromotionRepository>,
    batch_size: u32,
}

impl BackfillLegacyPromotionsHandler {
    pub fn new(
        source: Arc<dyn LegacyPromotionSource>,
        promotions: Arc<dyn PromotionRepository>,
        batch_size: u32,
    ) -> Self {
        Self {
            source,
            promotions,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn handle(&self) -> Result<BackfillLegacyPromotionsResult, PromotionError> {
        let mut migrated = 0;
        // Left out of later batches so they cannot stall the scan.
        let mut skipped: Vec<String> = Vec::new();

        loop {
            let batch = self
                .source
                .list_unmigrated(&skipped, self.batch_size)
                .await?;
            if batch.is_empty() {
                break;
            }

            for legacy in &batch {
                let purchase = match legacy.to_purchase() {
                    Ok(purchase) => purchase,
                    Err(err) => {
                        tracing::warn!(legacy_id = %legacy.id, error = %err, "Skipping unconvertible legacy promotion");
                        skipped.push(legacy.id.clone());
                        continue;
                    }
                };

                match self.promotions.insert(&purchase).await {
                    Ok(()) => {
                        migrated += 1;
                        tracing::debug!(legacy_id = %legacy.id, purchase_id = %purchase.id, "Migrated legacy promotion");
                    }
                    // Migrated concurrently
                    Err(err) if err.code == ErrorCode::DuplicatePaymentIntent => {}
                    Err(err) if err.code == ErrorCode::PromotionConflict => {
                        tracing::warn!(
                            legacy_id = %legacy.id,
                            user_id = %legacy.user_id,
                            "Skipping legacy promotion overlapping an active purchase"
                        );
                        skipped.push(legacy.id.clone());
                    }
                    Err(err) => return Err(err.into()),
                }
            }

            if batch.len() < self.batch_size as usize {
                break;
            }
        }

        let result = BackfillLegacyPromotionsResult {
            migrated,
            skipped: skipped.len(),
        };
        tracing::info!(migrated = result.migrated, skipped = result.skipped, "Legacy promotion backfill finished");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::promotion::test_support::TestWorld;
    use crate::domain::foundation::{GigId, Money, Timestamp, UserId};
    use crate::domain::promotion::{LegacyPromotion, LegacyPromotionStatus, PromotionStatus};

    fn legacy(id: &str, user_id: UserId, gig_id: Option<GigId>, status: LegacyPromotionStatus) -> LegacyPromotion {
        let start = Timestamp::now();
        LegacyPromotion {
            id: id.to_string(),
            user_id,
            gig_id,
            is_for_all: gig_id.is_none(),
            promotion_plan: if gig_id.is_some() { "featured" } else { "basic" }.to_string(),
            status,
            promotion_start_date: Some(start),
            promotion_end_date: Some(start.add_days(30)),
            amount_paid: Money::from_units(50),
            created_at: start,
        }
    }

    #[tokio::test]
    async fn copies_rows_and_keeps_legacy_id() {
        let world = TestWorld::new();
        let seller = world.seller();
        let gig = world.gig_of(&seller);
        world.legacy.push(legacy("a1", seller.id, None, LegacyPromotionStatus::Active));
        world.legacy.push(legacy("a2", seller.id, Some(gig.id), LegacyPromotionStatus::Expired));

        let result = world.backfill_handler(10).handle().await.unwrap();

        assert_eq!(result, BackfillLegacyPromotionsResult { migrated: 2, skipped: 0 });
        let copied = world.promotions.find_by_reference("a1").await.unwrap().unwrap();
        assert_eq!(copied.legacy_promotion_id.as_deref(), Some("a1"));
        assert_eq!(copied.status, PromotionStatus::Active);
        assert_eq!(copied.charges.total_amount, Money::from_units(50));
    }

    #[tokio::test]
    async fn rerun_migrates_nothing() {
        let world = TestWorld::new();
        let seller = world.seller();
        world.legacy.push(legacy("a1", seller.id, None, LegacyPromotionStatus::Active));
        let handler = world.backfill_handler(10);

        handler.handle().await.unwrap();
        let second = handler.handle().await.unwrap();

        assert_eq!(second.migrated, 0);
        assert_eq!(world.promotions.all().len(), 1);
    }

    #[tokio::test]
    async fn overlapping_active_rows_are_skipped() {
        let world = TestWorld::new();
        let seller = world.seller();
        world.legacy.push(legacy("a1", seller.id, None, LegacyPromotionStatus::Active));
        world.legacy.push(legacy("a2", seller.id, None, LegacyPromotionStatus::Active));

        let result = world.backfill_handler(1).handle().await.unwrap();

        assert_eq!(result, BackfillLegacyPromotionsResult { migrated: 1, skipped: 1 });
    }

    #[tokio::test]
    async fn a_full_batch_of_bad_rows_does_not_stall_the_scan() {
        let world = TestWorld::new();
        let seller = world.seller();
        for id in ["bad1", "bad2"] {
            // Single-gig row without a gig
            let mut row = legacy(id, seller.id, None, LegacyPromotionStatus::Expired);
            row.is_for_all = false;
            world.legacy.push(row);
        }
        world.legacy.push(legacy("good", seller.id, None, LegacyPromotionStatus::Active));

        let result = world.backfill_handler(2).handle().await.unwrap();

        assert_eq!(result, BackfillLegacyPromotionsResult { migrated: 1, skipped: 2 });
        assert!(world.promotions.has_legacy("good"));
    }
}
