//! Query handlers for a seller's own promotions.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::foundation::{GigId, Timestamp, UserId};
use crate::domain::gig::GigSummary;
use crate::domain::promotion::{PromotionError, PromotionPurchase};
use crate::ports::{GigRepository, PromotionRepository};

use super::views::PromotionView;

/// Query for every purchase of a user.
#[derive(Debug, Clone)]
pub struct ListPromotionsQuery {
    pub user_id: UserId,
}

/// Query for the purchases live right now.
#[derive(Debug, Clone)]
pub struct ListActivePromotionsQuery {
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct ListActivePromotionsResult {
    pub promotions: Vec<PromotionView>,
    pub count: usize,
}

/// Attaches gig summaries to purchases and derives their status at `now`.
pub(crate) async fn to_views(
    gigs: &dyn GigRepository,
    purchases: Vec<PromotionPurchase>,
    now: Timestamp,
) -> Result<Vec<PromotionView>, PromotionError> {
    let mut gig_ids: Vec<GigId> = purchases.iter().filter_map(|p| p.gig_id()).collect();
    gig_ids.sort();
    gig_ids.dedup();

    let summaries: HashMap<GigId, GigSummary> = if gig_ids.is_empty() {
        HashMap::new()
    } else {
        gigs.find_summaries(&gig_ids)
            .await?
            .into_iter()
            .map(|summary| (summary.id, summary))
            .collect()
    };

    Ok(purchases
        .into_iter()
        .map(|purchase| {
            let gig = purchase.gig_id().and_then(|id| summaries.get(&id).cloned());
            PromotionView::at(purchase, gig, now)
        })
        .collect())
}

/// Lists all purchases of a user, newest first.
pub struct ListPromotionsHandler {
    promotions: Arc<dyn PromotionRepository>,
    gigs: Arc<dyn GigRepository>,
}

impl ListPromotionsHandler {
    pub fn new(promotions: Arc<dyn PromotionRepository>, gigs: Arc<dyn GigRepository>) -> Self {
        Self { promotions, gigs }
    }

    pub async fn handle(
        &self,
        query: ListPromotionsQuery,
    ) -> Result<Vec<PromotionView>, PromotionError> {
        let purchases = self.promotions.list_by_user(&query.user_id).await?;
        to_views(self.gigs.as_ref(), purchases, Timestamp::now()).await
    }
}

/// Lists purchases active at request time, ending soonest first.
pub struct ListActivePromotionsHandler {
    promotions: Arc<dyn PromotionRepository>,
    gigs: Arc<dyn GigRepository>,
}

impl ListActivePromotionsHandler {
    pub fn new(promotions: Arc<dyn PromotionRepository>, gigs: Arc<dyn GigRepository>) -> Self {
        Self { promotions, gigs }
    }

    pub async fn handle(
        &self,
        query: ListActivePromotionsQuery,
    ) -> Result<ListActivePromotionsResult, PromotionError> {
        let now = Timestamp::now();
        let purchases = self.promotions.list_active_by_user(&query.user_id, now).await?;
        let promotions = to_views(self.gigs.as_ref(), purchases, now).await?;
        Ok(ListActivePromotionsResult {
            count: promotions.len(),
            promotions,
        })
    }
}
