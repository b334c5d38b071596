//! Read model shared by the promotion queries.

use crate::domain::foundation::Timestamp;
use crate::domain::gig::GigSummary;
use crate::domain::promotion::{PromotionPurchase, PromotionStatus};

/// A purchase with its request-time derived fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionView {
    pub purchase: PromotionPurchase,
    pub gig: Option<GigSummary>,
    pub status: PromotionStatus,
    pub is_active: bool,
    pub remaining_days: i64,
}

impl PromotionView {
    /// Derives status fields at `now`. Nothing is written back.
    pub fn at(purchase: PromotionPurchase, gig: Option<GigSummary>, now: Timestamp) -> Self {
        Self {
            status: purchase.effective_status(now),
            is_active: purchase.is_active_at(now),
            remaining_days: purchase.remaining_days(now),
            purchase,
            gig,
        }
    }
}
