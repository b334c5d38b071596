//! Gig repository port.
//!
//! Besides lookups, owns the denormalized promotion badge on listings.
//! Badge writes never downgrade: a gig already carrying a live badge of
//! higher priority keeps it.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, GigId, PromotionId, Timestamp, UserId};
use crate::domain::gig::{Gig, GigSummary, PromotionBadge};

#[async_trait]
pub trait GigRepository: Send + Sync {
    async fn find_by_id(&self, id: &GigId) -> Result<Option<Gig>, DomainError>;

    /// Summaries for the given ids. Unknown ids are skipped.
    async fn find_summaries(&self, ids: &[GigId]) -> Result<Vec<GigSummary>, DomainError>;

    /// Write `badge` onto one gig. Returns false if the gig was left unchanged.
    async fn apply_badge_to_gig(
        &self,
        gig_id: &GigId,
        badge: &PromotionBadge,
        now: Timestamp,
    ) -> Result<bool, DomainError>;

    /// Write `badge` onto every gig of a seller. Returns the number updated.
    async fn apply_badge_to_seller(
        &self,
        seller_id: &UserId,
        badge: &PromotionBadge,
        now: Timestamp,
    ) -> Result<u64, DomainError>;

    /// Remove badges written by a purchase. Returns the number cleared.
    async fn clear_badges_from(&self, purchase_id: &PromotionId) -> Result<u64, DomainError>;
}
