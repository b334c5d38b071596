//! Gig listing entity.
//!
//! Listings carry a copy of the promotion that currently boosts them so
//! search pages can sort without joining purchases. The copy is written
//! when a purchase activates and cleared when it is cancelled or expires.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GigId, PromotionId, Timestamp, UserId};

/// Denormalized promotion state on a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionBadge {
    /// Purchase that wrote this badge.
    pub purchase_id: PromotionId,
    pub plan_key: String,
    pub priority: i32,
    pub promoted_at: Timestamp,
    pub expires_at: Timestamp,
}

impl PromotionBadge {
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        self.promoted_at <= now && now < self.expires_at
    }
}

/// A gig listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gig {
    pub id: GigId,
    pub seller_id: UserId,
    pub title: String,
    pub photos: Vec<String>,
    pub promotion: Option<PromotionBadge>,
}

impl Gig {
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.seller_id == user_id
    }

    /// The `is_promoted` flag listing queries sort on.
    pub fn is_promoted(&self) -> bool {
        self.promotion.is_some()
    }

    pub fn summary(&self) -> GigSummary {
        GigSummary {
            id: self.id,
            title: self.title.clone(),
            photos: self.photos.clone(),
        }
    }
}

/// The slice of a gig shown next to a promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GigSummary {
    pub id: GigId,
    pub title: String,
    pub photos: Vec<String>,
}
