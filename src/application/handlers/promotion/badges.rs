//! Keeps the promotion badge on gig listings in step with purchases.

use crate::domain::foundation::Timestamp;
use crate::domain::gig::PromotionBadge;
use crate::domain::promotion::{PromotionError, PromotionPurchase, PromotionTarget};
use crate::ports::{GigRepository, PromotionRepository};

pub(crate) fn badge_for(purchase: &PromotionPurchase) -> Option<PromotionBadge> {
    Some(PromotionBadge {
        purchase_id: purchase.id,
        plan_key: purchase.plan_key.clone(),
        priority: purchase.plan_priority,
        promoted_at: purchase.activated_at?,
        expires_at: purchase.expires_at?,
    })
}

/// Writes the purchase's badge onto the gig(s) it covers.
///
/// Idempotent: re-applying the same purchase rewrites identical values.
/// Returns the number of listings updated.
pub(crate) async fn apply_badges(
    gigs: &dyn GigRepository,
    purchase: &PromotionPurchase,
    now: Timestamp,
) -> Result<u64, PromotionError> {
    let Some(badge) = badge_for(purchase) else {
        return Ok(0);
    };

    let updated = match purchase.target {
        PromotionTarget::SingleGig(gig_id) => {
            u64::from(gigs.apply_badge_to_gig(&gig_id, &badge, now).await?)
        }
        PromotionTarget::AllGigs => gigs.apply_badge_to_seller(&purchase.user_id, &badge, now).await?,
    };

    tracing::debug!(
        purchase_id = %purchase.id,
        scope = %purchase.scope(),
        updated,
        "Applied promotion badge"
    );
    Ok(updated)
}

/// Clears the purchase's badges, then restores any other live promotion
/// of the same seller so covered gigs stay promoted.
pub(crate) async fn release_badges(
    gigs: &dyn GigRepository,
    promotions: &dyn PromotionRepository,
    purchase: &PromotionPurchase,
    now: Timestamp,
) -> Result<u64, PromotionError> {
    let cleared = gigs.clear_badges_from(&purchase.id).await?;
    if cleared == 0 {
        return Ok(0);
    }

    let mut remaining = promotions.list_active_by_user(&purchase.user_id, now).await?;
    remaining.retain(|other| other.id != purchase.id);
    // Lower priority first so higher priority wins where scopes overlap.
    remaining.sort_by_key(|other| other.plan_priority);
    for other in &remaining {
        apply_badges(gigs, other, now).await?;
    }

    tracing::debug!(purchase_id = %purchase.id, cleared, restored = remaining.len(), "Released promotion badges");
    Ok(cleared)
}
