//! Checks shared by initiation and completion.

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::promotion::{PromotionError, PromotionTarget};
use crate::ports::{GigRepository, PromotionRepository};

use super::badges::release_badges;

/// Fails with `AlreadyActive` when a live purchase already covers `target`.
pub(crate) async fn ensure_no_active_promotion(
    promotions: &dyn PromotionRepository,
    user_id: &UserId,
    target: &PromotionTarget,
    now: Timestamp,
) -> Result<(), PromotionError> {
    match promotions.find_active_for_target(user_id, target, now).await? {
        Some(existing) => Err(PromotionError::already_active(
            target.scope(),
            existing.plan_key.clone(),
            existing.expires_at.unwrap_or(now),
            existing.remaining_days(now),
        )),
        None => Ok(()),
    }
}

/// Expires the user's lapsed purchases on `target` ahead of the sweep.
///
/// Storage uniqueness is keyed on the stored status, so a lapsed row that
/// is still `active` would otherwise block a new purchase.
pub(crate) async fn retire_lapsed_promotions(
    promotions: &dyn PromotionRepository,
    gigs: &dyn GigRepository,
    user_id: &UserId,
    target: &PromotionTarget,
    now: Timestamp,
) -> Result<usize, PromotionError> {
    let lapsed: Vec<_> = promotions
        .list_by_user(user_id)
        .await?
        .into_iter()
        .filter(|p| p.target == *target && p.is_stale_at(now))
        .collect();

    for mut purchase in lapsed.iter().cloned() {
        purchase.expire(now)?;
        promotions.update(&purchase).await?;
        release_badges(gigs, promotions, &purchase, now).await?;
        tracing::debug!(purchase_id = %purchase.id, "Retired lapsed promotion");
    }
    Ok(lapsed.len())
}
