//! Read side of the legacy promotions table, used by the backfill.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::promotion::LegacyPromotion;

#[async_trait]
pub trait LegacyPromotionSource: Send + Sync {
    /// Legacy rows with no purchase carrying their id yet, oldest first,
    /// leaving out the ids in `exclude`.
    async fn list_unmigrated(
        &self,
        exclude: &[String],
        limit: u32,
    ) -> Result<Vec<LegacyPromotion>, DomainError>;
}
