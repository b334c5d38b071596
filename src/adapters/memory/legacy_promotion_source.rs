//! In-memory legacy promotions table.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::domain::foundation::DomainError;
use crate::domain::promotion::LegacyPromotion;
use crate::ports::LegacyPromotionSource;

use super::InMemoryPromotionRepository;

/// Legacy rows; a row counts as migrated once a purchase carries its id.
pub struct InMemoryLegacyPromotionSource {
    rows: RwLock<Vec<LegacyPromotion>>,
    purchases: Arc<InMemoryPromotionRepository>,
}

impl InMemoryLegacyPromotionSource {
    pub fn new(purchases: Arc<InMemoryPromotionRepository>) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            purchases,
        }
    }

    pub fn push(&self, row: LegacyPromotion) {
        self.rows
            .write()
            .expect("InMemoryLegacyPromotionSource: lock poisoned")
            .push(row);
    }
}

#[async_trait]
impl LegacyPromotionSource for InMemoryLegacyPromotionSource {
    async fn list_unmigrated(
        &self,
        exclude: &[String],
        limit: u32,
    ) -> Result<Vec<LegacyPromotion>, DomainError> {
        let rows = self.rows.read().expect("InMemoryLegacyPromotionSource: lock poisoned");
        let mut pending: Vec<LegacyPromotion> = rows
            .iter()
            .filter(|row| !exclude.contains(&row.id) && !self.purchases.has_legacy(&row.id))
            .cloned()
            .collect();
        pending.sort_by_key(|row| row.created_at);
        pending.truncate(limit as usize);
        Ok(pending)
    }
}
