//! In-memory gig store with promotion badges.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, GigId, PromotionId, Timestamp, UserId};
use crate::domain::gig::{Gig, GigSummary, PromotionBadge};
use crate::ports::GigRepository;

pub struct InMemoryGigRepository {
    gigs: RwLock<HashMap<GigId, Gig>>,
}

impl InMemoryGigRepository {
    pub fn new() -> Self {
        Self {
            gigs: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, gig: Gig) {
        self.gigs
            .write()
            .expect("InMemoryGigRepository: lock poisoned")
            .insert(gig.id, gig);
    }

    pub fn get(&self, id: &GigId) -> Option<Gig> {
        self.gigs
            .read()
            .expect("InMemoryGigRepository: lock poisoned")
            .get(id)
            .cloned()
    }

    /// Synchronous form of [`GigRepository::apply_badge_to_gig`].
    pub fn badge_gig(&self, gig_id: &GigId, badge: &PromotionBadge, now: Timestamp) -> bool {
        self.stamp(|gig| &gig.id == gig_id, badge, now) > 0
    }

    /// Synchronous form of [`GigRepository::apply_badge_to_seller`].
    pub fn badge_seller(&self, seller_id: &UserId, badge: &PromotionBadge, now: Timestamp) -> u64 {
        self.stamp(|gig| &gig.seller_id == seller_id, badge, now)
    }

    fn stamp<F>(&self, selects: F, badge: &PromotionBadge, now: Timestamp) -> u64
    where
        F: Fn(&Gig) -> bool,
    {
        let mut gigs = self.gigs.write().expect("InMemoryGigRepository: lock poisoned");
        let mut updated = 0;
        for gig in gigs.values_mut().filter(|gig| selects(gig)) {
            let outranked = gig.promotion.as_ref().map_or(false, |current| {
                current.purchase_id != badge.purchase_id
                    && current.is_live_at(now)
                    && current.priority > badge.priority
            });
            if !outranked {
                gig.promotion = Some(badge.clone());
                updated += 1;
            }
        }
        updated
    }
}

impl Default for InMemoryGigRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GigRepository for InMemoryGigRepository {
    async fn find_by_id(&self, id: &GigId) -> Result<Option<Gig>, DomainError> {
        Ok(self.get(id))
    }

    async fn find_summaries(&self, ids: &[GigId]) -> Result<Vec<GigSummary>, DomainError> {
        let gigs = self.gigs.read().expect("InMemoryGigRepository: lock poisoned");
        Ok(ids.iter().filter_map(|id| gigs.get(id)).map(Gig::summary).collect())
    }

    async fn apply_badge_to_gig(
        &self,
        gig_id: &GigId,
        badge: &PromotionBadge,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        Ok(self.badge_gig(gig_id, badge, now))
    }

    async fn apply_badge_to_seller(
        &self,
        seller_id: &UserId,
        badge: &PromotionBadge,
        now: Timestamp,
    ) -> Result<u64, DomainError> {
        Ok(self.badge_seller(seller_id, badge, now))
    }

    async fn clear_badges_from(&self, purchase_id: &PromotionId) -> Result<u64, DomainError> {
        let mut gigs = self.gigs.write().expect("InMemoryGigRepository: lock poisoned");
        let mut cleared = 0;
        for gig in gigs.values_mut() {
            if gig.promotion.as_ref().map(|b| &b.purchase_id) == Some(purchase_id) {
                gig.promotion = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gig(seller_id: UserId) -> Gig {
        Gig {
            id: GigId::new(),
            seller_id,
            title: "Logo design".to_string(),
            photos: vec![],
            promotion: None,
        }
    }

    fn badge(priority: i32, now: Timestamp) -> PromotionBadge {
        PromotionBadge {
            purchase_id: PromotionId::new(),
            plan_key: "plan".to_string(),
            priority,
            promoted_at: now,
            expires_at: now.add_days(30),
        }
    }

    #[tokio::test]
    async fn live_higher_priority_badge_is_kept() {
        let repo = InMemoryGigRepository::new();
        let seller = UserId::new();
        let listing = gig(seller);
        repo.insert(listing.clone());
        let now = Timestamp::now();
        let strong = badge(4, now);

        repo.apply_badge_to_gig(&listing.id, &strong, now).await.unwrap();
        let applied = repo.apply_badge_to_seller(&seller, &badge(1, now), now).await.unwrap();

        assert_eq!(applied, 0);
        assert_eq!(repo.get(&listing.id).unwrap().promotion.unwrap(), strong);
    }

    #[tokio::test]
    async fn clearing_only_touches_own_badges() {
        let repo = InMemoryGigRepository::new();
        let seller = UserId::new();
        let (a, b) = (gig(seller), gig(seller));
        repo.insert(a.clone());
        repo.insert(b.clone());
        let now = Timestamp::now();
        let mine = badge(1, now);
        repo.apply_badge_to_gig(&a.id, &mine, now).await.unwrap();
        repo.apply_badge_to_gig(&b.id, &badge(2, now), now).await.unwrap();

        let cleared = repo.clear_badges_from(&mine.purchase_id).await.unwrap();

        assert_eq!(cleared, 1);
        assert!(!repo.get(&a.id).unwrap().is_promoted());
        assert!(repo.get(&b.id).unwrap().is_promoted());
    }
}
