//! PromotionHistoryHandler - Paginated purchase history.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::promotion::{PromotionError, PromotionStatus};
use crate::ports::{GigRepository, HistoryQuery, PromotionRepository};

use super::list_promotions::to_views;
use super::views::PromotionView;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct PromotionHistoryQuery {
    pub user_id: UserId,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Raw filter. Values that are not a known status are ignored.
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit_wide = u64::from(limit);
        Self {
            page,
            limit,
            total,
            pages: (total + limit_wide - 1) / limit_wide,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromotionHistoryResult {
    pub purchases: Vec<PromotionView>,
    pub pagination: Pagination,
}

pub struct PromotionHistoryHandler {
    promotions: Arc<dyn PromotionRepository>,
    gigs: Arc<dyn GigRepository>,
}

impl PromotionHistoryHandler {
    pub fn new(promotions: Arc<dyn PromotionRepository>, gigs: Arc<dyn GigRepository>) -> Self {
        Self { promotions, gigs }
    }

    pub async fn handle(
        &self,
        query: PromotionHistoryQuery,
    ) -> Result<PromotionHistoryResult, PromotionError> {
        let page = query.page.unwrap_or(DEFAULT_PAGE);
        if page == 0 {
            return Err(PromotionError::validation("page", "Page must be at least 1"));
        }
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(PromotionError::validation(
                "limit",
                format!("Limit must be between 1 and {}", MAX_PAGE_SIZE),
            ));
        }

        let now = Timestamp::now();
        let status = query
            .status
            .as_deref()
            .and_then(|raw| raw.trim().parse::<PromotionStatus>().ok());
        let window = HistoryQuery {
            status,
            now,
            offset: (page - 1).saturating_mul(limit),
            limit,
        };

        let (purchases, total) = futures::try_join!(
            self.promotions.list_history(&query.user_id, window),
            self.promotions.count_history(&query.user_id, status, now),
        )?;

        let purchases = to_views(self.gigs.as_ref(), purchases, now).await?;
        Ok(PromotionHistoryResult {
            purchases,
            pagination: Pagination::new(page, limit, total),
        })
    }
}
