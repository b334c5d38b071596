//! PostgreSQL implementation of GigRepository.
//!
//! Badge writes are single conditional `UPDATE`s: a gig keeps its current
//! badge when that badge belongs to another purchase, is still live and
//! has a higher priority. Everything else is overwritten.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, GigId, PromotionId, Timestamp, UserId};
use crate::domain::gig::{Gig, GigSummary, PromotionBadge};
use crate::ports::GigRepository;

/// `UPDATE` prefix shared by both badge writes. `$1` selects the gigs.
macro_rules! stamp_badge {
    ($selector:literal) => {
        concat!(
            "UPDATE gigs SET is_promoted = TRUE, promotion_purchase_id = $2, ",
            "promotion_plan = $3, promotion_priority = $4, promoted_at = $5, ",
            "promotion_expires_at = $6 WHERE ",
            $selector,
            " AND NOT COALESCE(",
            "promotion_purchase_id <> $2 AND promoted_at <= $7 AND promotion_expires_at > $7 ",
            "AND promotion_priority > $4, FALSE)"
        )
    };
}

pub struct PostgresGigRepository {
    pool: PgPool,
}

impl PostgresGigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn stamp(
        &self,
        sql: &'static str,
        selector: Uuid,
        badge: &PromotionBadge,
        now: Timestamp,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query(sql)
            .bind(selector)
            .bind(badge.purchase_id.as_uuid())
            .bind(&badge.plan_key)
            .bind(badge.priority)
            .bind(badge.promoted_at.as_datetime())
            .bind(badge.expires_at.as_datetime())
            .bind(now.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to apply promotion badge: {}", e)))?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct GigRow {
    id: Uuid,
    seller_id: Uuid,
    title: String,
    photos: Vec<String>,
    promotion_purchase_id: Option<Uuid>,
    promotion_plan: Option<String>,
    promotion_priority: Option<i32>,
    promoted_at: Option<DateTime<Utc>>,
    promotion_expires_at: Option<DateTime<Utc>>,
}

impl From<GigRow> for Gig {
    fn from(row: GigRow) -> Self {
        // A partially written badge reads as no badge.
        let promotion = match (
            row.promotion_purchase_id,
            row.promoted_at,
            row.promotion_expires_at,
        ) {
            (Some(purchase_id), Some(promoted_at), Some(expires_at)) => Some(PromotionBadge {
                purchase_id: PromotionId::from_uuid(purchase_id),
                plan_key: row.promotion_plan.unwrap_or_default(),
                priority: row.promotion_priority.unwrap_or(0),
                promoted_at: Timestamp::from_datetime(promoted_at),
                expires_at: Timestamp::from_datetime(expires_at),
            }),
            _ => None,
        };

        Gig {
            id: GigId::from_uuid(row.id),
            seller_id: UserId::from_uuid(row.seller_id),
            title: row.title,
            photos: row.photos,
            promotion,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct GigSummaryRow {
    id: Uuid,
    title: String,
    photos: Vec<String>,
}

impl From<GigSummaryRow> for GigSummary {
    fn from(row: GigSummaryRow) -> Self {
        GigSummary {
            id: GigId::from_uuid(row.id),
            title: row.title,
            photos: row.photos,
        }
    }
}

#[async_trait]
impl GigRepository for PostgresGigRepository {
    async fn find_by_id(&self, id: &GigId) -> Result<Option<Gig>, DomainError> {
        let row: Option<GigRow> = sqlx::query_as(
            r#"
            SELECT id, seller_id, title, photos, promotion_purchase_id, promotion_plan,
                   promotion_priority, promoted_at, promotion_expires_at
            FROM gigs
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find gig: {}", e)))?;

        Ok(row.map(Gig::from))
    }

    async fn find_summaries(&self, ids: &[GigId]) -> Result<Vec<GigSummary>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<GigSummaryRow> =
            sqlx::query_as("SELECT id, title, photos FROM gigs WHERE id = ANY($1)")
                .bind(&uuids)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to load gig summaries: {}", e)))?;

        Ok(rows.into_iter().map(GigSummary::from).collect())
    }

    async fn apply_badge_to_gig(
        &self,
        gig_id: &GigId,
        badge: &PromotionBadge,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let updated = self
            .stamp(stamp_badge!("id = $1"), *gig_id.as_uuid(), badge, now)
            .await?;
        Ok(updated > 0)
    }

    async fn apply_badge_to_seller(
        &self,
        seller_id: &UserId,
        badge: &PromotionBadge,
        now: Timestamp,
    ) -> Result<u64, DomainError> {
        self.stamp(stamp_badge!("seller_id = $1"), *seller_id.as_uuid(), badge, now)
            .await
    }

    async fn clear_badges_from(&self, purchase_id: &PromotionId) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE gigs SET
                is_promoted = FALSE,
                promotion_purchase_id = NULL,
                promotion_plan = NULL,
                promotion_priority = NULL,
                promoted_at = NULL,
                promotion_expires_at = NULL
            WHERE promotion_purchase_id = $1
            "#,
        )
        .bind(purchase_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to clear promotion badges: {}", e)))?;

        Ok(result.rows_affected())
    }
}
