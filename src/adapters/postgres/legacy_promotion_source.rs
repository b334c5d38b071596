//! PostgreSQL reader for the legacy `promotions` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, GigId, Money, Timestamp, UserId};
use crate::domain::promotion::{LegacyPromotion, LegacyPromotionStatus};
use crate::ports::LegacyPromotionSource;

pub struct PostgresLegacyPromotionSource {
    pool: PgPool,
}

impl PostgresLegacyPromotionSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LegacyRow {
    id: String,
    user_id: Uuid,
    gig_id: Option<Uuid>,
    is_for_all: String,
    promotion_plan: String,
    status: String,
    promotion_start_date: Option<DateTime<Utc>>,
    promotion_end_date: Option<DateTime<Utc>>,
    amount_paid: i64,
    created_at: DateTime<Utc>,
}

/// The old writer stored this flag both as a boolean and as text.
fn legacy_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "t" | "1" | "yes"
    )
}

impl TryFrom<LegacyRow> for LegacyPromotion {
    type Error = DomainError;

    fn try_from(row: LegacyRow) -> Result<Self, Self::Error> {
        let status = LegacyPromotionStatus::parse(&row.status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Legacy promotion {} has unknown status '{}'", row.id, row.status),
            )
        })?;

        Ok(LegacyPromotion {
            is_for_all: legacy_flag(&row.is_for_all),
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            gig_id: row.gig_id.map(GigId::from_uuid),
            promotion_plan: row.promotion_plan,
            status,
            promotion_start_date: row.promotion_start_date.map(Timestamp::from_datetime),
            promotion_end_date: row.promotion_end_date.map(Timestamp::from_datetime),
            amount_paid: Money::from_cents(row.amount_paid),
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl LegacyPromotionSource for PostgresLegacyPromotionSource {
    async fn list_unmigrated(
        &self,
        exclude: &[String],
        limit: u32,
    ) -> Result<Vec<LegacyPromotion>, DomainError> {
        let rows: Vec<LegacyRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.user_id, p.gig_id, p.is_for_all, p.promotion_plan, p.status,
                   p.promotion_start_date, p.promotion_end_date, p.amount_paid, p.created_at
            FROM promotions p
            WHERE NOT EXISTS (
                SELECT 1 FROM promotion_purchases pp WHERE pp.legacy_promotion_id = p.id
            )
            AND NOT (p.id = ANY($2))
            ORDER BY p.created_at ASC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .bind(exclude)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to read legacy promotions: {}", e)))?;

        rows.into_iter().map(LegacyPromotion::try_from).collect()
    }
}
