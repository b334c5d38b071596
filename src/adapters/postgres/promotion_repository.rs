//! PostgreSQL implementation of PromotionRepository.
//!
//! `promotion_purchases` is the single durable record of every promotion.
//! Its unique constraints do the duplicate detection:
//!
//! - `promotion_purchases_payment_intent_key` - one purchase per payment intent
//! - `promotion_purchases_legacy_key` - one purchase per legacy promotion
//! - `promotion_purchases_active_gig_key` / `..._active_all_gigs_key` -
//!   partial indexes allowing one `active` row per gig and one per seller
//!   for the all-gigs scope

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, GigId, Money, PromotionId, Timestamp, UserId,
};
use crate::domain::promotion::{
    PromotionCharges, PromotionPurchase, PromotionScope, PromotionStatus, PromotionTarget, Rate,
};
use crate::ports::{HistoryQuery, PromotionRepository};

/// Prefixes `$tail` with the full purchase column list.
macro_rules! select_purchases {
    ($tail:literal) => {
        concat!(
            "SELECT id, legacy_promotion_id, stripe_payment_intent_id, user_id, plan_key, ",
            "plan_name, plan_priority, promotion_type, gig_id, status, purchased_at, ",
            "activated_at, expires_at, base_amount, vat_rate_bp, vat_amount, platform_fee, ",
            "total_amount, duration_days, created_at, updated_at ",
            "FROM promotion_purchases ",
            $tail
        )
    };
}

pub struct PostgresPromotionRepository {
    pool: PgPool,
}

impl PostgresPromotionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    legacy_promotion_id: Option<String>,
    stripe_payment_intent_id: Option<String>,
    user_id: Uuid,
    plan_key: String,
    plan_name: String,
    plan_priority: i32,
    promotion_type: String,
    gig_id: Option<Uuid>,
    status: String,
    purchased_at: DateTime<Utc>,
    activated_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    base_amount: i64,
    vat_rate_bp: i32,
    vat_amount: i64,
    platform_fee: i64,
    total_amount: i64,
    duration_days: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for PromotionPurchase {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let scope: PromotionScope = row.promotion_type.parse().map_err(corrupt)?;
        let target =
            PromotionTarget::from_parts(scope, row.gig_id.map(GigId::from_uuid)).map_err(corrupt)?;
        let status: PromotionStatus = row.status.parse().map_err(corrupt)?;
        let vat_rate = u32::try_from(row.vat_rate_bp)
            .ok()
            .and_then(|bp| Rate::from_basis_points(bp).ok())
            .ok_or_else(|| corrupt(format!("invalid vat_rate_bp: {}", row.vat_rate_bp)))?;

        Ok(PromotionPurchase {
            id: PromotionId::from_uuid(row.id),
            legacy_promotion_id: row.legacy_promotion_id,
            stripe_payment_intent_id: row.stripe_payment_intent_id,
            user_id: UserId::from_uuid(row.user_id),
            plan_key: row.plan_key,
            plan_name: row.plan_name,
            plan_priority: row.plan_priority,
            target,
            status,
            purchased_at: Timestamp::from_datetime(row.purchased_at),
            activated_at: row.activated_at.map(Timestamp::from_datetime),
            expires_at: row.expires_at.map(Timestamp::from_datetime),
            charges: PromotionCharges {
                base_amount: Money::from_cents(row.base_amount),
                vat_rate,
                vat_amount: Money::from_cents(row.vat_amount),
                platform_fee: Money::from_cents(row.platform_fee),
                total_amount: Money::from_cents(row.total_amount),
            },
            duration_days: i64::from(row.duration_days),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn corrupt(reason: impl Into<String>) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid promotion purchase row: {}", reason.into()),
    )
}

fn query_failed(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("Failed to {}: {}", action, e))
}

/// Maps unique-constraint violations onto the codes handlers branch on.
fn insert_failed(e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &e {
        match db_err.constraint() {
            Some("promotion_purchases_payment_intent_key") => {
                return DomainError::new(
                    ErrorCode::DuplicatePaymentIntent,
                    "Payment intent already recorded",
                );
            }
            Some("promotion_purchases_legacy_key") => {
                return DomainError::new(
                    ErrorCode::DuplicatePaymentIntent,
                    "Legacy promotion already migrated",
                );
            }
            Some("promotion_purchases_active_gig_key")
            | Some("promotion_purchases_active_all_gigs_key") => {
                return DomainError::new(
                    ErrorCode::PromotionConflict,
                    "An active promotion already covers this target",
                );
            }
            _ => {}
        }
    }
    query_failed("insert promotion purchase", e)
}

/// Converts a batch, dropping rows the domain cannot represent so one bad
/// row does not fail every listing or sweep that touches it.
fn to_purchases(rows: Vec<PurchaseRow>) -> Vec<PromotionPurchase> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match PromotionPurchase::try_from(row) {
                Ok(purchase) => Some(purchase),
                Err(err) => {
                    tracing::warn!(purchase_id = %id, error = %err, "Skipping unreadable promotion purchase");
                    None
                }
            }
        })
        .collect()
}

fn to_i64(value: u32) -> i64 {
    i64::from(value)
}

#[async_trait]
impl PromotionRepository for PostgresPromotionRepository {
    async fn insert(&self, purchase: &PromotionPurchase) -> Result<(), DomainError> {
        let charges = &purchase.charges;
        sqlx::query(
            r#"
            INSERT INTO promotion_purchases (
                id, legacy_promotion_id, stripe_payment_intent_id, user_id, plan_key,
                plan_name, plan_priority, promotion_type, gig_id, status, purchased_at,
                activated_at, expires_at, base_amount, vat_rate_bp, vat_amount, platform_fee,
                total_amount, duration_days, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            "#,
        )
        .bind(purchase.id.as_uuid())
        .bind(&purchase.legacy_promotion_id)
        .bind(&purchase.stripe_payment_intent_id)
        .bind(purchase.user_id.as_uuid())
        .bind(&purchase.plan_key)
        .bind(&purchase.plan_name)
        .bind(purchase.plan_priority)
        .bind(purchase.scope().as_str())
        .bind(purchase.gig_id().map(|id| *id.as_uuid()))
        .bind(purchase.status.as_str())
        .bind(purchase.purchased_at.as_datetime())
        .bind(purchase.activated_at.map(|t| *t.as_datetime()))
        .bind(purchase.expires_at.map(|t| *t.as_datetime()))
        .bind(charges.base_amount.cents())
        .bind(charges.vat_rate.basis_points() as i32)
        .bind(charges.vat_amount.cents())
        .bind(charges.platform_fee.cents())
        .bind(charges.total_amount.cents())
        .bind(purchase.duration_days as i32)
        .bind(purchase.created_at.as_datetime())
        .bind(purchase.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(insert_failed)?;

        Ok(())
    }

    async fn update(&self, purchase: &PromotionPurchase) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE promotion_purchases SET
                status = $2,
                activated_at = $3,
                expires_at = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(purchase.id.as_uuid())
        .bind(purchase.status.as_str())
        .bind(purchase.activated_at.map(|t| *t.as_datetime()))
        .bind(purchase.expires_at.map(|t| *t.as_datetime()))
        .bind(purchase.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(insert_failed)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PromotionNotFound,
                format!("Promotion {} not found", purchase.id),
            ));
        }

        Ok(())
    }

    async fn delete(&self, id: &PromotionId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM promotion_purchases WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| query_failed("delete promotion purchase", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: &PromotionId) -> Result<Option<PromotionPurchase>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as(select_purchases!("WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_failed("find promotion purchase", e))?;

        row.map(PromotionPurchase::try_from).transpose()
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<PromotionPurchase>, DomainError> {
        if let Ok(id) = reference.parse::<PromotionId>() {
            if let Some(found) = self.find_by_id(&id).await? {
                return Ok(Some(found));
            }
        }

        let row: Option<PurchaseRow> =
            sqlx::query_as(select_purchases!("WHERE legacy_promotion_id = $1"))
                .bind(reference.trim())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| query_failed("find promotion by legacy id", e))?;

        row.map(PromotionPurchase::try_from).transpose()
    }

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<PromotionPurchase>, DomainError> {
        let row: Option<PurchaseRow> =
            sqlx::query_as(select_purchases!("WHERE stripe_payment_intent_id = $1"))
                .bind(payment_intent_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| query_failed("find promotion by payment intent", e))?;

        row.map(PromotionPurchase::try_from).transpose()
    }

    async fn find_active_for_target(
        &self,
        user_id: &UserId,
        target: &PromotionTarget,
        now: Timestamp,
    ) -> Result<Option<PromotionPurchase>, DomainError> {
        let row: Option<PurchaseRow> = match target {
            PromotionTarget::AllGigs => {
                sqlx::query_as::<_, PurchaseRow>(select_purchases!(
                    "WHERE user_id = $1 AND promotion_type = 'all_gigs' AND status = 'active' \
                     AND activated_at <= $2 AND expires_at > $2 LIMIT 1"
                ))
                .bind(user_id.as_uuid())
                .bind(now.as_datetime())
                .fetch_optional(&self.pool)
                .await
            }
            PromotionTarget::SingleGig(gig_id) => {
                sqlx::query_as::<_, PurchaseRow>(select_purchases!(
                    "WHERE gig_id = $1 AND promotion_type = 'single_gig' AND status = 'active' \
                     AND activated_at <= $2 AND expires_at > $2 LIMIT 1"
                ))
                .bind(gig_id.as_uuid())
                .bind(now.as_datetime())
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(|e| query_failed("find active promotion", e))?;

        row.map(PromotionPurchase::try_from).transpose()
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<PromotionPurchase>, DomainError> {
        let rows: Vec<PurchaseRow> =
            sqlx::query_as(select_purchases!("WHERE user_id = $1 ORDER BY created_at DESC"))
                .bind(user_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| query_failed("list promotions", e))?;

        Ok(to_purchases(rows))
    }

    async fn list_active_by_user(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<Vec<PromotionPurchase>, DomainError> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(select_purchases!(
            "WHERE user_id = $1 AND status = 'active' AND activated_at <= $2 AND expires_at > $2 \
             ORDER BY expires_at ASC"
        ))
        .bind(user_id.as_uuid())
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("list active promotions", e))?;

        Ok(to_purchases(rows))
    }

    async fn list_history(
        &self,
        user_id: &UserId,
        query: HistoryQuery,
    ) -> Result<Vec<PromotionPurchase>, DomainError> {
        // Lapsed rows still stored as active are filtered as expired
        let rows: Vec<PurchaseRow> = sqlx::query_as(select_purchases!(
            "WHERE user_id = $1 AND ($2::text IS NULL OR \
             (CASE WHEN status = 'active' AND (expires_at IS NULL OR expires_at <= $3) \
              THEN 'expired' ELSE status END) = $2) \
             ORDER BY created_at DESC OFFSET $4 LIMIT $5"
        ))
        .bind(user_id.as_uuid())
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.now.as_datetime())
        .bind(to_i64(query.offset))
        .bind(to_i64(query.limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("list promotion history", e))?;

        Ok(to_purchases(rows))
    }

    async fn count_history(
        &self,
        user_id: &UserId,
        status: Option<PromotionStatus>,
        now: Timestamp,
    ) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM promotion_purchases \
             WHERE user_id = $1 AND ($2::text IS NULL OR \
             (CASE WHEN status = 'active' AND (expires_at IS NULL OR expires_at <= $3) \
              THEN 'expired' ELSE status END) = $2)",
        )
        .bind(user_id.as_uuid())
        .bind(status.map(|s| s.as_str()))
        .bind(now.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_failed("count promotion history", e))?;

        Ok(count.max(0) as u64)
    }

    async fn find_stale_active(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<PromotionPurchase>, DomainError> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(select_purchases!(
            "WHERE status = 'active' AND (expires_at IS NULL OR expires_at <= $1) \
             ORDER BY expires_at ASC NULLS FIRST LIMIT $2"
        ))
        .bind(now.as_datetime())
        .bind(to_i64(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("find stale promotions", e))?;

        Ok(to_purchases(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> PurchaseRow {
        let now = Utc::now();
        PurchaseRow {
            id: Uuid::new_v4(),
            legacy_promotion_id: None,
            stripe_payment_intent_id: Some("pi_123".to_string()),
            user_id: Uuid::new_v4(),
            plan_key: "featured".to_string(),
            plan_name: "Featured".to_string(),
            plan_priority: 2,
            promotion_type: "single_gig".to_string(),
            gig_id: Some(Uuid::new_v4()),
            status: "active".to_string(),
            purchased_at: now,
            activated_at: Some(now),
            expires_at: Some(now + chrono::Duration::days(30)),
            base_amount: 2_500,
            vat_rate_bp: 2_000,
            vat_amount: 500,
            platform_fee: 125,
            total_amount: 3_125,
            duration_days: 30,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_converts_to_purchase() {
        let row = row();
        let gig = row.gig_id.unwrap();

        let purchase = PromotionPurchase::try_from(row).unwrap();

        assert_eq!(purchase.target, PromotionTarget::SingleGig(GigId::from_uuid(gig)));
        assert_eq!(purchase.status, PromotionStatus::Active);
        assert_eq!(purchase.charges.vat_rate.basis_points(), 2_000);
        assert_eq!(purchase.charges.total_amount, Money::from_cents(3_125));
        assert_eq!(purchase.duration_days, 30);
    }

    #[test]
    fn single_gig_row_without_gig_is_rejected() {
        let row = PurchaseRow {
            gig_id: None,
            ..row()
        };
        let err = PromotionPurchase::try_from(row).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn unreadable_rows_are_skipped_in_batches() {
        let good = row();
        let good_id = good.id;
        let orphaned = PurchaseRow {
            id: Uuid::new_v4(),
            gig_id: None,
            ..row()
        };

        let purchases = to_purchases(vec![orphaned, good]);

        assert_eq!(purchases.len(), 1);
        assert_eq!(purchases[0].id, PromotionId::from_uuid(good_id));
    }

    #[test]
    fn schema_removes_purchases_with_their_gig() {
        let schema = include_str!("../../../migrations/0001_promotions.sql");
        let gig_column = schema
            .lines()
            .find(|line| line.trim_start().starts_with("gig_id") && line.contains("REFERENCES gigs"))
            .unwrap();

        assert!(gig_column.contains("ON DELETE CASCADE"));
        assert!(schema.contains("CHECK (promotion_type <> 'single_gig' OR gig_id IS NOT NULL)"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let row = PurchaseRow {
            status: "paused".to_string(),
            ..row()
        };
        assert!(PromotionPurchase::try_from(row).is_err());
    }

    #[test]
    fn out_of_range_vat_rate_is_rejected() {
        let row = PurchaseRow {
            vat_rate_bp: -5,
            ..row()
        };
        assert!(PromotionPurchase::try_from(row).is_err());
    }

    #[test]
    fn select_macro_prefixes_columns() {
        let sql = select_purchases!("WHERE id = $1");
        assert!(sql.starts_with("SELECT id, legacy_promotion_id"));
        assert!(sql.ends_with("FROM promotion_purchases WHERE id = $1"));
    }
}
