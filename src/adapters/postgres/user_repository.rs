//! PostgreSQL implementation of UserRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, Money, Timestamp, UserId};
use crate::domain::user::{RevenueLedger, SellerType, User, UserRole};
use crate::ports::UserRepository;

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    username: String,
    full_name: Option<String>,
    role: String,
    is_seller: bool,
    is_company: bool,
    seller_type: Option<String>,
    country_code: Option<String>,
    revenue_total: i64,
    revenue_available: i64,
    revenue_pending: i64,
    revenue_withdrawn: i64,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            email: row.email,
            username: row.username,
            full_name: row.full_name,
            role: UserRole::parse_lenient(&row.role),
            is_seller: row.is_seller,
            is_company: row.is_company,
            seller_type: row.seller_type.as_deref().and_then(SellerType::parse),
            country_code: row.country_code,
            revenue: RevenueLedger {
                total: Money::from_cents(row.revenue_total),
                available: Money::from_cents(row.revenue_available),
                pending: Money::from_cents(row.revenue_pending),
                withdrawn: Money::from_cents(row.revenue_withdrawn),
            },
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

const SELECT_USER: &str = r#"
    SELECT id, email, username, full_name, role, is_seller, is_company, seller_type,
           country_code, revenue_total, revenue_available, revenue_pending,
           revenue_withdrawn, created_at
    FROM users
"#;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let sql = format!("{} WHERE id = $1", SELECT_USER);
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to find user: {}", e)))?;

        Ok(row.map(User::from))
    }

    async fn find_primary_admin(&self) -> Result<Option<User>, DomainError> {
        let sql = format!(
            "{} WHERE role = 'admin' ORDER BY created_at ASC LIMIT 1",
            SELECT_USER
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to find admin: {}", e)))?;

        Ok(row.map(User::from))
    }

    async fn credit_revenue(&self, id: &UserId, amount: Money) -> Result<bool, DomainError> {
        // Single statement: concurrent credits never lose an increment.
        let result = sqlx::query(
            r#"
            UPDATE users SET
                revenue_total = revenue_total + $2,
                revenue_available = revenue_available + $2
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(amount.cents())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to credit revenue: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
