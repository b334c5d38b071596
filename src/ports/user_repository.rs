//! User repository port.
//!
//! Read access to accounts plus the one write the promotion workflow
//! needs: crediting the platform's revenue ledger.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Money, UserId};
use crate::domain::user::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// The earliest-created admin, who receives platform fees.
    async fn find_primary_admin(&self) -> Result<Option<User>, DomainError>;

    /// Add `amount` to the user's `total` and `available` revenue.
    ///
    /// Must be a single atomic increment, never read-modify-write.
    /// Returns false if the user does not exist.
    async fn credit_revenue(&self, id: &UserId, amount: Money) -> Result<bool, DomainError>;
}
