//! VAT lookup port.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::promotion::Rate;
use crate::domain::user::User;

/// Resolves the VAT rate charged to a buyer.
#[async_trait]
pub trait VatRateProvider: Send + Sync {
    async fn vat_rate_for(&self, user: &User) -> Result<Rate, DomainError>;
}
