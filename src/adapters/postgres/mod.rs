//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresPromotionRepository` - `promotion_purchases`, the authoritative record
//! - `PostgresLegacyPromotionSource` - unmigrated rows of the legacy `promotions` table
//! - `PostgresUserRepository` - accounts and the atomic revenue credit
//! - `PostgresGigRepository` - listings and their promotion badge
//! - `PostgresNotificationStore` - the notification inbox

mod gig_repository;
mod legacy_promotion_source;
mod notification_store;
mod pool;
mod promotion_repository;
mod user_repository;

pub use gig_repository::PostgresGigRepository;
pub use legacy_promotion_source::PostgresLegacyPromotionSource;
pub use notification_store::PostgresNotificationStore;
pub use pool::{connect, run_migrations};
pub use promotion_repository::PostgresPromotionRepository;
pub use user_repository::PostgresUserRepository;
