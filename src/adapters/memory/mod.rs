//! In-memory adapters for tests and local runs.
//!
//! These mirror the storage guarantees of the Postgres adapters (unique
//! payment intent, one active purchase per target, atomic revenue credit)
//! so handler tests exercise the same failure paths.
//!
//! # Panics
//!
//! Methods panic if an internal lock is poisoned. Not for production use.

mod gig_repository;
mod legacy_promotion_source;
mod notifications;
mod promotion_repository;
mod user_repository;

pub use gig_repository::InMemoryGigRepository;
pub use legacy_promotion_source::InMemoryLegacyPromotionSource;
pub use notifications::{InMemoryNotificationStore, InMemoryRealtimePublisher};
pub use promotion_repository::InMemoryPromotionRepository;
pub use user_repository::InMemoryUserRepository;
