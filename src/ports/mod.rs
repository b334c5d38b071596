//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `PromotionRepository` - Promotion purchases (single source of truth)
//! - `LegacyPromotionSource` - Legacy promotions awaiting backfill
//! - `UserRepository` - Accounts and the revenue ledger
//! - `GigRepository` - Listings and their promotion badge
//!
//! ## External Service Ports
//!
//! - `PaymentProvider` - Payment intents and webhooks
//! - `VatRateProvider` - Buyer VAT lookup
//! - `NotificationStore` / `RealtimePublisher` - Inbox and live push
//! - `SessionValidator` - Bearer token validation

mod gig_repository;
mod legacy_promotion_source;
mod notification_sender;
mod payment_provider;
mod promotion_repository;
mod session_validator;
mod user_repository;
mod vat_rate_provider;

pub use gig_repository::GigRepository;
pub use legacy_promotion_source::LegacyPromotionSource;
pub use notification_sender::{NotificationStore, RealtimePublisher};
pub use payment_provider::{
    CreatePaymentIntentRequest, PaymentError, PaymentErrorCode, PaymentIntent,
    PaymentIntentStatus, PaymentProvider, WebhookEvent, WebhookEventType,
};
pub use promotion_repository::{HistoryQuery, PromotionRepository};
pub use session_validator::SessionValidator;
pub use user_repository::UserRepository;
pub use vat_rate_provider::VatRateProvider;
