//! Promotion handlers.
//!
//! Command and query handlers for the promotion purchase workflow:
//!
//! ## Commands
//! - Initiating a purchase (pricing + payment intent)
//! - Completing a purchase after payment, from the client or a webhook
//! - Cancelling and deleting promotions
//! - Expiring lapsed promotions (scheduled)
//! - Backfilling legacy promotions (one-shot)
//!
//! ## Queries
//! - Own promotions, active promotions and paginated history
//! - Whether a gig is currently promoted

mod backfill_legacy_promotions;
mod badges;
mod cancel_promotion;
mod check_gig_promotion;
mod complete_promotion;
mod delete_promotion;
mod expire_promotions;
mod guards;
mod handle_payment_webhook;
mod initiate_promotion;
mod list_promotions;
mod promotion_history;
mod views;

#[cfg(test)]
pub(crate) mod test_support;

// Commands
pub use backfill_legacy_promotions::{
    BackfillLegacyPromotionsHandler, BackfillLegacyPromotionsResult,
};
pub use cancel_promotion::{CancelPromotionCommand, CancelPromotionHandler};
pub use complete_promotion::{
    CompletePromotionCommand, CompletePromotionHandler, CompletePromotionResult,
    NotificationLinks,
};
pub use delete_promotion::{DeletePromotionCommand, DeletePromotionHandler};
pub use expire_promotions::{ExpirePromotionsHandler, ExpirePromotionsResult};
pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, HandlePaymentWebhookResult,
};
pub use initiate_promotion::{
    InitiatePromotionCommand, InitiatePromotionHandler, InitiatePromotionResult,
};

// Queries
pub use check_gig_promotion::{
    CheckGigPromotionHandler, CheckGigPromotionQuery, CheckGigPromotionResult,
};
pub use list_promotions::{
    ListActivePromotionsHandler, ListActivePromotionsQuery, ListActivePromotionsResult,
    ListPromotionsHandler, ListPromotionsQuery,
};
pub use promotion_history::{
    Pagination, PromotionHistoryHandler, PromotionHistoryQuery, PromotionHistoryResult,
    DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use views::PromotionView;
