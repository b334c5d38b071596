//! Gig promotions.
//!
//! A promotion is a paid, time-boxed visibility boost for one gig or for
//! every gig a seller owns. Purchases are created only once the payment
//! processor confirms the charge; until then nothing is persisted.
//!
//! # Module Organization
//!
//! - `plan` - fixed plan catalog per scope
//! - `pricing` - base + VAT + platform fee breakdown
//! - `status` - purchase lifecycle state machine
//! - `purchase` - the authoritative purchase record and its derived views
//! - `legacy` - records from the old promotions table and their conversion
//! - `metadata` - what travels on the payment intent between initiation and completion
//! - `notification` - messages emitted on activation

mod errors;
mod legacy;
mod metadata;
mod notification;
mod plan;
mod pricing;
mod purchase;
mod status;

pub use errors::PromotionError;
pub use legacy::{LegacyPromotion, LegacyPromotionStatus};
pub use metadata::{PaymentPurpose, PromotionIntentMetadata};
pub use notification::{Notification, NotificationKind};
pub use plan::{plans_for_scope, PlanDefinition, PromotionScope, PROMOTION_DURATION_DAYS};
pub use pricing::{PriceBreakdown, PricingError, PricingPolicy, Rate};
pub use purchase::{PromotionCharges, PromotionPurchase, PromotionTarget};
pub use status::PromotionStatus;
