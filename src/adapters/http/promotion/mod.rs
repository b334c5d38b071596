//! HTTP adapter for promotion endpoints.
//!
//! - `GET /api/promotions/plans` - Plan catalog
//! - `POST /api/promotions/all-gigs` / `POST /api/promotions/gig` - Initiate a purchase
//! - `POST /api/promotions/complete` - Activate after payment
//! - `GET /api/promotions`, `/active`, `/history` - Own promotions
//! - `GET /api/promotions/gig/:gig_id/active` - Gig promotion check
//! - `POST /api/promotions/:promotion_id/cancel`, `DELETE /api/promotions/:promotion_id`
//! - `POST /api/webhooks/stripe` - Stripe webhooks

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{PromotionApiError, PromotionAppState};
pub use routes::{promotion_router, promotion_routes, webhook_routes};
