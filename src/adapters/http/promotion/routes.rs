//! Axum router configuration for promotion endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{
    cancel_promotion, check_gig_promotion, complete_promotion, delete_promotion,
    handle_stripe_webhook, initiate_all_gigs_promotion, initiate_gig_promotion,
    list_active_promotions, list_plans, list_promotions, promotion_history, PromotionAppState,
};

/// Promotion routes, mounted at `/promotions`.
///
/// # Routes
///
/// ## Public
/// - `GET /plans` - Plan catalog
///
/// ## Authenticated
/// - `GET /` - Own promotions
/// - `GET /active` - Own live promotions
/// - `GET /history` - Paginated purchase history
/// - `GET /gig/:gig_id/active` - Whether a gig is promoted
/// - `POST /all-gigs` - Initiate an all-gigs purchase
/// - `POST /gig` - Initiate a single-gig purchase
/// - `POST /complete` - Activate after payment
/// - `POST /:promotion_id/cancel` - Cancel
/// - `DELETE /:promotion_id` - Delete
pub fn promotion_routes() -> Router<PromotionAppState> {
    Router::new()
        .route("/", get(list_promotions))
        .route("/plans", get(list_plans))
        .route("/active", get(list_active_promotions))
        .route("/history", get(promotion_history))
        .route("/gig/:gig_id/active", get(check_gig_promotion))
        .route("/all-gigs", post(initiate_all_gigs_promotion))
        .route("/gig", post(initiate_gig_promotion))
        .route("/complete", post(complete_promotion))
        .route("/:promotion_id/cancel", post(cancel_promotion))
        .route("/:promotion_id", delete(delete_promotion))
}

/// Webhook routes, mounted at `/webhooks`.
///
/// Separate from the promotion routes: Stripe authenticates with a
/// signature header rather than a bearer token.
pub fn webhook_routes() -> Router<PromotionAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Both route groups, ready to nest under `/api`.
pub fn promotion_router() -> Router<PromotionAppState> {
    Router::new()
        .nest("/promotions", promotion_routes())
        .nest("/webhooks", webhook_routes())
}
