//! HTTP handlers for promotion endpoints.
//!
//! These handlers connect axum routes to the promotion command/query handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::promotion::{
    CancelPromotionCommand, CancelPromotionHandler, CheckGigPromotionHandler,
    CheckGigPromotionQuery, CompletePromotionCommand, CompletePromotionHandler,
    DeletePromotionCommand, DeletePromotionHandler, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, HandlePaymentWebhookResult, InitiatePromotionCommand,
    InitiatePromotionHandler, ListActivePromotionsHandler, ListActivePromotionsQuery,
    ListPromotionsHandler, ListPromotionsQuery, NotificationLinks, PromotionHistoryHandler,
    PromotionHistoryQuery, PromotionView,
};
use crate::domain::foundation::{GigId, Timestamp};
use crate::domain::promotion::{PlanDefinition, PricingPolicy, PromotionError, PromotionScope};
use crate::ports::{
    GigRepository, NotificationStore, PaymentProvider, PromotionRepository, RealtimePublisher,
    UserRepository, VatRateProvider,
};

use super::dto::{
    ActivePromotionSummary, ActivePromotionsResponse, CancelPromotionResponse,
    CompletePromotionRequest, CompletePromotionResponse, ErrorResponse, GigPromotionResponse,
    HistoryParams, HistoryResponse, InitiateAllGigsRequest, InitiateGigRequest,
    InitiatePromotionResponse, MessageResponse, PlanResponse, PlansResponse, PromotionResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the promotion routes.
///
/// Cloned per request. Handlers are built on demand from the ports.
#[derive(Clone)]
pub struct PromotionAppState {
    pub users: Arc<dyn UserRepository>,
    pub gigs: Arc<dyn GigRepository>,
    pub promotions: Arc<dyn PromotionRepository>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub vat_rates: Arc<dyn VatRateProvider>,
    pub notifications: Arc<dyn NotificationStore>,
    pub realtime: Arc<dyn RealtimePublisher>,
    pub pricing: PricingPolicy,
    /// ISO currency code intents are created in.
    pub currency: String,
    pub links: NotificationLinks,
}

impl PromotionAppState {
    pub fn initiate_handler(&self) -> InitiatePromotionHandler {
        InitiatePromotionHandler::new(
            self.users.clone(),
            self.gigs.clone(),
            self.promotions.clone(),
            self.vat_rates.clone(),
            self.payment_provider.clone(),
            self.pricing,
            self.currency.clone(),
        )
    }

    pub fn complete_handler(&self) -> CompletePromotionHandler {
        CompletePromotionHandler::new(
            self.users.clone(),
            self.gigs.clone(),
            self.promotions.clone(),
            self.payment_provider.clone(),
            self.notifications.clone(),
            self.realtime.clone(),
            self.links.clone(),
        )
    }

    pub fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        HandlePaymentWebhookHandler::new(
            self.payment_provider.clone(),
            Arc::new(self.complete_handler()),
        )
    }

    pub fn list_handler(&self) -> ListPromotionsHandler {
        ListPromotionsHandler::new(self.promotions.clone(), self.gigs.clone())
    }

    pub fn list_active_handler(&self) -> ListActivePromotionsHandler {
        ListActivePromotionsHandler::new(self.promotions.clone(), self.gigs.clone())
    }

    pub fn history_handler(&self) -> PromotionHistoryHandler {
        PromotionHistoryHandler::new(self.promotions.clone(), self.gigs.clone())
    }

    pub fn check_gig_handler(&self) -> CheckGigPromotionHandler {
        CheckGigPromotionHandler::new(self.promotions.clone())
    }

    pub fn cancel_handler(&self) -> CancelPromotionHandler {
        CancelPromotionHandler::new(self.promotions.clone(), self.gigs.clone())
    }

    pub fn delete_handler(&self) -> DeletePromotionHandler {
        DeletePromotionHandler::new(self.promotions.clone(), self.gigs.clone())
    }
}

fn parse_gig_id(raw: &str) -> Result<GigId, PromotionError> {
    raw.parse()
        .map_err(|_| PromotionError::validation("gig_id", "Invalid gig ID"))
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/promotions/plans - Plan catalog (public)
pub async fn list_plans() -> impl IntoResponse {
    Json(PlansResponse {
        success: true,
        plans: PlanDefinition::all().iter().map(PlanResponse::from).collect(),
    })
}

/// GET /api/promotions - Caller's promotions, newest first
pub async fn list_promotions(
    State(state): State<PromotionAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, PromotionApiError> {
    let views = state
        .list_handler()
        .handle(ListPromotionsQuery { user_id: user.id })
        .await?;

    let response: Vec<PromotionResponse> =
        views.into_iter().map(PromotionResponse::from).collect();
    Ok(Json(response))
}

/// GET /api/promotions/active - Caller's live promotions, ending soonest first
pub async fn list_active_promotions(
    State(state): State<PromotionAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, PromotionApiError> {
    let result = state
        .list_active_handler()
        .handle(ListActivePromotionsQuery { user_id: user.id })
        .await?;

    Ok(Json(ActivePromotionsResponse {
        count: result.count,
        active_promotions: result
            .promotions
            .into_iter()
            .map(PromotionResponse::from)
            .collect(),
    }))
}

/// GET /api/promotions/history - Paginated purchase history
pub async fn promotion_history(
    State(state): State<PromotionAppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, PromotionApiError> {
    let result = state
        .history_handler()
        .handle(PromotionHistoryQuery {
            user_id: user.id,
            page: params.page,
            limit: params.limit,
            status: params.status,
        })
        .await?;

    Ok(Json(HistoryResponse {
        success: true,
        data: result
            .purchases
            .into_iter()
            .map(PromotionResponse::from)
            .collect(),
        pagination: result.pagination.into(),
    }))
}

/// GET /api/promotions/gig/:gig_id/active - Whether a gig is promoted right now
pub async fn check_gig_promotion(
    State(state): State<PromotionAppState>,
    RequireAuth(user): RequireAuth,
    Path(gig_id): Path<String>,
) -> Result<impl IntoResponse, PromotionApiError> {
    let gig_id = parse_gig_id(&gig_id)?;
    let result = state
        .check_gig_handler()
        .handle(CheckGigPromotionQuery {
            caller: user.id,
            gig_id,
        })
        .await?;

    Ok(Json(GigPromotionResponse {
        gig_id: result.gig_id.to_string(),
        has_active_promotion: result.active.is_some(),
        active_promotion: result.active.as_ref().map(ActivePromotionSummary::from),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST / DELETE endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/promotions/all-gigs - Start paying for an all-gigs plan
pub async fn initiate_all_gigs_promotion(
    State(state): State<PromotionAppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<InitiateAllGigsRequest>,
) -> Result<impl IntoResponse, PromotionApiError> {
    let result = state
        .initiate_handler()
        .handle(InitiatePromotionCommand {
            user_id: user.id,
            scope: PromotionScope::AllGigs,
            plan_key: request.plan,
            gig_id: None,
        })
        .await?;

    Ok(Json(InitiatePromotionResponse::from(result)))
}

/// POST /api/promotions/gig - Start paying for a single-gig plan
pub async fn initiate_gig_promotion(
    State(state): State<PromotionAppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<InitiateGigRequest>,
) -> Result<impl IntoResponse, PromotionApiError> {
    let gig_id = request
        .gig_id
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(parse_gig_id)
        .transpose()?;

    let result = state
        .initiate_handler()
        .handle(InitiatePromotionCommand {
            user_id: user.id,
            scope: PromotionScope::SingleGig,
            plan_key: request.plan,
            gig_id,
        })
        .await?;

    Ok(Json(InitiatePromotionResponse::from(result)))
}

/// POST /api/promotions/complete - Activate after the client confirmed payment
pub async fn complete_promotion(
    State(state): State<PromotionAppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CompletePromotionRequest>,
) -> Result<impl IntoResponse, PromotionApiError> {
    let payment_intent_id = request
        .payment_intent_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            PromotionError::validation("payment_intent_id", "Payment intent ID is required")
        })?
        .to_string();
    let scope = request
        .scope()
        .map_err(|message| PromotionError::validation("promotion_type", message))?;
    let gig_id = request
        .gig_id
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(parse_gig_id)
        .transpose()?;

    let result = state
        .complete_handler()
        .handle(CompletePromotionCommand {
            payment_intent_id,
            caller: Some(user.id),
            plan_key: request.plan,
            scope,
            gig_id,
        })
        .await?;

    let message = if result.already_processed {
        "Promotion already activated"
    } else {
        "Promotion activated successfully"
    };
    let view = PromotionView::at(result.purchase, None, Timestamp::now());

    Ok(Json(CompletePromotionResponse {
        success: true,
        message,
        already_processed: result.already_processed,
        promotion: PromotionResponse::from(view),
    }))
}

/// POST /api/promotions/:promotion_id/cancel - Stop a live promotion
pub async fn cancel_promotion(
    State(state): State<PromotionAppState>,
    RequireAuth(user): RequireAuth,
    Path(promotion_ref): Path<String>,
) -> Result<impl IntoResponse, PromotionApiError> {
    let purchase = state
        .cancel_handler()
        .handle(CancelPromotionCommand {
            user_id: user.id,
            promotion_ref,
        })
        .await?;

    let view = PromotionView::at(purchase, None, Timestamp::now());
    Ok(Json(CancelPromotionResponse {
        success: true,
        message: "Promotion cancelled successfully",
        promotion: PromotionResponse::from(view),
    }))
}

/// DELETE /api/promotions/:promotion_id - Remove a finished promotion
pub async fn delete_promotion(
    State(state): State<PromotionAppState>,
    RequireAuth(user): RequireAuth,
    Path(promotion_ref): Path<String>,
) -> Result<impl IntoResponse, PromotionApiError> {
    state
        .delete_handler()
        .handle(DeletePromotionCommand {
            user_id: user.id,
            promotion_ref,
        })
        .await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Promotion deleted successfully",
    }))
}

/// POST /api/webhooks/stripe - Stripe event delivery
///
/// Authenticated by the `Stripe-Signature` header, not a bearer token.
pub async fn handle_stripe_webhook(
    State(state): State<PromotionAppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, PromotionApiError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(PromotionError::InvalidWebhookSignature)?;

    let result = state
        .webhook_handler()
        .handle(HandlePaymentWebhookCommand {
            payload: body.to_vec(),
            signature: signature.to_string(),
        })
        .await?;

    match &result {
        HandlePaymentWebhookResult::PromotionActivated { purchase_id } => {
            tracing::info!(purchase_id = %purchase_id, "Promotion activated from webhook");
        }
        HandlePaymentWebhookResult::PaymentFailed { payment_intent_id } => {
            tracing::info!(payment_intent_id = %payment_intent_id, "Promotion payment failed");
        }
        HandlePaymentWebhookResult::AlreadyProcessed { .. } | HandlePaymentWebhookResult::Ignored => {}
    }

    Ok((StatusCode::OK, Json(serde_json::json!({ "received": true }))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts promotion errors to HTTP responses.
#[derive(Debug)]
pub struct PromotionApiError(PromotionError);

impl From<PromotionError> for PromotionApiError {
    fn from(err: PromotionError) -> Self {
        Self(err)
    }
}

impl PromotionApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PromotionError::Unauthenticated | PromotionError::InvalidWebhookSignature => {
                StatusCode::UNAUTHORIZED
            }
            PromotionError::NotEligible(_) | PromotionError::Forbidden(_) => StatusCode::FORBIDDEN,
            PromotionError::InvalidPlan { .. }
            | PromotionError::ValidationFailed { .. }
            | PromotionError::AlreadyActive { .. }
            | PromotionError::PaymentNotSuccessful { .. }
            | PromotionError::InvalidState { .. } => StatusCode::BAD_REQUEST,
            PromotionError::UserNotFound(_)
            | PromotionError::GigNotFound(_)
            | PromotionError::NotFound(_) => StatusCode::NOT_FOUND,
            PromotionError::PricingFailed(_)
            | PromotionError::PaymentProvider(_)
            | PromotionError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match &self.0 {
            PromotionError::AlreadyActive {
                scope,
                plan_key,
                expires_at,
                remaining_days,
            } => Some(serde_json::json!({
                "promotion_type": scope.as_str(),
                "active_plan": plan_key,
                "expires_at": expires_at.to_rfc3339(),
                "remaining_days": remaining_days,
            })),
            PromotionError::PaymentNotSuccessful { status } => {
                Some(serde_json::json!({ "status": status }))
            }
            PromotionError::InvalidState { current, .. } => {
                Some(serde_json::json!({ "current_status": current.as_str() }))
            }
            PromotionError::ValidationFailed { field, .. } => {
                Some(serde_json::json!({ "field": field }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for PromotionApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Promotion request failed");
        }

        let error_code = self.0.code().to_string();
        let message = self.0.message();
        let body = match self.details() {
            Some(details) => ErrorResponse::with_details(error_code, message, details),
            None => ErrorResponse::new(error_code, message),
        };
        (status, Json(body)).into_response()
    }
}
