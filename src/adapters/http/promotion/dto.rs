//! HTTP DTOs (Data Transfer Objects) for promotion endpoints.
//!
//! Amounts are reported in currency units (`40.0`), rates as fractions
//! (`0.2`). Request fields also accept the camelCase names older clients send.

use serde::{Deserialize, Serialize};

use crate::application::handlers::promotion::{
    InitiatePromotionResult, Pagination, PromotionView,
};
use crate::domain::foundation::{Money, Timestamp};
use crate::domain::gig::GigSummary;
use crate::domain::promotion::{
    PaymentPurpose, PlanDefinition, PriceBreakdown, PromotionScope, PromotionStatus,
};

fn units(money: Money) -> f64 {
    money.as_units()
}

fn rfc3339(ts: Option<Timestamp>) -> Option<String> {
    ts.map(|t| t.to_rfc3339())
}

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /promotions/all-gigs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitiateAllGigsRequest {
    #[serde(default, alias = "promotionPlan")]
    pub plan: Option<String>,
}

/// Body of `POST /promotions/gig`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitiateGigRequest {
    #[serde(default, alias = "gigId")]
    pub gig_id: Option<String>,
    #[serde(default, alias = "promotionPlan")]
    pub plan: Option<String>,
}

/// Body of `POST /promotions/complete`.
///
/// Only `payment_intent_id` is required. The rest, when sent, must agree
/// with what was recorded on the intent at initiation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletePromotionRequest {
    #[serde(default)]
    pub payment_intent_id: Option<String>,
    #[serde(default, alias = "promotionPlan")]
    pub plan: Option<String>,
    #[serde(default, alias = "gigId")]
    pub gig_id: Option<String>,
    /// `all_gigs` / `single_gig`, or the intent purposes
    /// `monthly_promotion` / `gig_promotion`.
    #[serde(default, alias = "paymentType")]
    pub promotion_type: Option<String>,
}

impl CompletePromotionRequest {
    /// Parses `promotion_type` in either vocabulary.
    pub fn scope(&self) -> Result<Option<PromotionScope>, String> {
        let Some(raw) = self.promotion_type.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<PromotionScope>()
            .or_else(|_| raw.parse::<PaymentPurpose>().map(|p| p.scope()))
            .map(Some)
            .map_err(|_| format!("Unknown promotion type '{}'", raw))
    }
}

/// Query string of `GET /promotions/history`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// A catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub key: &'static str,
    pub name: &'static str,
    pub promotion_type: PromotionScope,
    pub price: f64,
    pub priority: i32,
    pub duration_days: i64,
}

impl From<&PlanDefinition> for PlanResponse {
    fn from(plan: &PlanDefinition) -> Self {
        Self {
            key: plan.key,
            name: plan.name,
            promotion_type: plan.scope,
            price: units(plan.price),
            priority: plan.priority,
            duration_days: plan.duration_days,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlansResponse {
    pub success: bool,
    pub plans: Vec<PlanResponse>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceBreakdownResponse {
    pub base_price: f64,
    pub vat_rate: f64,
    pub vat_amount: f64,
    pub platform_fee: f64,
    pub total_price: f64,
}

impl From<&PriceBreakdown> for PriceBreakdownResponse {
    fn from(b: &PriceBreakdown) -> Self {
        Self {
            base_price: units(b.base_price),
            vat_rate: b.vat_rate.as_fraction(),
            vat_amount: units(b.vat_amount),
            platform_fee: units(b.platform_fee),
            total_price: units(b.total_price),
        }
    }
}

/// What the client needs to confirm the card payment.
#[derive(Debug, Clone, Serialize)]
pub struct InitiatePromotionResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
    pub plan: PlanResponse,
    pub gig_id: Option<String>,
    pub breakdown: PriceBreakdownResponse,
}

impl From<InitiatePromotionResult> for InitiatePromotionResponse {
    fn from(result: InitiatePromotionResult) -> Self {
        Self {
            client_secret: result.client_secret,
            payment_intent_id: result.payment_intent_id,
            plan: PlanResponse::from(result.plan),
            gig_id: result.target.gig_id().map(|id| id.to_string()),
            breakdown: PriceBreakdownResponse::from(&result.breakdown),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GigSummaryResponse {
    pub id: String,
    pub title: String,
    pub photos: Vec<String>,
}

impl From<GigSummary> for GigSummaryResponse {
    fn from(gig: GigSummary) -> Self {
        Self {
            id: gig.id.to_string(),
            title: gig.title,
            photos: gig.photos,
        }
    }
}

/// A purchase with its request-time derived fields.
#[derive(Debug, Clone, Serialize)]
pub struct PromotionResponse {
    pub id: String,
    pub legacy_promotion_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub plan_key: String,
    pub plan_name: String,
    pub plan_priority: i32,
    pub promotion_type: PromotionScope,
    pub gig_id: Option<String>,
    /// Effective status: a lapsed `active` record reads as `expired`.
    pub status: PromotionStatus,
    pub is_active: bool,
    pub remaining_days: i64,
    pub duration_days: i64,
    pub base_amount: f64,
    pub vat_rate: f64,
    pub vat_amount: f64,
    pub platform_fee: f64,
    pub total_amount: f64,
    pub purchased_at: String,
    pub activated_at: Option<String>,
    pub expires_at: Option<String>,
    pub created_at: String,
    pub gig: Option<GigSummaryResponse>,
}

impl From<PromotionView> for PromotionResponse {
    fn from(view: PromotionView) -> Self {
        let p = view.purchase;
        Self {
            id: p.id.to_string(),
            legacy_promotion_id: p.legacy_promotion_id,
            payment_intent_id: p.stripe_payment_intent_id,
            plan_key: p.plan_key,
            plan_name: p.plan_name,
            plan_priority: p.plan_priority,
            promotion_type: p.target.scope(),
            gig_id: p.target.gig_id().map(|id| id.to_string()),
            status: view.status,
            is_active: view.is_active,
            remaining_days: view.remaining_days,
            duration_days: p.duration_days,
            base_amount: units(p.charges.base_amount),
            vat_rate: p.charges.vat_rate.as_fraction(),
            vat_amount: units(p.charges.vat_amount),
            platform_fee: units(p.charges.platform_fee),
            total_amount: units(p.charges.total_amount),
            purchased_at: p.purchased_at.to_rfc3339(),
            activated_at: rfc3339(p.activated_at),
            expires_at: rfc3339(p.expires_at),
            created_at: p.created_at.to_rfc3339(),
            gig: view.gig.map(GigSummaryResponse::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletePromotionResponse {
    pub success: bool,
    pub message: &'static str,
    pub already_processed: bool,
    pub promotion: PromotionResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivePromotionsResponse {
    pub active_promotions: Vec<PromotionResponse>,
    pub count: usize,
}

/// The live promotion on a gig, trimmed to what purchase buttons need.
#[derive(Debug, Clone, Serialize)]
pub struct ActivePromotionSummary {
    pub id: String,
    pub plan: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub remaining_days: i64,
}

impl From<&PromotionView> for ActivePromotionSummary {
    fn from(view: &PromotionView) -> Self {
        Self {
            id: view.purchase.id.to_string(),
            plan: view.purchase.plan_key.clone(),
            start_date: rfc3339(view.purchase.activated_at),
            end_date: rfc3339(view.purchase.expires_at),
            remaining_days: view.remaining_days,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GigPromotionResponse {
    pub gig_id: String,
    pub has_active_promotion: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_promotion: Option<ActivePromotionSummary>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PaginationResponse {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl From<Pagination> for PaginationResponse {
    fn from(p: Pagination) -> Self {
        Self {
            page: p.page,
            limit: p.limit,
            total: p.total,
            pages: p.pages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub data: Vec<PromotionResponse>,
    pub pagination: PaginationResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelPromotionResponse {
    pub success: bool,
    pub message: &'static str,
    pub promotion: PromotionResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}
