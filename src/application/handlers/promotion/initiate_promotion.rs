//! InitiatePromotionHandler - Command handler for starting a promotion purchase.
//!
//! Validates the buyer and the plan, prices the purchase and opens a payment
//! intent carrying the breakdown. Nothing is persisted: the purchase record
//! is created only once the payment is confirmed.

use std::sync::Arc;

use crate::domain::foundation::{GigId, Timestamp, UserId};
use crate::domain::promotion::{
    PlanDefinition, PriceBreakdown, PricingPolicy, PromotionError, PromotionIntentMetadata,
    PromotionScope, PromotionTarget,
};
use crate::ports::{
    CreatePaymentIntentRequest, GigRepository, PaymentProvider, PromotionRepository,
    UserRepository, VatRateProvider,
};

use super::guards::ensure_no_active_promotion;

/// Command to start a promotion purchase.
#[derive(Debug, Clone)]
pub struct InitiatePromotionCommand {
    pub user_id: UserId,
    pub scope: PromotionScope,
    pub plan_key: Option<String>,
    /// Required for single-gig purchases, ignored otherwise.
    pub gig_id: Option<GigId>,
}

/// What the client needs to confirm the payment.
#[derive(Debug, Clone)]
pub struct InitiatePromotionResult {
    pub payment_intent_id: String,
    pub client_secret: String,
    pub plan: &'static PlanDefinition,
    pub target: PromotionTarget,
    pub breakdown: PriceBreakdown,
}

/// Handler for promotion purchase initiation.
pub struct InitiatePromotionHandler {
    users: Arc<dyn UserRepository>,
    gigs: Arc<dyn GigRepository>,
    promotions: Arc<dyn PromotionRepository>,
    vat_rates: Arc<dyn VatRateProvider>,
    payment_provider: Arc<dyn PaymentProvider>,
    pricing: PricingPolicy,
    currency: String,
}

impl InitiatePromotionHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        gigs: Arc<dyn GigRepository>,
        promotions: Arc<dyn PromotionRepository>,
        vat_rates: Arc<dyn VatRateProvider>,
        payment_provider: Arc<dyn PaymentProvider>,
        pricing: PricingPolicy,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            users,
            gigs,
            promotions,
            vat_rates,
            payment_provider,
            pricing,
            currency: currency.into(),
        }
    }

    pub async fn handle(
        &self,
        cmd: InitiatePromotionCommand,
    ) -> Result<InitiatePromotionResult, PromotionError> {
        let now = Timestamp::now();

        // 1. Buyer must exist and be allowed to sell
        let user = self
            .users
            .find_by_id(&cmd.user_id)
            .await?
            .ok_or(PromotionError::UserNotFound(cmd.user_id))?;

        if !user.can_promote_gigs() {
            tracing::info!(user_id = %user.id, role = %user.role, "Promotion refused: not a seller");
            return Err(PromotionError::not_eligible(user.id));
        }

        // 2. Plan must be offered for this scope
        let plan_key = cmd.plan_key.unwrap_or_default();
        if plan_key.trim().is_empty() {
            return Err(PromotionError::invalid_plan(cmd.scope, ""));
        }
        let plan = PlanDefinition::find(cmd.scope, &plan_key)
            .ok_or_else(|| PromotionError::invalid_plan(cmd.scope, plan_key.clone()))?;

        // 3. Resolve the target; single gigs must exist and belong to the buyer
        let target = match cmd.scope {
            PromotionScope::AllGigs => PromotionTarget::AllGigs,
            PromotionScope::SingleGig => {
                let gig_id = cmd
                    .gig_id
                    .ok_or_else(|| PromotionError::validation("gig_id", "Gig ID is required!"))?;
                let gig = self
                    .gigs
                    .find_by_id(&gig_id)
                    .await?
                    .ok_or(PromotionError::GigNotFound(gig_id))?;
                if !gig.is_owned_by(&user.id) {
                    return Err(PromotionError::forbidden(
                        "You can only promote your own gigs",
                    ));
                }
                PromotionTarget::SingleGig(gig_id)
            }
        };

        // 4. No overlapping live promotion
        ensure_no_active_promotion(self.promotions.as_ref(), &user.id, &target, now).await?;

        // 5. Price it
        let vat_rate = self
            .vat_rates
            .vat_rate_for(&user)
            .await
            .map_err(|e| PromotionError::PricingFailed(e.to_string()))?;
        let breakdown = self.pricing.breakdown(plan.price, vat_rate)?;

        // 6. Open the payment intent; the metadata is what completion trusts
        let metadata = PromotionIntentMetadata {
            plan_key: plan.key.to_string(),
            user_id: user.id,
            target,
            breakdown,
        };
        let intent = self
            .payment_provider
            .create_payment_intent(CreatePaymentIntentRequest {
                amount: breakdown.total_price,
                currency: self.currency.clone(),
                email: Some(user.email.clone()),
                description: Some(format!("{} promotion", plan.name)),
                metadata: metadata.to_map(),
                idempotency_key: None,
            })
            .await?;

        let client_secret = intent.client_secret.clone().ok_or_else(|| {
            PromotionError::payment_provider("payment intent returned without a client secret")
        })?;

        tracing::info!(
            user_id = %user.id,
            payment_intent_id = %intent.id,
            plan = plan.key,
            scope = %plan.scope,
            total_cents = breakdown.total_price.cents(),
            "Promotion payment intent created"
        );

        Ok(InitiatePromotionResult {
            payment_intent_id: intent.id,
            client_secret,
            plan,
            target,
            breakdown,
        })
    }
}
