//! CompletePromotionHandler - Activates a promotion once its payment is confirmed.
//!
//! Reached from the client after checkout and from the payment webhook.
//! Every step is keyed on the payment intent id, so running it again for
//! the same intent returns the original purchase without side effects.

use std::sync::Arc;

use crate::domain::foundation::{ErrorCode, GigId, Money, Timestamp, UserId};
use crate::domain::promotion::{
    Notification, PlanDefinition, PromotionCharges, PromotionError, PromotionIntentMetadata,
    PromotionPurchase, PromotionScope,
};
use crate::domain::user::User;
use crate::ports::{
    GigRepository, NotificationStore, PaymentIntent, PaymentIntentStatus, PaymentProvider,
    PromotionRepository, RealtimePublisher, UserRepository,
};

use super::badges::apply_badges;
use super::guards::{ensure_no_active_promotion, retire_lapsed_promotions};

/// Command to activate a paid promotion.
#[derive(Debug, Clone, Default)]
pub struct CompletePromotionCommand {
    pub payment_intent_id: String,
    /// Authenticated caller. `None` when driven by the webhook.
    pub caller: Option<UserId>,
    /// Optional client echo of what was bought; must agree with the intent.
    pub plan_key: Option<String>,
    pub scope: Option<PromotionScope>,
    pub gig_id: Option<GigId>,
}

/// Outcome of completion.
#[derive(Debug, Clone)]
pub struct CompletePromotionResult {
    pub purchase: PromotionPurchase,
    /// True when the intent had already been processed.
    pub already_processed: bool,
}

/// Links used in activation notifications.
#[derive(Debug, Clone)]
pub struct NotificationLinks {
    pub seller: String,
    pub admin: String,
}

impl Default for NotificationLinks {
    fn default() -> Self {
        Self {
            seller: "/promote-gigs".to_string(),
            admin: "/admin/promotions".to_string(),
        }
    }
}

/// Handler for promotion activation.
pub struct CompletePromotionHandler {
    users: Arc<dyn UserRepository>,
    gigs: Arc<dyn GigRepository>,
    promotions: Arc<dyn PromotionRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
    notifications: Arc<dyn NotificationStore>,
    realtime: Arc<dyn RealtimePublisher>,
    links: NotificationLinks,
}

impl CompletePromotionHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        gigs: Arc<dyn GigRepository>,
        promotions: Arc<dyn PromotionRepository>,
        payment_provider: Arc<dyn PaymentProvider>,
        notifications: Arc<dyn NotificationStore>,
        realtime: Arc<dyn RealtimePublisher>,
        links: NotificationLinks,
    ) -> Self {
        Self {
            users,
            gigs,
            promotions,
            payment_provider,
            notifications,
            realtime,
            links,
        }
    }

    pub async fn handle(
        &self,
        cmd: CompletePromotionCommand,
    ) -> Result<CompletePromotionResult, PromotionError> {
        let intent_id = cmd.payment_intent_id.trim().to_string();
        if intent_id.is_empty() {
            return Err(PromotionError::validation(
                "payment_intent_id",
                "Payment intent ID is required",
            ));
        }

        // 1. Re-verify with the processor and read back what was bought
        let intent = self.payment_provider.retrieve_payment_intent(&intent_id).await?;
        if !PromotionIntentMetadata::is_promotion(&intent.metadata) {
            return Err(PromotionError::validation(
                "payment_intent_id",
                "Payment is not a promotion purchase",
            ));
        }
        let metadata = PromotionIntentMetadata::from_map(&intent.metadata)?;
        check_caller(&cmd, &metadata)?;

        let intent = self.ensure_settled(intent).await?;

        // 2. Replays return the stored purchase
        let now = Timestamp::now();
        if let Some(existing) = self.promotions.find_by_payment_intent(&intent_id).await? {
            return self.replay(existing, now).await;
        }

        // 3. Plan
        let scope = metadata.target.scope();
        let plan = PlanDefinition::find(scope, &metadata.plan_key)
            .ok_or_else(|| PromotionError::invalid_plan(scope, metadata.plan_key.clone()))?;

        let buyer = self
            .users
            .find_by_id(&metadata.user_id)
            .await?
            .ok_or(PromotionError::UserNotFound(metadata.user_id))?;

        // 4. Another purchase may have activated since initiation
        ensure_no_active_promotion(self.promotions.as_ref(), &buyer.id, &metadata.target, now)
            .await?;

        retire_lapsed_promotions(
            self.promotions.as_ref(),
            self.gigs.as_ref(),
            &buyer.id,
            &metadata.target,
            now,
        )
        .await?;

        // 5. Persist; storage uniqueness settles races with concurrent completions
        let charged = if intent.amount_received.is_zero() {
            intent.amount
        } else {
            intent.amount_received
        };
        let charges = PromotionCharges {
            total_amount: charged,
            ..PromotionCharges::from(metadata.breakdown)
        };
        let purchase =
            PromotionPurchase::activate(&intent_id, buyer.id, plan, metadata.target, charges, now)?;

        if let Err(err) = self.promotions.insert(&purchase).await {
            return match err.code {
                ErrorCode::DuplicatePaymentIntent => {
                    let existing = self
                        .promotions
                        .find_by_payment_intent(&intent_id)
                        .await?
                        .ok_or_else(|| PromotionError::infrastructure(err.to_string()))?;
                    self.replay(existing, now).await
                }
                ErrorCode::PromotionConflict => {
                    ensure_no_active_promotion(
                        self.promotions.as_ref(),
                        &buyer.id,
                        &metadata.target,
                        now,
                    )
                    .await?;
                    Err(PromotionError::infrastructure(err.to_string()))
                }
                _ => Err(err.into()),
            };
        }

        tracing::info!(
            purchase_id = %purchase.id,
            payment_intent_id = %intent_id,
            user_id = %buyer.id,
            plan = plan.key,
            scope = %scope,
            expires_at = ?purchase.expires_at,
            "Promotion activated"
        );

        // 6. Listings; a failure here is retried by replaying the intent
        apply_badges(self.gigs.as_ref(), &purchase, now).await?;

        // 7-8. Best effort from here on
        let admin = self.credit_platform_fee(&purchase).await;
        self.notify(&buyer, admin.as_ref(), &purchase, charged).await;

        Ok(CompletePromotionResult {
            purchase,
            already_processed: false,
        })
    }

    /// Captures authorised payments; anything else unpaid is a failure.
    async fn ensure_settled(&self, intent: PaymentIntent) -> Result<PaymentIntent, PromotionError> {
        match intent.status {
            PaymentIntentStatus::Succeeded => Ok(intent),
            PaymentIntentStatus::RequiresCapture => {
                let captured = self.payment_provider.capture_payment_intent(&intent.id).await?;
                tracing::info!(payment_intent_id = %captured.id, status = %captured.status, "Captured payment intent");
                // Funds still in flight are not settled; the webhook completes it later.
                match captured.status {
                    PaymentIntentStatus::Succeeded => Ok(captured),
                    other => Err(PromotionError::payment_not_successful(other.as_str())),
                }
            }
            other => {
                tracing::warn!(payment_intent_id = %intent.id, status = %other, "Payment not successful");
                Err(PromotionError::payment_not_successful(other.as_str()))
            }
        }
    }

    async fn replay(
        &self,
        existing: PromotionPurchase,
        now: Timestamp,
    ) -> Result<CompletePromotionResult, PromotionError> {
        tracing::info!(purchase_id = %existing.id, "Promotion already activated");
        if existing.is_active_at(now) {
            apply_badges(self.gigs.as_ref(), &existing, now).await?;
        }
        Ok(CompletePromotionResult {
            purchase: existing,
            already_processed: true,
        })
    }

    /// Credits the fee to the primary admin. Returns that admin if found.
    async fn credit_platform_fee(&self, purchase: &PromotionPurchase) -> Option<User> {
        let admin = match self.users.find_primary_admin().await {
            Ok(admin) => admin,
            Err(err) => {
                tracing::warn!(error = %err, "Could not load primary admin");
                return None;
            }
        };
        let Some(admin) = admin else {
            tracing::warn!(purchase_id = %purchase.id, "No admin account to credit platform fee");
            return None;
        };

        let fee = purchase.charges.platform_fee;
        if fee > Money::ZERO {
            match self.users.credit_revenue(&admin.id, fee).await {
                Ok(true) => {
                    tracing::info!(admin_id = %admin.id, fee_cents = fee.cents(), "Platform fee credited")
                }
                Ok(false) => tracing::warn!(admin_id = %admin.id, "Admin vanished before fee credit"),
                Err(err) => tracing::warn!(
                    admin_id = %admin.id,
                    purchase_id = %purchase.id,
                    error = %err,
                    "Failed to credit platform fee"
                ),
            }
        }
        Some(admin)
    }

    async fn notify(
        &self,
        buyer: &User,
        admin: Option<&User>,
        purchase: &PromotionPurchase,
        charged: Money,
    ) {
        let mut outgoing = vec![Notification::promotion_activated(purchase, &self.links.seller)];
        if let Some(admin) = admin {
            outgoing.push(Notification::promotion_sold(
                admin.id,
                buyer,
                purchase,
                charged,
                &self.links.admin,
            ));
        }

        for notification in &outgoing {
            if let Err(err) = self.notifications.save(notification).await {
                tracing::warn!(user_id = %notification.user_id, error = %err, "Failed to store notification");
            }
            if let Err(err) = self.realtime.publish(notification).await {
                tracing::warn!(user_id = %notification.user_id, error = %err, "Failed to push notification");
            }
        }
    }
}

/// Caller and any echoed fields must agree with the intent metadata.
fn check_caller(
    cmd: &CompletePromotionCommand,
    metadata: &PromotionIntentMetadata,
) -> Result<(), PromotionError> {
    if let Some(caller) = cmd.caller {
        if caller != metadata.user_id {
            return Err(PromotionError::forbidden(
                "This payment belongs to another account",
            ));
        }
    }
    if let Some(plan_key) = cmd.plan_key.as_deref().filter(|k| !k.trim().is_empty()) {
        if !plan_key.trim().eq_ignore_ascii_case(&metadata.plan_key) {
            return Err(PromotionError::validation(
                "promotion_plan",
                "Promotion plan does not match the payment",
            ));
        }
    }
    if let Some(scope) = cmd.scope {
        if scope != metadata.target.scope() {
            return Err(PromotionError::validation(
                "payment_type",
                "Promotion type does not match the payment",
            ));
        }
    }
    if let Some(gig_id) = cmd.gig_id {
        if Some(gig_id) != metadata.target.gig_id() {
            return Err(PromotionError::validation(
                "gig_id",
                "Gig does not match the payment",
            ));
        }
    }
    Ok(())
}
