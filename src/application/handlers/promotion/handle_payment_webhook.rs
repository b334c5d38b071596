//! HandlePaymentWebhookHandler - Processes payment provider webhooks.
//!
//! A succeeded promotion payment runs through the same completion path as
//! the client call, so whichever arrives second is a replay.

use std::sync::Arc;

use crate::domain::foundation::PromotionId;
use crate::domain::promotion::{PromotionError, PromotionIntentMetadata};
use crate::ports::{PaymentProvider, WebhookEventType};

use super::complete_promotion::{CompletePromotionCommand, CompletePromotionHandler};

/// Command to handle a payment webhook.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw webhook payload.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header.
    pub signature: String,
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlePaymentWebhookResult {
    /// Payment confirmed and the promotion is active.
    PromotionActivated { purchase_id: PromotionId },
    /// Payment confirmed, but the promotion was already active.
    AlreadyProcessed { purchase_id: PromotionId },
    /// A promotion payment failed. Nothing to undo.
    PaymentFailed { payment_intent_id: String },
    /// Event acknowledged, no action taken.
    Ignored,
}

/// Handler for payment provider webhooks.
pub struct HandlePaymentWebhookHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    completion: Arc<CompletePromotionHandler>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        completion: Arc<CompletePromotionHandler>,
    ) -> Self {
        Self {
            payment_provider,
            completion,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<HandlePaymentWebhookResult, PromotionError> {
        // 1. Verify signature and parse
        let event = self
            .payment_provider
            .verify_webhook(&cmd.payload, &cmd.signature)
            .await?;

        tracing::info!(event_id = %event.id, event_type = ?event.event_type, "Payment webhook received");

        // 2. Only promotion payment intents are ours
        let Some(intent) = event.payment_intent else {
            return Ok(HandlePaymentWebhookResult::Ignored);
        };
        if !PromotionIntentMetadata::is_promotion(&intent.metadata) {
            return Ok(HandlePaymentWebhookResult::Ignored);
        }

        // 3. Dispatch
        match event.event_type {
            WebhookEventType::PaymentIntentSucceeded => {
                let result = self
                    .completion
                    .handle(CompletePromotionCommand {
                        payment_intent_id: intent.id,
                        ..Default::default()
                    })
                    .await?;
                let purchase_id = result.purchase.id;
                Ok(if result.already_processed {
                    HandlePaymentWebhookResult::AlreadyProcessed { purchase_id }
                } else {
                    HandlePaymentWebhookResult::PromotionActivated { purchase_id }
                })
            }
            WebhookEventType::PaymentIntentFailed => {
                tracing::warn!(payment_intent_id = %intent.id, status = %intent.status, "Promotion payment failed");
                Ok(HandlePaymentWebhookResult::PaymentFailed {
                    payment_intent_id: intent.id,
                })
            }
            WebhookEventType::Other(_) => Ok(HandlePaymentWebhookResult::Ignored),
        }
    }
}
