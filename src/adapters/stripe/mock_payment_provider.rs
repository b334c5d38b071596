//! Mock payment provider for testing.
//!
//! Keeps payment intents in memory and supports:
//! - Driving intent status (paid, authorised, failed)
//! - Error injection, globally or per method
//! - Call tracking
//! - Webhook event simulation

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::foundation::Money;
use crate::ports::{
    CreatePaymentIntentRequest, PaymentError, PaymentIntent, PaymentIntentStatus, PaymentProvider,
    WebhookEvent, WebhookEventType,
};

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
/// let intent = mock.create_payment_intent(request).await?;
///
/// // Simulate the browser confirming the payment
/// mock.set_intent_status(&intent.id, PaymentIntentStatus::Succeeded);
///
/// // Simulate the matching webhook
/// mock.queue_webhook(&intent.id, WebhookEventType::PaymentIntentSucceeded);
/// ```
#[derive(Default)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    intents: HashMap<String, PaymentIntent>,
    next_id: u64,

    /// Event returned by the next verification.
    next_webhook_event: Option<WebhookEvent>,

    /// Error to return on next call.
    next_error: Option<PaymentError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, PaymentError>,

    call_log: Vec<MethodCall>,

    reject_webhooks: bool,

    /// Status a capture leaves the intent in. Defaults to succeeded.
    capture_outcome: Option<PaymentIntentStatus>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that fails every webhook verification.
    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().reject_webhooks = true;
        mock
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration
    // ════════════════════════════════════════════════════════════════════════════

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.inner.lock().unwrap();
        state.next_error = None;
        state.method_errors.clear();
    }

    /// Moves an intent to `status`. Succeeded intents are fully received.
    pub fn set_intent_status(&self, intent_id: &str, status: PaymentIntentStatus) {
        let mut state = self.inner.lock().unwrap();
        if let Some(intent) = state.intents.get_mut(intent_id) {
            intent.status = status;
            intent.amount_received = if status == PaymentIntentStatus::Succeeded {
                intent.amount
            } else {
                Money::ZERO
            };
        }
    }

    /// Makes later captures leave intents in `status` instead of succeeded.
    pub fn set_capture_outcome(&self, status: PaymentIntentStatus) {
        self.inner.lock().unwrap().capture_outcome = Some(status);
    }

    /// Queues a webhook event carrying the current state of an intent.
    pub fn queue_webhook(&self, intent_id: &str, event_type: WebhookEventType) {
        let mut state = self.inner.lock().unwrap();
        let payment_intent = state.intents.get(intent_id).cloned();
        state.next_webhook_event = Some(WebhookEvent {
            id: format!("evt_mock_{}", intent_id),
            event_type,
            payment_intent,
            created_at: chrono::Utc::now().timestamp(),
            livemode: false,
        });
    }

    /// Set the webhook event to return on verification.
    pub fn set_webhook_event(&self, event: WebhookEvent) {
        self.inner.lock().unwrap().next_webhook_event = Some(event);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Inspection
    // ════════════════════════════════════════════════════════════════════════════

    pub fn intent(&self, intent_id: &str) -> Option<PaymentIntent> {
        self.inner.lock().unwrap().intents.get(intent_id).cloned()
    }

    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .any(|c| c.method == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal
    // ════════════════════════════════════════════════════════════════════════════

    /// Records the call and returns any injected error.
    fn enter(&self, method: &str, args: Vec<String>) -> Result<(), PaymentError> {
        let mut state = self.inner.lock().unwrap();
        state.call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }
        if let Some(err) = state.method_errors.get(method) {
            return Err(err.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        self.enter(
            "create_payment_intent",
            vec![request.amount.cents().to_string(), request.currency.clone()],
        )?;

        let mut state = self.inner.lock().unwrap();
        state.next_id += 1;
        let id = format!("pi_mock_{}", state.next_id);
        let intent = PaymentIntent {
            client_secret: Some(format!("{}_secret_mock", id)),
            id: id.clone(),
            status: PaymentIntentStatus::RequiresPaymentMethod,
            amount: request.amount,
            amount_received: Money::ZERO,
            currency: request.currency,
            metadata: request.metadata,
        };
        state.intents.insert(id, intent.clone());
        Ok(intent)
    }

    async fn retrieve_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        self.enter("retrieve_payment_intent", vec![intent_id.to_string()])?;
        self.intent(intent_id)
            .ok_or_else(|| PaymentError::not_found("Payment intent"))
    }

    async fn capture_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        self.enter("capture_payment_intent", vec![intent_id.to_string()])?;
        let mut state = self.inner.lock().unwrap();
        let outcome = state.capture_outcome.unwrap_or(PaymentIntentStatus::Succeeded);
        let intent = state
            .intents
            .get_mut(intent_id)
            .ok_or_else(|| PaymentError::not_found("Payment intent"))?;
        if intent.status != PaymentIntentStatus::RequiresCapture {
            return Err(PaymentError::invalid_request(format!(
                "Cannot capture intent in status {}",
                intent.status
            )));
        }
        intent.status = outcome;
        intent.amount_received = if outcome == PaymentIntentStatus::Succeeded {
            intent.amount
        } else {
            Money::ZERO
        };
        Ok(intent.clone())
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        self.enter("verify_webhook", vec![payload.len().to_string()])?;
        let mut state = self.inner.lock().unwrap();
        if state.reject_webhooks || signature.trim().is_empty() {
            return Err(PaymentError::invalid_webhook("Invalid signature"));
        }
        state
            .next_webhook_event
            .take()
            .ok_or_else(|| PaymentError::invalid_request("No webhook event queued"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PaymentErrorCode;

    fn request(cents: i64) -> CreatePaymentIntentRequest {
        CreatePaymentIntentRequest {
            amount: Money::from_cents(cents),
            currency: "usd".to_string(),
            email: None,
            description: None,
            metadata: HashMap::new(),
            idempotency_key: None,
        }
    }

    #[tokio::test]
    async fn created_intents_are_retrievable_and_unpaid() {
        let mock = MockPaymentProvider::new();

        let created = mock.create_payment_intent(request(5_000)).await.unwrap();
        let fetched = mock.retrieve_payment_intent(&created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.status, PaymentIntentStatus::RequiresPaymentMethod);
        assert!(fetched.client_secret.is_some());
    }

    #[tokio::test]
    async fn capture_settles_authorised_intent_only() {
        let mock = MockPaymentProvider::new();
        let intent = mock.create_payment_intent(request(1_000)).await.unwrap();

        assert!(mock.capture_payment_intent(&intent.id).await.is_err());

        mock.set_intent_status(&intent.id, PaymentIntentStatus::RequiresCapture);
        let captured = mock.capture_payment_intent(&intent.id).await.unwrap();

        assert_eq!(captured.status, PaymentIntentStatus::Succeeded);
        assert_eq!(captured.amount_received, Money::from_cents(1_000));
    }

    #[tokio::test]
    async fn capture_outcome_can_be_held_back() {
        let mock = MockPaymentProvider::new();
        let intent = mock.create_payment_intent(request(1_000)).await.unwrap();
        mock.set_intent_status(&intent.id, PaymentIntentStatus::RequiresCapture);
        mock.set_capture_outcome(PaymentIntentStatus::Processing);

        let captured = mock.capture_payment_intent(&intent.id).await.unwrap();

        assert_eq!(captured.status, PaymentIntentStatus::Processing);
        assert_eq!(captured.amount_received, Money::ZERO);
    }

    #[tokio::test]
    async fn injected_errors_and_call_log() {
        let mock = MockPaymentProvider::new();
        mock.set_error(PaymentError::network("down"));

        let first = mock.create_payment_intent(request(100)).await;
        let second = mock.create_payment_intent(request(100)).await;

        assert_eq!(first.unwrap_err().code, PaymentErrorCode::NetworkError);
        assert!(second.is_ok());
        assert_eq!(mock.call_count("create_payment_intent"), 2);
    }

    #[tokio::test]
    async fn webhook_requires_signature_and_queued_event() {
        let mock = MockPaymentProvider::new();
        let intent = mock.create_payment_intent(request(100)).await.unwrap();

        assert!(mock.verify_webhook(b"{}", "").await.is_err());

        mock.queue_webhook(&intent.id, WebhookEventType::PaymentIntentSucceeded);
        let event = mock.verify_webhook(b"{}", "t=1,v1=00").await.unwrap();
        assert_eq!(event.payment_intent.unwrap().id, intent.id);

        let rejecting = MockPaymentProvider::rejecting_webhooks();
        let err = rejecting.verify_webhook(b"{}", "t=1,v1=00").await.unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::InvalidWebhook);
    }
}
