//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port over the Stripe REST API using
//! form-encoded requests, plus webhook signature verification.
//!
//! # Security
//!
//! - HMAC-SHA256 signature verification with constant-time comparison
//! - Timestamp validation (5-minute window) for replay attack prevention
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key, webhook_secret);
//! let adapter = StripePaymentAdapter::new(config);
//! ```

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::ports::{
    CreatePaymentIntentRequest, PaymentError, PaymentErrorCode, PaymentIntent, PaymentProvider,
    WebhookEvent, WebhookEventType,
};

use super::webhook_types::{
    hex_encode, SignatureHeader, StripeErrorResponse, StripePaymentIntent, StripeWebhookEvent,
};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook events (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    webhook_secret: SecretString,

    api_base_url: String,

    /// Reject test-mode webhook events.
    require_livemode: bool,
}

impl StripeConfig {
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            require_livemode: false,
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }
}

/// Stripe payment provider adapter.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base_url, path)
    }

    /// Verify webhook signature using HMAC-SHA256.
    ///
    /// Any of the header's `v1` signatures may match.
    fn verify_signature(&self, payload: &[u8], header: &SignatureHeader) -> Result<(), PaymentError> {
        // 1. Timestamp window
        let now = chrono::Utc::now().timestamp();
        let age = now - header.timestamp;

        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                age_secs = age,
                "Webhook event too old - possible replay attack"
            );
            return Err(PaymentError::invalid_webhook(format!(
                "Event too old ({} seconds)",
                age
            )));
        }
        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                "Webhook event from future - clock skew or manipulation"
            );
            return Err(PaymentError::invalid_webhook("Event timestamp in future"));
        }

        // 2. Expected signature over "<timestamp>.<payload>"
        let mut mac = HmacSha256::new_from_slice(self.config.webhook_secret.expose_secret().as_bytes())
            .map_err(|e| PaymentError::provider(format!("Invalid webhook secret: {}", e)))?;
        mac.update(header.timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        // 3. Constant-time comparison
        let matched = header
            .v1_signatures
            .iter()
            .any(|provided| bool::from(expected.as_slice().ct_eq(provided.as_slice())));

        if !matched {
            tracing::warn!(
                expected_prefix = &hex_encode(expected.as_slice())[..8],
                "Invalid webhook signature"
            );
            return Err(PaymentError::invalid_webhook("Invalid signature"));
        }
        Ok(())
    }

    /// Parse a verified payload into the domain event.
    fn parse_event(&self, payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
        let stripe_event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            PaymentError::invalid_webhook(format!("Invalid JSON: {}", e))
        })?;

        if self.config.require_livemode && !stripe_event.livemode {
            tracing::warn!(event_id = %stripe_event.id, "Rejected test mode event in production");
            return Err(PaymentError::invalid_webhook(
                "Test mode events not allowed in production",
            ));
        }

        let event_type = WebhookEventType::parse(&stripe_event.event_type);
        let payment_intent = if stripe_event.event_type.starts_with("payment_intent.") {
            let intent: StripePaymentIntent = serde_json::from_value(stripe_event.data.object)
                .map_err(|e| {
                    PaymentError::invalid_webhook(format!("Invalid payment intent: {}", e))
                })?;
            Some(intent.into())
        } else {
            None
        };

        Ok(WebhookEvent {
            id: stripe_event.id,
            event_type,
            payment_intent,
            created_at: stripe_event.created,
            livemode: stripe_event.livemode,
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<PaymentIntent, PaymentError> {
        let response = request
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Stripe API call failed");
            return Err(error_from_response(status, &body));
        }

        let intent: StripePaymentIntent = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;
        Ok(intent.into())
    }
}

/// Maps a Stripe error response onto the port's error codes.
fn error_from_response(status: reqwest::StatusCode, body: &str) -> PaymentError {
    let parsed = serde_json::from_str::<StripeErrorResponse>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|b| b.error.message.clone())
        .unwrap_or_else(|| format!("Stripe API error ({})", status));

    let code = match status.as_u16() {
        401 => PaymentErrorCode::AuthenticationError,
        402 => PaymentErrorCode::CardDeclined,
        404 => PaymentErrorCode::NotFound,
        429 => PaymentErrorCode::RateLimitExceeded,
        400 => PaymentErrorCode::InvalidRequest,
        500..=599 => PaymentErrorCode::ProviderError,
        _ => PaymentErrorCode::Unknown,
    };

    let error = PaymentError::new(code, message);
    match parsed.and_then(|b| b.error.code.or(Some(b.error.error_type))) {
        Some(provider_code) => error.with_provider_code(provider_code),
        None => error,
    }
}

/// Form fields for intent creation; metadata is flattened as `metadata[key]`.
fn intent_form(request: &CreatePaymentIntentRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("amount".to_string(), request.amount.cents().to_string()),
        ("currency".to_string(), request.currency.to_lowercase()),
        ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
    ];
    if let Some(email) = &request.email {
        params.push(("receipt_email".to_string(), email.clone()));
    }
    if let Some(description) = &request.description {
        params.push(("description".to_string(), description.clone()));
    }
    let mut metadata: Vec<_> = request.metadata.iter().collect();
    metadata.sort();
    for (key, value) in metadata {
        params.push((format!("metadata[{}]", key), value.clone()));
    }
    params
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        if request.amount.cents() <= 0 {
            return Err(PaymentError::invalid_request("Amount must be positive"));
        }

        let mut builder = self
            .http_client
            .post(self.url("payment_intents"))
            .form(&intent_form(&request));
        if let Some(key) = &request.idempotency_key {
            builder = builder.header("Idempotency-Key", key);
        }

        let intent = self.send(builder).await?;
        tracing::debug!(payment_intent_id = %intent.id, "Stripe payment intent created");
        Ok(intent)
    }

    async fn retrieve_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        let builder = self
            .http_client
            .get(self.url(&format!("payment_intents/{}", intent_id)));
        self.send(builder).await
    }

    async fn capture_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        let builder = self
            .http_client
            .post(self.url(&format!("payment_intents/{}/capture", intent_id)));
        self.send(builder).await
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        // 1. Parse signature header
        let header = SignatureHeader::parse(signature).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse Stripe-Signature header");
            PaymentError::invalid_webhook(e.to_string())
        })?;

        // 2. Verify signature (includes timestamp validation)
        self.verify_signature(payload, &header)?;

        // 3. Parse and convert event
        let event = self.parse_event(payload)?;

        tracing::info!(
            event_id = %event.id,
            event_type = ?event.event_type,
            "Webhook signature verified"
        );
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Money;
    use crate::ports::PaymentIntentStatus;
    use std::collections::HashMap;

    const SECRET: &str = "whsec_test_secret";

    fn adapter() -> StripePaymentAdapter {
        StripePaymentAdapter::new(StripeConfig::new("sk_test_key", SECRET))
    }

    fn sign(secret: &str, timestamp: i64, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", timestamp, payload).as_bytes());
        format!("t={},v1={}", timestamp, hex_encode(&mac.finalize().into_bytes()))
    }

    fn succeeded_payload() -> String {
        r#"{
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "created": 1704067200,
            "livemode": false,
            "data": {
                "object": {
                    "id": "pi_1",
                    "object": "payment_intent",
                    "amount": 5000,
                    "amount_received": 5000,
                    "currency": "usd",
                    "status": "succeeded",
                    "client_secret": null,
                    "metadata": {"purpose": "monthly_promotion"}
                }
            }
        }"#
        .to_string()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn config_defaults() {
        let config = StripeConfig::new("key", "secret");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(!config.require_livemode);

        let custom = config.with_base_url("http://localhost:12111").with_require_livemode(true);
        assert_eq!(custom.api_base_url, "http://localhost:12111");
        assert!(custom.require_livemode);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Request Encoding
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn intent_form_flattens_metadata() {
        let mut metadata = HashMap::new();
        metadata.insert("purpose".to_string(), "gig_promotion".to_string());
        metadata.insert("gig_id".to_string(), "g1".to_string());
        let request = CreatePaymentIntentRequest {
            amount: Money::from_cents(2_500),
            currency: "USD".to_string(),
            email: Some("seller@example.test".to_string()),
            description: None,
            metadata,
            idempotency_key: None,
        };

        let form = intent_form(&request);

        assert!(form.contains(&("amount".to_string(), "2500".to_string())));
        assert!(form.contains(&("currency".to_string(), "usd".to_string())));
        assert!(form.contains(&("receipt_email".to_string(), "seller@example.test".to_string())));
        assert!(form.contains(&("metadata[purpose]".to_string(), "gig_promotion".to_string())));
        assert!(form.contains(&("metadata[gig_id]".to_string(), "g1".to_string())));
    }

    #[test]
    fn error_response_maps_status_and_code() {
        let body = r#"{"error": {"type": "card_error", "code": "card_declined", "message": "Declined"}}"#;

        let err = error_from_response(reqwest::StatusCode::PAYMENT_REQUIRED, body);

        assert_eq!(err.code, PaymentErrorCode::CardDeclined);
        assert_eq!(err.message, "Declined");
        assert_eq!(err.provider_code.as_deref(), Some("card_declined"));
    }

    #[test]
    fn unparseable_error_body_still_maps() {
        let err = error_from_response(reqwest::StatusCode::TOO_MANY_REQUESTS, "<html>");
        assert_eq!(err.code, PaymentErrorCode::RateLimitExceeded);
        assert!(err.retryable);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhook Verification
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn verifies_and_parses_payment_intent_event() {
        let payload = succeeded_payload();
        let signature = sign(SECRET, chrono::Utc::now().timestamp(), &payload);

        let event = adapter().verify_webhook(payload.as_bytes(), &signature).await.unwrap();

        assert_eq!(event.id, "evt_1");
        assert_eq!(event.event_type, WebhookEventType::PaymentIntentSucceeded);
        let intent = event.payment_intent.unwrap();
        assert_eq!(intent.id, "pi_1");
        assert_eq!(intent.status, PaymentIntentStatus::Succeeded);
        assert_eq!(intent.amount_received, Money::from_cents(5000));
    }

    #[tokio::test]
    async fn accepts_any_matching_v1_signature() {
        let payload = succeeded_payload();
        let now = chrono::Utc::now().timestamp();
        let good = sign(SECRET, now, &payload);
        let stale = sign("whsec_old_secret", now, &payload);
        let header = format!("{},{}", stale, good.split_once(',').unwrap().1);

        let result = adapter().verify_webhook(payload.as_bytes(), &header).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn rejects_wrong_secret() {
        let payload = succeeded_payload();
        let signature = sign("whsec_wrong", chrono::Utc::now().timestamp(), &payload);

        let err = adapter().verify_webhook(payload.as_bytes(), &signature).await.unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::InvalidWebhook);
    }

    #[tokio::test]
    async fn rejects_old_and_future_timestamps() {
        let payload = succeeded_payload();
        let now = chrono::Utc::now().timestamp();

        let old = sign(SECRET, now - MAX_TIMESTAMP_AGE_SECS - 10, &payload);
        let future = sign(SECRET, now + MAX_FUTURE_TOLERANCE_SECS + 10, &payload);
        let skewed = sign(SECRET, now + 30, &payload);

        assert!(adapter().verify_webhook(payload.as_bytes(), &old).await.is_err());
        assert!(adapter().verify_webhook(payload.as_bytes(), &future).await.is_err());
        assert!(adapter().verify_webhook(payload.as_bytes(), &skewed).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_malformed_header_and_json() {
        let malformed = adapter().verify_webhook(b"{}", "malformed_header").await;
        assert!(malformed.is_err());

        let payload = "not valid json";
        let signature = sign(SECRET, chrono::Utc::now().timestamp(), payload);
        let err = adapter().verify_webhook(payload.as_bytes(), &signature).await.unwrap_err();
        assert!(err.message.contains("Invalid JSON"));
    }

    #[tokio::test]
    async fn test_mode_rejected_when_livemode_required() {
        let adapter = StripePaymentAdapter::new(
            StripeConfig::new("sk_live_key", SECRET).with_require_livemode(true),
        );
        let payload = succeeded_payload();
        let signature = sign(SECRET, chrono::Utc::now().timestamp(), &payload);

        let err = adapter.verify_webhook(payload.as_bytes(), &signature).await.unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::InvalidWebhook);
    }

    #[tokio::test]
    async fn other_events_carry_no_intent() {
        let payload = r#"{"id":"evt_2","type":"charge.refunded","created":1,"data":{"object":{"id":"ch_1"}}}"#;
        let signature = sign(SECRET, chrono::Utc::now().timestamp(), payload);

        let event = adapter().verify_webhook(payload.as_bytes(), &signature).await.unwrap();

        assert_eq!(event.event_type, WebhookEventType::Other("charge.refunded".to_string()));
        assert!(event.payment_intent.is_none());
    }
}
