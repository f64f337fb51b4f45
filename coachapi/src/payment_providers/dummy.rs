//! Dummy payment provider implementation
//!
//! Skips the hosted payment page entirely: checkout "redirects" straight to the success URL.
//! Webhooks are accepted unsigned as `{"type": "...", "session_id": "..."}` so the full order
//! lifecycle can be driven locally with curl. Never configure this in production.

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Deserialize;

use crate::{
    config::DummyConfig,
    payment_providers::{
        CheckoutRequest, CheckoutSession, PaymentError, PaymentProvider, Result, SessionSummary, WebhookEvent, WebhookEventKind,
    },
};

/// Prefix of every session id this provider issues
pub const SESSION_PREFIX: &str = "dummy_cs_";

/// Dummy payment provider for local development
pub struct DummyProvider;

impl From<DummyConfig> for DummyProvider {
    fn from(_config: DummyConfig) -> Self {
        tracing::warn!("Using the dummy payment provider: webhooks are accepted without signatures");
        Self
    }
}

#[derive(Debug, Deserialize)]
struct DummyWebhook {
    #[serde(rename = "type")]
    event_type: String,
    session_id: Option<String>,
    payment_intent_id: Option<String>,
}

#[async_trait]
impl PaymentProvider for DummyProvider {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        let session_id = format!("{SESSION_PREFIX}{}", uuid::Uuid::new_v4().simple());

        // Payment is instantly "complete": send the customer straight to the success page
        let redirect_url = request.success_url.replace("{CHECKOUT_SESSION_ID}", &session_id);

        tracing::info!(
            "Dummy provider created checkout session {} for product {}",
            session_id,
            request.product_id
        );

        Ok(CheckoutSession {
            id: session_id,
            url: Some(redirect_url),
        })
    }

    async fn retrieve_session(&self, _session_id: &str) -> Result<Option<SessionSummary>> {
        // No remote state; local orders are the only record
        Ok(None)
    }

    async fn find_session_for_payment_intent(&self, _payment_intent_id: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn validate_webhook(&self, _headers: &HeaderMap, body: &[u8]) -> Result<WebhookEvent> {
        let webhook: DummyWebhook =
            serde_json::from_slice(body).map_err(|e| PaymentError::InvalidData(format!("malformed webhook payload: {e}")))?;

        let kind = match webhook.event_type.as_str() {
            "checkout.session.completed" => WebhookEventKind::CheckoutCompleted,
            "checkout.session.async_payment_failed" | "payment_intent.payment_failed" => WebhookEventKind::PaymentFailed,
            _ => WebhookEventKind::Other,
        };

        Ok(WebhookEvent {
            event_type: webhook.event_type,
            kind,
            session_id: webhook.session_id,
            payment_intent_id: webhook.payment_intent_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductType;

    fn checkout_request() -> CheckoutRequest {
        CheckoutRequest {
            product_type: ProductType::Plan,
            product_id: uuid::Uuid::new_v4(),
            product_name: "Beginner Strength".to_string(),
            product_description: None,
            unit_amount: 2999,
            customer_email: "athlete@example.com".to_string(),
            customer_name: "Alex Runner".to_string(),
            success_url: "http://localhost:5173/checkout-success?session_id={CHECKOUT_SESSION_ID}".to_string(),
            cancel_url: "http://localhost:5173/checkout-cancel".to_string(),
        }
    }

    #[tokio::test]
    async fn test_checkout_redirects_to_success_url() {
        let provider = DummyProvider::from(DummyConfig::default());

        let session = provider.create_checkout_session(&checkout_request()).await.unwrap();

        assert!(session.id.starts_with(SESSION_PREFIX));
        let url = url::Url::parse(session.url.as_deref().unwrap()).unwrap();
        let query_pairs: std::collections::HashMap<_, _> = url.query_pairs().collect();
        assert_eq!(query_pairs.get("session_id").map(|s| s.to_string()), Some(session.id));
    }

    #[tokio::test]
    async fn test_sessions_are_unique() {
        let provider = DummyProvider::from(DummyConfig::default());

        let a = provider.create_checkout_session(&checkout_request()).await.unwrap();
        let b = provider.create_checkout_session(&checkout_request()).await.unwrap();

        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_webhook_accepts_unsigned_payload() {
        let provider = DummyProvider::from(DummyConfig::default());
        let body = br#"{"type":"checkout.session.completed","session_id":"dummy_cs_1"}"#;

        let event = provider.validate_webhook(&HeaderMap::new(), body).await.unwrap();

        assert_eq!(event.kind, WebhookEventKind::CheckoutCompleted);
        assert_eq!(event.session_id.as_deref(), Some("dummy_cs_1"));
    }

    #[tokio::test]
    async fn test_webhook_rejects_garbage() {
        let provider = DummyProvider::from(DummyConfig::default());

        let err = provider.validate_webhook(&HeaderMap::new(), b"not json").await.unwrap_err();

        assert!(matches!(err, PaymentError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_no_remote_sessions() {
        let provider = DummyProvider::from(DummyConfig::default());

        assert!(provider.retrieve_session("dummy_cs_1").await.unwrap().is_none());
        assert!(provider.find_session_for_payment_intent("pi_1").await.unwrap().is_none());
    }
}
