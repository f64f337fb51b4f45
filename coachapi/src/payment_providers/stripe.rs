//! Stripe payment provider implementation
//!
//! Talks to the Stripe REST API directly: form-encoded requests with bearer auth against
//! `api_base` (overridable so tests can point it at a mock server). Webhooks are verified with
//! [`super::signing`].

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::{
    config::StripeConfig,
    payment_providers::{
        CheckoutRequest, CheckoutSession, PaymentError, PaymentProvider, Result, SessionSummary, WebhookEvent, WebhookEventKind,
        signing,
    },
};

/// Stripe payment provider
pub struct StripeProvider {
    client: reqwest::Client,
    api_base: Url,
    api_key: String,
    webhook_secret: String,
    currency: String,
    signature_tolerance: Duration,
}

impl From<StripeConfig> for StripeProvider {
    fn from(config: StripeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build Stripe HTTP client with timeout, using defaults: {e}");
                reqwest::Client::new()
            });

        Self {
            client,
            api_base: config.api_base,
            api_key: config.api_key,
            webhook_secret: config.webhook_secret,
            currency: config.currency,
            signature_tolerance: config.signature_tolerance,
        }
    }
}

/// Checkout session ids look like `cs_test_a1B2...` or `cs_live_...`.
fn is_session_id(id: &str) -> bool {
    id.starts_with("cs_") && id.len() <= 255 && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Stripe checkout session object (only the fields we read)
#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    url: Option<String>,
    payment_status: Option<String>,
    customer_email: Option<String>,
    customer_details: Option<StripeCustomerDetails>,
    amount_total: Option<i64>,
    created: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeCustomerDetails {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeList<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Webhook envelope: `{"id", "type", "data": {"object": {...}}}`
#[derive(Debug, Deserialize)]
struct StripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

impl StripeProvider {
    fn endpoint(&self, path: &str) -> Result<Url> {
        self.api_base
            .join(path)
            .map_err(|e| PaymentError::ProviderApi(format!("invalid Stripe API URL: {e}")))
    }

    /// `/v1/checkout/sessions/{id}`, with the id pushed as a single encoded path segment.
    fn session_endpoint(&self, session_id: &str) -> Result<Url> {
        let mut url = self.endpoint("/v1/checkout/sessions")?;
        url.path_segments_mut()
            .map_err(|_| PaymentError::ProviderApi("Stripe API base cannot hold a path".to_string()))?
            .push(session_id);
        Ok(url)
    }

    /// Form fields for `POST /v1/checkout/sessions`, using Stripe's bracketed key syntax.
    fn checkout_form(&self, request: &CheckoutRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("line_items[0][price_data][currency]".to_string(), self.currency.clone()),
            ("line_items[0][price_data][unit_amount]".to_string(), request.unit_amount.to_string()),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.product_name.clone(),
            ),
        ];

        if let Some(description) = request.product_description.as_deref().filter(|d| !d.trim().is_empty()) {
            form.push((
                "line_items[0][price_data][product_data][description]".to_string(),
                description.to_string(),
            ));
        }

        form.extend([
            ("customer_email".to_string(), request.customer_email.clone()),
            ("client_reference_id".to_string(), request.product_id.to_string()),
            ("metadata[productType]".to_string(), request.product_type.to_string()),
            ("metadata[productId]".to_string(), request.product_id.to_string()),
            ("metadata[customerName]".to_string(), request.customer_name.clone()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
        ]);

        form
    }

    /// Turn a non-2xx Stripe response into a `ProviderApi` error carrying Stripe's message.
    async fn error_from_response(response: reqwest::Response) -> PaymentError {
        let status = response.status();
        match response.json::<StripeErrorBody>().await {
            Ok(body) => PaymentError::ProviderApi(format!(
                "{} ({}): {}",
                status,
                body.error.kind.unwrap_or_else(|| "unknown".to_string()),
                body.error.message.unwrap_or_default()
            )),
            Err(_) => PaymentError::ProviderApi(format!("Stripe returned {status}")),
        }
    }

    fn parse_event(&self, body: &[u8]) -> Result<WebhookEvent> {
        let event: StripeEvent =
            serde_json::from_slice(body).map_err(|e| PaymentError::InvalidData(format!("malformed webhook payload: {e}")))?;

        let object = &event.data.object;
        let object_id = object.get("id").and_then(|v| v.as_str()).map(str::to_string);
        // payment_intent is a string id unless Stripe was asked to expand it
        let payment_intent = match object.get("payment_intent") {
            Some(serde_json::Value::String(id)) => Some(id.clone()),
            Some(serde_json::Value::Object(pi)) => pi.get("id").and_then(|v| v.as_str()).map(str::to_string),
            _ => None,
        };

        let (kind, session_id, payment_intent_id) = match event.event_type.as_str() {
            "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
                (WebhookEventKind::CheckoutCompleted, object_id, payment_intent)
            }
            "checkout.session.async_payment_failed" => (WebhookEventKind::PaymentFailed, object_id, payment_intent),
            "payment_intent.payment_failed" => (WebhookEventKind::PaymentFailed, None, object_id),
            _ => (WebhookEventKind::Other, None, None),
        };

        tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Parsed Stripe webhook event");

        Ok(WebhookEvent {
            event_type: event.event_type,
            kind,
            session_id,
            payment_intent_id,
        })
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    #[tracing::instrument(skip_all, fields(product_id = %request.product_id, product_type = %request.product_type))]
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        let body = serde_urlencoded::to_string(self.checkout_form(request))
            .map_err(|e| PaymentError::InvalidData(format!("failed to encode checkout request: {e}")))?;

        let response = self
            .client
            .post(self.endpoint("/v1/checkout/sessions")?)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let session: StripeCheckoutSession = response.json().await?;
        tracing::info!("Created Stripe checkout session {}", session.id);

        Ok(CheckoutSession {
            id: session.id,
            url: session.url,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn retrieve_session(&self, session_id: &str) -> Result<Option<SessionSummary>> {
        if !is_session_id(session_id) {
            tracing::debug!("Not a Stripe checkout session id, skipping lookup");
            return Ok(None);
        }

        let response = self
            .client
            .get(self.session_endpoint(session_id)?)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let session: StripeCheckoutSession = response.json().await?;
        let customer_email = session
            .customer_email
            .or_else(|| session.customer_details.and_then(|details| details.email));

        Ok(Some(SessionSummary {
            id: session.id,
            status: session.payment_status.unwrap_or_else(|| "unknown".to_string()),
            customer_email,
            amount_total: session.amount_total,
            created: session.created.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        }))
    }

    #[tracing::instrument(skip(self))]
    async fn find_session_for_payment_intent(&self, payment_intent_id: &str) -> Result<Option<String>> {
        let mut url = self.endpoint("/v1/checkout/sessions")?;
        url.query_pairs_mut()
            .append_pair("payment_intent", payment_intent_id)
            .append_pair("limit", "1");

        let response = self.client.get(url).bearer_auth(&self.api_key).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let sessions: StripeList<StripeCheckoutSession> = response.json().await?;
        Ok(sessions.data.into_iter().next().map(|session| session.id))
    }

    async fn validate_webhook(&self, headers: &HeaderMap, body: &[u8]) -> Result<WebhookEvent> {
        let signature = headers
            .get(signing::SIGNATURE_HEADER)
            .ok_or(PaymentError::MissingSignature)?
            .to_str()
            .map_err(|_| PaymentError::InvalidSignature("header is not valid ASCII".to_string()))?;

        signing::verify_signature(
            signature,
            body,
            &self.webhook_secret,
            self.signature_tolerance,
            Utc::now().timestamp(),
        )
        .map_err(|e| PaymentError::InvalidSignature(e.to_string()))?;

        self.parse_event(body)
    }
}
