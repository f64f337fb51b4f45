//! Payment provider abstraction layer
//!
//! This module defines the `PaymentProvider` trait which abstracts hosted-checkout payment
//! processing across providers. The API layer only ever talks to `dyn PaymentProvider`; order
//! bookkeeping stays in [`crate::fulfillment`] so providers never touch the database.

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{config::PaymentConfig, types::ProductType};

pub mod dummy;
pub mod signing;
pub mod stripe;

/// Create a payment provider from configuration
///
/// This is the single point where we convert config into provider instances.
/// Adding a new provider requires adding a match arm here.
pub fn create_provider(config: PaymentConfig) -> Arc<dyn PaymentProvider> {
    match config {
        PaymentConfig::Stripe(stripe_config) => Arc::new(stripe::StripeProvider::from(stripe_config)),
        PaymentConfig::Dummy(dummy_config) => Arc::new(dummy::DummyProvider::from(dummy_config)),
    }
}

/// Result type for payment provider operations
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors that can occur during payment processing
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment provider API error: {0}")]
    ProviderApi(String),

    #[error("Invalid payment data: {0}")]
    InvalidData(String),

    #[error("Missing webhook signature header")]
    MissingSignature,

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),
}

impl PaymentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::ProviderApi(_) => StatusCode::BAD_GATEWAY,
            PaymentError::InvalidData(_) | PaymentError::MissingSignature | PaymentError::InvalidSignature(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl From<PaymentError> for StatusCode {
    fn from(err: PaymentError) -> Self {
        err.status_code()
    }
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        PaymentError::ProviderApi(err.to_string())
    }
}

/// Everything a provider needs to open a hosted checkout for one product
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub product_type: ProductType,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_description: Option<String>,
    /// Price in the smallest currency unit (cents)
    pub unit_amount: i64,
    pub customer_email: String,
    pub customer_name: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A checkout session opened with the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Provider session id; orders are keyed on this
    pub id: String,
    /// Hosted payment page to redirect the customer to
    pub url: Option<String>,
}

/// The provider's view of a checkout session, used when no local order exists
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub id: String,
    /// Provider payment status (e.g. "paid", "unpaid")
    pub status: String,
    pub customer_email: Option<String>,
    /// Total in the smallest currency unit
    pub amount_total: Option<i64>,
    pub created: Option<DateTime<Utc>>,
}

/// What a webhook delivery means for orders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventKind {
    /// Payment for a checkout session succeeded
    CheckoutCompleted,
    /// Payment for a checkout session failed
    PaymentFailed,
    /// Any other event; acknowledged and ignored
    Other,
}

/// Represents a verified webhook event from a payment provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    /// Raw event type (e.g., "checkout.session.completed")
    pub event_type: String,
    pub kind: WebhookEventKind,
    /// Checkout session the event refers to, when the payload carries it
    pub session_id: Option<String>,
    /// Payment intent the event refers to, when the payload carries it
    pub payment_intent_id: Option<String>,
}

/// Abstract payment provider interface
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Open a hosted checkout session for a single product.
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession>;

    /// Fetch a session from the provider. Returns `None` if the provider does not know it.
    async fn retrieve_session(&self, session_id: &str) -> Result<Option<SessionSummary>>;

    /// Resolve the checkout session that created a payment intent.
    async fn find_session_for_payment_intent(&self, payment_intent_id: &str) -> Result<Option<String>>;

    /// Validate and extract a webhook event from the raw request.
    ///
    /// Returns `MissingSignature` when the signature header is absent and `InvalidSignature`
    /// when verification fails. `body` must be the exact bytes received.
    async fn validate_webhook(&self, headers: &HeaderMap, body: &[u8]) -> Result<WebhookEvent>;
}
