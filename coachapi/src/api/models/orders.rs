//! API request/response models for order lookups.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::db::models::orders::{OrderDBResponse, OrderWithProductDBResponse};
use crate::payment_providers::SessionSummary;
use crate::types::{OrderId, OrderStatus, ProductType};

/// Query parameters for listing orders
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct ListOrdersQuery {
    /// Only orders placed with this email address
    pub customer_email: Option<String>,
    /// Only orders in this status (`pending`, `completed` or `failed`)
    pub status: Option<String>,
}

/// An order as stored, optionally with the product it bought
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: OrderId,
    pub customer_email: String,
    pub customer_name: String,
    pub product_type: ProductType,
    #[schema(value_type = String, format = "uuid")]
    pub product_id: Uuid,
    /// Price paid in dollars
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 29.99)]
    pub amount: Decimal,
    pub stripe_session_id: String,
    pub stripe_payment_id: Option<String>,
    pub status: OrderStatus,
    pub purchase_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_description: Option<String>,
}

impl From<OrderDBResponse> for OrderResponse {
    fn from(db: OrderDBResponse) -> Self {
        Self {
            id: db.id,
            customer_email: db.customer_email,
            customer_name: db.customer_name,
            product_type: db.product_type,
            product_id: db.product_id,
            amount: db.amount,
            stripe_session_id: db.stripe_session_id,
            stripe_payment_id: db.stripe_payment_id,
            status: db.status,
            purchase_date: db.purchase_date,
            updated_at: db.updated_at,
            product_title: None,
            product_description: None,
        }
    }
}

impl From<OrderWithProductDBResponse> for OrderResponse {
    fn from(db: OrderWithProductDBResponse) -> Self {
        Self {
            product_title: db.product_title,
            product_description: db.product_description,
            ..Self::from(db.order)
        }
    }
}

/// What the payment provider knows about a session that has no stored order
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSessionResponse {
    /// The session id
    pub id: String,
    /// Provider payment status (e.g. `paid`, `unpaid`)
    pub status: String,
    pub customer_email: Option<String>,
    /// Total in dollars
    #[schema(value_type = Option<f64>)]
    #[serde(with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    pub purchase_date: Option<DateTime<Utc>>,
}

impl From<SessionSummary> for ProviderSessionResponse {
    fn from(summary: SessionSummary) -> Self {
        Self {
            id: summary.id,
            status: summary.status,
            customer_email: summary.customer_email,
            // Provider totals are in cents
            amount: summary.amount_total.map(|cents| Decimal::new(cents, 2)),
            purchase_date: summary.created,
        }
    }
}

/// Result of looking an order up by checkout session
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum SessionOrderResponse {
    Stored(Box<OrderResponse>),
    Provider(ProviderSessionResponse),
}
