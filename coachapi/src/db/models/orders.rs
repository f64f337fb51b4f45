//! Database models for display orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::types::{OrderId, OrderStatus, ProductType};

/// Database request for recording a new order at checkout
#[derive(Debug, Clone)]
pub struct OrderCreateDBRequest {
    pub customer_email: String,
    pub customer_name: String,
    pub product_type: ProductType,
    pub product_id: Uuid,
    pub amount: Decimal,
    pub stripe_session_id: String,
}

/// Filter for listing orders
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub customer_email: Option<String>,
    pub status: Option<OrderStatus>,
}

/// Database response for an order
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderDBResponse {
    pub id: OrderId,
    pub customer_email: String,
    pub customer_name: String,
    pub product_type: ProductType,
    pub product_id: Uuid,
    pub amount: Decimal,
    pub stripe_session_id: String,
    pub stripe_payment_id: Option<String>,
    pub status: OrderStatus,
    pub purchase_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order joined with the title and description of the product it bought.
///
/// The product columns are NULL when the product row was removed after purchase.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderWithProductDBResponse {
    #[sqlx(flatten)]
    pub order: OrderDBResponse,
    pub product_title: Option<String>,
    pub product_description: Option<String>,
}
