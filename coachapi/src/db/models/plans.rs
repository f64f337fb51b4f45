//! Database models for independent training plans.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::types::PlanId;

/// Database response for an independent plan
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlanDBResponse {
    pub id: PlanId,
    pub title: String,
    pub description: String,
    pub icon: Option<String>,
    pub display_order: i32,
    pub stripe_product_id: Option<String>,
    pub price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
