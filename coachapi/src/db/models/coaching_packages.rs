//! Database models for coaching packages.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::types::PackageId;

/// Database response for a coaching package
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CoachingPackageDBResponse {
    pub id: PackageId,
    pub title: String,
    pub description: String,
    pub features: Vec<String>,
    pub display_order: i32,
    pub stripe_product_id: Option<String>,
    pub price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
