//! API response models for the product catalogue.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::models::{coaching_packages::CoachingPackageDBResponse, plans::PlanDBResponse};
use crate::types::{PackageId, PlanId};

/// A self-guided training plan
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PlanId,
    #[schema(example = "Beginner Strength")]
    pub title: String,
    pub description: String,
    /// Icon name shown on the plan card
    pub icon: Option<String>,
    /// Price in dollars
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 29.99)]
    pub price: Decimal,
    pub display_order: i32,
    pub stripe_product_id: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PlanDBResponse> for PlanResponse {
    fn from(db: PlanDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            icon: db.icon,
            price: db.price,
            display_order: db.display_order,
            stripe_product_id: db.stripe_product_id,
            active: db.active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// A one-to-one coaching package
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoachingPackageResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PackageId,
    #[schema(example = "12 Week Transformation")]
    pub title: String,
    pub description: String,
    /// Bullet points listed on the package card
    pub features: Vec<String>,
    /// Price in dollars
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 249.99)]
    pub price: Decimal,
    pub display_order: i32,
    pub stripe_product_id: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CoachingPackageDBResponse> for CoachingPackageResponse {
    fn from(db: CoachingPackageDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            features: db.features,
            price: db.price,
            display_order: db.display_order,
            stripe_product_id: db.stripe_product_id,
            active: db.active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Whether coaching can currently be booked
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CoachingAvailabilityResponse {
    pub available: bool,
    pub message: String,
}

impl CoachingAvailabilityResponse {
    pub fn new(hidden: bool) -> Self {
        if hidden {
            Self {
                available: false,
                message: "Coaching services will be available soon.".to_string(),
            }
        } else {
            Self {
                available: true,
                message: "Coaching services are available.".to_string(),
            }
        }
    }
}
