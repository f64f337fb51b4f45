//! API response models for site images.
//!
//! Image endpoints wrap their payload as `{"success": true, ...}`, which is what the gallery
//! components consume.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::models::images::{PolaroidDBResponse, TestimonialImageDBResponse};
use crate::types::ImageId;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PolaroidResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ImageId,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<PolaroidDBResponse> for PolaroidResponse {
    fn from(db: PolaroidDBResponse) -> Self {
        Self {
            id: db.id,
            image_url: db.image_url,
            caption: db.caption,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TestimonialImageResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ImageId,
    pub image_url: String,
    pub alt_text: Option<String>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

impl From<TestimonialImageDBResponse> for TestimonialImageResponse {
    fn from(db: TestimonialImageDBResponse) -> Self {
        Self {
            id: db.id,
            image_url: db.image_url,
            alt_text: db.alt_text,
            display_order: db.display_order,
            created_at: db.created_at,
        }
    }
}

/// `{"success": true, "data": [...]}` for polaroids
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PolaroidListResponse {
    pub success: bool,
    pub data: Vec<PolaroidResponse>,
}

impl From<Vec<PolaroidDBResponse>> for PolaroidListResponse {
    fn from(rows: Vec<PolaroidDBResponse>) -> Self {
        Self {
            success: true,
            data: rows.into_iter().map(Into::into).collect(),
        }
    }
}

/// `{"success": true, "data": [...]}` for testimonial images
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TestimonialListResponse {
    pub success: bool,
    pub data: Vec<TestimonialImageResponse>,
}

impl From<Vec<TestimonialImageDBResponse>> for TestimonialListResponse {
    fn from(rows: Vec<TestimonialImageDBResponse>) -> Self {
        Self {
            success: true,
            data: rows.into_iter().map(Into::into).collect(),
        }
    }
}

/// `{"success": true, "url": "..."}`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImageUrlResponse {
    pub success: bool,
    pub url: String,
}
