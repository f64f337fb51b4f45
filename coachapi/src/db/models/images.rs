//! Database models for the image galleries shown on the marketing pages.

use chrono::{DateTime, Utc};

use crate::types::ImageId;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PolaroidDBResponse {
    pub id: ImageId,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TestimonialImageDBResponse {
    pub id: ImageId,
    pub image_url: String,
    pub alt_text: Option<String>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}
