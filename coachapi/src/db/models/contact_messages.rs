//! Database models for contact form submissions.

use chrono::{DateTime, Utc};

use crate::types::ContactMessageId;

/// Database request for storing a contact message
#[derive(Debug, Clone)]
pub struct ContactMessageCreateDBRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Database response for a contact message
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContactMessageDBResponse {
    pub id: ContactMessageId,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
