//! Database models for newsletter subscribers.

use chrono::{DateTime, Utc};

use crate::types::SubscriberId;

/// Database request for adding a subscriber
#[derive(Debug, Clone)]
pub struct SubscriberCreateDBRequest {
    pub name: String,
    pub email: String,
}

/// Database response for a newsletter subscriber
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriberDBResponse {
    pub id: SubscriberId,
    pub name: String,
    pub email: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
