//! API request/response models for the contact form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::FieldErrors;
use crate::db::models::contact_messages::{ContactMessageCreateDBRequest, ContactMessageDBResponse};
use crate::errors::{Error, Result};
use crate::types::ContactMessageId;

/// Contact form submission
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ContactCreate {
    #[schema(example = "Sam Lifter")]
    pub name: Option<String>,
    #[schema(example = "sam@example.com")]
    pub email: Option<String>,
    #[schema(example = "Coaching question")]
    pub subject: Option<String>,
    #[schema(example = "Do you offer online check-ins?")]
    pub message: Option<String>,
}

impl ContactCreate {
    pub fn validate(&self) -> Result<ContactMessageCreateDBRequest> {
        let mut errors = FieldErrors::new();

        let name = errors.length("name", self.name.as_deref(), 2, 100);
        let email = errors.email("email", self.email.as_deref());
        let subject = errors.length("subject", self.subject.as_deref(), 1, 200);
        let message = errors.length("message", self.message.as_deref(), 10, 5000);

        errors.finish()?;

        match (name, email, subject, message) {
            (Some(name), Some(email), Some(subject), Some(message)) => Ok(ContactMessageCreateDBRequest {
                name: name.to_string(),
                email: email.to_string(),
                subject: subject.to_string(),
                message: message.to_string(),
            }),
            _ => Err(Error::Internal {
                operation: "validate contact request".to_string(),
            }),
        }
    }
}

/// Response after a contact message was stored
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub message: String,
    #[schema(value_type = String, format = "uuid")]
    pub id: ContactMessageId,
    pub created_at: DateTime<Utc>,
}

impl From<&ContactMessageDBResponse> for ContactResponse {
    fn from(db: &ContactMessageDBResponse) -> Self {
        Self {
            message: "Thank you for your message. We'll get back to you soon.".to_string(),
            id: db.id,
            created_at: db.created_at,
        }
    }
}
