//! API request/response models for newsletter sign-ups.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::FieldErrors;
use crate::db::models::newsletter::SubscriberCreateDBRequest;
use crate::errors::{Error, Result};

/// Newsletter sign-up form
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewsletterSubscribe {
    #[schema(example = "Alex Runner")]
    pub name: Option<String>,
    #[schema(example = "athlete@example.com")]
    pub email: Option<String>,
}

impl NewsletterSubscribe {
    pub fn validate(&self) -> Result<SubscriberCreateDBRequest> {
        let mut errors = FieldErrors::new();

        let name = errors.length("name", self.name.as_deref(), 1, 100);
        let email = errors.email("email", self.email.as_deref());

        errors.finish()?;

        match (name, email) {
            (Some(name), Some(email)) => Ok(SubscriberCreateDBRequest {
                name: name.to_string(),
                email: email.to_lowercase(),
            }),
            _ => Err(Error::Internal {
                operation: "validate newsletter request".to_string(),
            }),
        }
    }
}

/// What happened to a sign-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionOutcome {
    Subscribed,
    Resubscribed,
    AlreadySubscribed,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NewsletterResponse {
    pub message: String,
    pub status: SubscriptionOutcome,
}

impl From<SubscriptionOutcome> for NewsletterResponse {
    fn from(status: SubscriptionOutcome) -> Self {
        let message = match status {
            SubscriptionOutcome::Subscribed => "Thank you for subscribing to our newsletter!",
            SubscriptionOutcome::Resubscribed => "Welcome back! Your subscription has been reactivated.",
            SubscriptionOutcome::AlreadySubscribed => "This email is already subscribed.",
        };
        Self {
            message: message.to_string(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_normalized() {
        let request = NewsletterSubscribe {
            name: Some("Alex".to_string()),
            email: Some(" Athlete@Example.COM ".to_string()),
        }
        .validate()
        .unwrap();

        assert_eq!(request.email, "athlete@example.com");
    }

    #[test]
    fn test_missing_fields() {
        match NewsletterSubscribe::default().validate() {
            Err(Error::Validation { errors }) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(NewsletterResponse::from(SubscriptionOutcome::AlreadySubscribed)).unwrap();
        assert_eq!(json["status"], "already_subscribed");
    }
}
