//! API request/response models for hosted checkout.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::validation::FieldErrors;
use crate::errors::{Error, Result};
use crate::types::ProductType;

/// Request body for opening a checkout session.
///
/// Fields are optional at the serde level; [`CheckoutCreate::validate`] enforces the rules and
/// reports every violation at once.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutCreate {
    /// `coaching` or `plan`
    #[schema(example = "plan")]
    pub product_type: Option<String>,
    /// ID of the coaching package or plan
    #[schema(example = "7f1c5a52-4bd2-4c5e-9f2a-0d1f7b1f6c11")]
    pub product_id: Option<String>,
    #[schema(example = "athlete@example.com")]
    pub customer_email: Option<String>,
    #[schema(example = "Alex Runner")]
    pub customer_name: Option<String>,
    /// Where the provider sends the customer after paying. May contain `{CHECKOUT_SESSION_ID}`.
    #[schema(example = "https://example.com/checkout-success?session_id={CHECKOUT_SESSION_ID}")]
    pub success_url: Option<String>,
    /// Where the provider sends the customer if they abandon checkout
    #[schema(example = "https://example.com/checkout-cancel")]
    pub cancel_url: Option<String>,
}

/// A checkout request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCheckout {
    pub product_type: ProductType,
    pub product_id: Uuid,
    pub customer_email: String,
    pub customer_name: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutCreate {
    pub fn validate(&self) -> Result<ValidCheckout> {
        let mut errors = FieldErrors::new();

        let product_type = errors
            .required("productType", self.product_type.as_deref())
            .and_then(|raw| match raw.parse::<ProductType>() {
                Ok(product_type) => Some(product_type),
                Err(_) => {
                    errors.push("productType", "\"productType\" must be one of [coaching, plan]");
                    None
                }
            });
        let product_id = errors
            .required("productId", self.product_id.as_deref())
            .and_then(|raw| match Uuid::parse_str(raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push("productId", "\"productId\" must be a valid UUID");
                    None
                }
            });
        let customer_email = errors.email("customerEmail", self.customer_email.as_deref());
        let customer_name = errors.length("customerName", self.customer_name.as_deref(), 2, 100);
        let success_url = errors.absolute_uri("successUrl", self.success_url.as_deref());
        let cancel_url = errors.absolute_uri("cancelUrl", self.cancel_url.as_deref());

        errors.finish()?;

        // Every field was recorded as an error above if it is missing here
        match (product_type, product_id, customer_email, customer_name, success_url, cancel_url) {
            (
                Some(product_type),
                Some(product_id),
                Some(customer_email),
                Some(customer_name),
                Some(success_url),
                Some(cancel_url),
            ) => Ok(ValidCheckout {
                product_type,
                product_id,
                customer_email: customer_email.to_string(),
                customer_name: customer_name.to_string(),
                success_url: success_url.to_string(),
                cancel_url: cancel_url.to_string(),
            }),
            _ => Err(Error::Internal {
                operation: "validate checkout request".to_string(),
            }),
        }
    }
}

/// Response for a newly opened checkout session
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    /// Provider session id; also the key for order lookups
    #[schema(example = "cs_test_a1b2c3")]
    pub session_id: String,
    /// Hosted payment page to send the customer to
    pub url: Option<String>,
}

/// Query string of the checkout success redirect
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct CheckoutSuccessQuery {
    pub session_id: Option<String>,
}

/// Acknowledgement returned to the payment provider for every delivered webhook
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
    /// Why the event was not applied, when it wasn't
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookAck {
    pub fn ok() -> Self {
        Self {
            received: true,
            error: None,
        }
    }

    pub fn with_error(error: impl Into<String>) -> Self {
        Self {
            received: true,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_body() -> CheckoutCreate {
        CheckoutCreate {
            product_type: Some("coaching".to_string()),
            product_id: Some("7f1c5a52-4bd2-4c5e-9f2a-0d1f7b1f6c11".to_string()),
            customer_email: Some("athlete@example.com".to_string()),
            customer_name: Some("Alex Runner".to_string()),
            success_url: Some("https://example.com/checkout-success?session_id={CHECKOUT_SESSION_ID}".to_string()),
            cancel_url: Some("https://example.com/checkout-cancel".to_string()),
        }
    }

    fn failed_fields(body: &CheckoutCreate) -> Vec<String> {
        match body.validate() {
            Err(Error::Validation { errors }) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_checkout() {
        let checkout = valid_body().validate().unwrap();

        assert_eq!(checkout.product_type, ProductType::Coaching);
        assert_eq!(checkout.customer_name, "Alex Runner");
    }

    #[test]
    fn test_empty_body_reports_every_field() {
        assert_eq!(
            failed_fields(&CheckoutCreate::default()),
            vec!["productType", "productId", "customerEmail", "customerName", "successUrl", "cancelUrl"]
        );
    }

    #[test]
    fn test_invalid_values() {
        let body = CheckoutCreate {
            product_type: Some("merch".to_string()),
            product_id: Some("42".to_string()),
            customer_name: Some("A".to_string()),
            cancel_url: Some("checkout-cancel".to_string()),
            ..valid_body()
        };

        assert_eq!(failed_fields(&body), vec!["productType", "productId", "customerName", "cancelUrl"]);
    }

    #[test]
    fn test_camel_case_body() {
        let body: CheckoutCreate = serde_json::from_value(serde_json::json!({
            "productType": "plan",
            "productId": "7f1c5a52-4bd2-4c5e-9f2a-0d1f7b1f6c11",
            "customerEmail": "athlete@example.com",
            "customerName": "Alex Runner",
            "successUrl": "https://example.com/ok",
            "cancelUrl": "https://example.com/cancel"
        }))
        .unwrap();

        assert_eq!(body.validate().unwrap().product_type, ProductType::Plan);
    }

    #[test]
    fn test_webhook_ack_shape() {
        assert_eq!(serde_json::to_value(WebhookAck::ok()).unwrap(), serde_json::json!({"received": true}));
        assert_eq!(
            serde_json::to_value(WebhookAck::with_error("bad signature")).unwrap(),
            serde_json::json!({"received": true, "error": "bad signature"})
        );
    }
}
