//! API request and response data models.
//!
//! These models define the public JSON contract of the storefront. They are distinct from the
//! database models in [`crate::db::models`] and use camelCase field names, matching what the
//! front end sends and expects. Money amounts are serialized as JSON numbers.
//!
//! - [`products`]: Independent plans, coaching packages, coaching availability
//! - [`checkout`]: Checkout session creation and webhook acknowledgements
//! - [`orders`]: Order lookups
//! - [`contact`]: Contact form submissions
//! - [`newsletter`]: Newsletter sign-ups
//! - [`images`]: Gallery images and public storage links
//! - [`validation`]: Field rule checks shared by the request models

pub mod checkout;
pub mod contact;
pub mod images;
pub mod newsletter;
pub mod orders;
pub mod products;
pub mod validation;

use serde::Serialize;
use utoipa::ToSchema;

/// Plain `{"message": ...}` body
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
