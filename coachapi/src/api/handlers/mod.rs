//! HTTP request handlers for all API endpoints.
//!
//! Handlers validate input, talk to the database through the repositories in
//! [`crate::db::handlers`], and delegate payment work to the configured
//! [`crate::payment_providers::PaymentProvider`].
//!
//! # Handler Modules
//!
//! - [`products`]: Independent plans and coaching packages
//! - [`checkout`]: Checkout sessions, payment webhooks, and checkout redirects
//! - [`orders`]: Order lookups
//! - [`contact`]: Contact form
//! - [`newsletter`]: Newsletter sign-up
//! - [`images`]: Gallery images and storage links
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to a status code and a JSON
//! `{"message": ...}` body.

pub mod checkout;
pub mod contact;
pub mod images;
pub mod newsletter;
pub mod orders;
pub mod products;

use axum::{Json, extract::rejection::JsonRejection};

use crate::api::models::MessageResponse;
use crate::errors::{Error, Result};

/// Unwrap a JSON body, turning malformed input into a 400 with our error shape.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload.map(|Json(body)| body).map_err(|rejection| Error::BadRequest {
        message: format!("Invalid request body: {}", rejection.body_text()),
    })
}

#[utoipa::path(
    get,
    path = "/api",
    tag = "health",
    summary = "API welcome",
    responses((status = 200, description = "Welcome message", body = MessageResponse))
)]
pub async fn welcome() -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome to Dani's Discipline API"))
}
