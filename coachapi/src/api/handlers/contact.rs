use std::sync::Arc;

use crate::api::handlers::json_body;
use crate::api::models::contact::{ContactCreate, ContactResponse};
use crate::db::handlers::ContactMessages;
use crate::db::models::contact_messages::ContactMessageDBResponse;
use crate::email::EmailService;
use crate::errors::{Error, Result};
use crate::types::abbrev_uuid;
use crate::AppState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

#[utoipa::path(
    post,
    path = "/api/contact",
    tag = "contact",
    summary = "Submit contact form",
    description = "Stores the message, then emails a confirmation to the sender and a notification to the site owner",
    request_body = ContactCreate,
    responses(
        (status = 201, description = "Message received", body = ContactResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_contact_form(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ContactCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<ContactResponse>)> {
    let request = json_body(payload)?.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let submission = ContactMessages::new(&mut conn).create(&request).await?;

    tracing::info!("Stored contact message {}", abbrev_uuid(&submission.id));

    let response = ContactResponse::from(&submission);
    spawn_contact_emails(state.email.clone(), submission);

    Ok((StatusCode::CREATED, Json(response)))
}

/// The submission is already stored, so email failures are only logged.
fn spawn_contact_emails(email: Arc<EmailService>, submission: ContactMessageDBResponse) {
    tokio::spawn(async move {
        if let Err(e) = email.send_contact_confirmation(&submission).await {
            tracing::error!("Failed to send contact confirmation for {}: {}", submission.id, e);
        }
        if let Err(e) = email.send_contact_notification(&submission).await {
            tracing::error!("Failed to send contact notification for {}: {}", submission.id, e);
        }
    });
}
