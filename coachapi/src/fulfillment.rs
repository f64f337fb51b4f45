//! Order reconciliation for verified payment webhooks.
//!
//! Orders are written as `pending` at checkout. Provider webhooks then move them to `completed`
//! or `failed`. Every transition is conditional in SQL, so redelivered or out-of-order events
//! leave orders untouched: a completed order never goes back to failed, and the confirmation
//! email is sent only by the delivery that performed the transition.

use std::sync::Arc;

use tracing::instrument;

use crate::{
    AppState,
    db::{
        handlers::{Orders, Repository},
        models::orders::OrderDBResponse,
    },
    email::EmailService,
    errors::{Error, Result},
    payment_providers::{PaymentProvider, WebhookEvent, WebhookEventKind},
    types::abbrev_uuid,
};

/// Apply a verified webhook event to stored orders. Returns the number of orders updated.
#[instrument(skip_all, fields(event_type = %event.event_type), err)]
pub async fn process_webhook_event(state: &AppState, provider: &dyn PaymentProvider, event: &WebhookEvent) -> Result<usize> {
    match event.kind {
        WebhookEventKind::CheckoutCompleted => complete_order(state, event).await,
        WebhookEventKind::PaymentFailed => fail_order(state, provider, event).await,
        WebhookEventKind::Other => {
            tracing::debug!("Ignoring webhook event type: {}", event.event_type);
            Ok(0)
        }
    }
}

async fn complete_order(state: &AppState, event: &WebhookEvent) -> Result<usize> {
    let Some(session_id) = event.session_id.as_deref() else {
        tracing::warn!("Completed checkout event without a session id");
        return Ok(0);
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut orders = Orders::new(&mut conn);

    let Some(order) = orders.mark_completed(session_id, event.payment_intent_id.as_deref()).await? else {
        tracing::info!("No pending order for session {}, nothing to complete", session_id);
        return Ok(0);
    };

    let product_title = orders.get_by_id(order.id).await?.and_then(|o| o.product_title);

    tracing::info!(
        "Order {} completed for session {}",
        abbrev_uuid(&order.id),
        session_id
    );

    spawn_purchase_confirmation(state.email.clone(), order, product_title);
    Ok(1)
}

async fn fail_order(state: &AppState, provider: &dyn PaymentProvider, event: &WebhookEvent) -> Result<usize> {
    let session_id = match (&event.session_id, &event.payment_intent_id) {
        (Some(session_id), _) => Some(session_id.clone()),
        (None, Some(payment_intent_id)) => provider.find_session_for_payment_intent(payment_intent_id).await?,
        (None, None) => None,
    };

    let Some(session_id) = session_id else {
        tracing::info!("Payment failure could not be matched to a checkout session");
        return Ok(0);
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let updated = Orders::new(&mut conn)
        .mark_failed(&session_id, event.payment_intent_id.as_deref())
        .await?;

    match updated {
        Some(order) => {
            tracing::info!("Order {} marked failed for session {}", abbrev_uuid(&order.id), session_id);
            Ok(1)
        }
        None => {
            tracing::info!("No pending order for session {}, nothing to fail", session_id);
            Ok(0)
        }
    }
}

/// Send the confirmation without holding up the webhook acknowledgement.
fn spawn_purchase_confirmation(email: Arc<EmailService>, order: OrderDBResponse, product_title: Option<String>) {
    tokio::spawn(async move {
        if let Err(e) = email.send_purchase_confirmation(&order, product_title.as_deref()).await {
            tracing::error!("Failed to send purchase confirmation for order {}: {}", order.id, e);
        }
    });
}
