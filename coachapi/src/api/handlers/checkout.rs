use crate::api::handlers::json_body;
use crate::api::models::checkout::{CheckoutCreate, CheckoutSessionResponse, CheckoutSuccessQuery, ValidCheckout, WebhookAck};
use crate::db::handlers::{CoachingPackages, Orders, Plans, Repository};
use crate::db::models::orders::OrderCreateDBRequest;
use crate::errors::{Error, Result};
use crate::fulfillment::process_webhook_event;
use crate::payment_providers::{CheckoutRequest, PaymentError};
use crate::types::{ProductType, abbrev_uuid};
use crate::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::Redirect,
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use sqlx::PgConnection;

/// The product a checkout is for, as priced in our catalogue
struct CatalogueItem {
    name: String,
    description: Option<String>,
    price: Decimal,
}

async fn load_product(state: &AppState, conn: &mut PgConnection, checkout: &ValidCheckout) -> Result<CatalogueItem> {
    let not_found = || Error::NotFound {
        resource: "Product".to_string(),
        id: checkout.product_id.to_string(),
    };

    match checkout.product_type {
        ProductType::Coaching => {
            if state.config.coaching.hidden {
                return Err(not_found());
            }
            let package = CoachingPackages::new(conn)
                .get_active_by_id(checkout.product_id)
                .await?
                .ok_or_else(not_found)?;
            Ok(CatalogueItem {
                name: package.title,
                description: Some(package.description),
                price: package.price,
            })
        }
        ProductType::Plan => {
            let plan = Plans::new(conn)
                .get_active_by_id(checkout.product_id)
                .await?
                .ok_or_else(not_found)?;
            Ok(CatalogueItem {
                name: plan.title,
                description: Some(plan.description),
                price: plan.price,
            })
        }
    }
}

/// Convert a catalogue price to the smallest currency unit
fn to_cents(price: Decimal) -> Result<i64> {
    (price * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .filter(|cents| *cents > 0)
        .ok_or_else(|| Error::Internal {
            operation: format!("convert price {price} to cents"),
        })
}

#[utoipa::path(
    post,
    path = "/api/create-checkout-session",
    tag = "checkout",
    summary = "Create checkout session",
    description = "Open a hosted checkout for one plan or coaching package and record a pending order",
    request_body = CheckoutCreate,
    responses(
        (status = 200, description = "Checkout session opened", body = CheckoutSessionResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Product not found or inactive"),
        (status = 501, description = "No payment provider configured"),
        (status = 502, description = "Payment provider error"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CheckoutCreate>, JsonRejection>,
) -> Result<Json<CheckoutSessionResponse>> {
    let checkout = json_body(payload)?.validate()?;
    let provider = state.payment_provider()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let product = load_product(&state, &mut conn, &checkout).await?;

    let session = provider
        .create_checkout_session(&CheckoutRequest {
            product_type: checkout.product_type,
            product_id: checkout.product_id,
            product_name: product.name,
            product_description: product.description,
            unit_amount: to_cents(product.price)?,
            customer_email: checkout.customer_email.clone(),
            customer_name: checkout.customer_name.clone(),
            success_url: checkout.success_url,
            cancel_url: checkout.cancel_url,
        })
        .await?;

    let order = Orders::new(&mut conn)
        .create(&OrderCreateDBRequest {
            customer_email: checkout.customer_email,
            customer_name: checkout.customer_name,
            product_type: checkout.product_type,
            product_id: checkout.product_id,
            amount: product.price,
            stripe_session_id: session.id.clone(),
        })
        .await?;

    tracing::info!(
        "Created pending order {} for {} {} (session {})",
        abbrev_uuid(&order.order.id),
        checkout.product_type,
        checkout.product_id,
        session.id
    );

    Ok(Json(CheckoutSessionResponse {
        session_id: session.id,
        url: session.url,
    }))
}

#[utoipa::path(
    post,
    path = "/api/webhook",
    tag = "checkout",
    summary = "Payment provider webhook",
    description = "Receives signed events from the payment provider. Every delivered event is acknowledged with 200; \
                   only a missing signature header is rejected.",
    request_body(content = String, description = "Raw event payload", content_type = "application/json"),
    responses(
        (status = 200, description = "Event received", body = WebhookAck),
        (status = 400, description = "Signature header missing"),
        (status = 501, description = "No payment provider configured")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<(StatusCode, Json<WebhookAck>)> {
    let provider = state.payment_provider()?;

    let event = match provider.validate_webhook(&headers, &body).await {
        Ok(event) => event,
        Err(PaymentError::MissingSignature) => {
            return Err(Error::BadRequest {
                message: "Stripe signature is missing".to_string(),
            });
        }
        Err(e) => {
            // Acknowledge anyway so the provider does not keep retrying a bad delivery
            tracing::warn!("Rejected webhook delivery: {}", e);
            let error = Error::Payment(e).user_message();
            return Ok((StatusCode::OK, Json(WebhookAck::with_error(error))));
        }
    };

    tracing::debug!("Received webhook event: {}", event.event_type);

    match process_webhook_event(&state, provider.as_ref(), &event).await {
        Ok(updated) => {
            tracing::debug!("Webhook event {} updated {} order(s)", event.event_type, updated);
            Ok((StatusCode::OK, Json(WebhookAck::ok())))
        }
        Err(e) => {
            tracing::error!("Failed to process webhook event {}: {:#}", event.event_type, e);
            Ok((StatusCode::OK, Json(WebhookAck::with_error(e.user_message()))))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/checkout-success",
    tag = "checkout",
    summary = "Checkout success redirect",
    params(CheckoutSuccessQuery),
    responses(
        (status = 303, description = "Redirect to the site's success page")
    )
)]
pub async fn checkout_success(State(state): State<AppState>, Query(query): Query<CheckoutSuccessQuery>) -> Redirect {
    Redirect::to(&state.config.checkout_success_redirect(query.session_id.as_deref()))
}

#[utoipa::path(
    get,
    path = "/api/checkout-cancel",
    tag = "checkout",
    summary = "Checkout cancel redirect",
    responses(
        (status = 303, description = "Redirect to the site's cancel page")
    )
)]
pub async fn checkout_cancel(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.config.checkout_cancel_redirect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, create_test_app_with_state, create_test_state, insert_test_package, insert_test_plan};
    use crate::types::OrderStatus;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    fn checkout_body(product_type: &str, product_id: impl ToString) -> Value {
        json!({
            "productType": product_type,
            "productId": product_id.to_string(),
            "customerEmail": "athlete@example.com",
            "customerName": "Alex Runner",
            "successUrl": "http://localhost:5173/checkout-success?session_id={CHECKOUT_SESSION_ID}",
            "cancelUrl": "http://localhost:5173/checkout-cancel"
        })
    }

    #[test]
    fn test_to_cents() {
        assert_eq!(to_cents(Decimal::new(4999, 2)).unwrap(), 4999);
        assert_eq!(to_cents(Decimal::new(1999999, 4)).unwrap(), 20000);
        assert!(to_cents(Decimal::ZERO).is_err());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_checkout_records_pending_order(pool: PgPool) {
        let plan_id = insert_test_plan(&pool, "Beginner Strength", 1, true).await;
        let server = create_test_app(pool.clone()).await;

        let response = server
            .post("/api/create-checkout-session")
            .json(&checkout_body("plan", plan_id))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        let session_id = body["sessionId"].as_str().unwrap();
        assert!(body["url"].as_str().unwrap().contains(session_id));

        let mut conn = pool.acquire().await.unwrap();
        let order = Orders::new(&mut conn).get_by_session_id(session_id).await.unwrap().unwrap();
        assert_eq!(order.order.status, OrderStatus::Pending);
        assert_eq!(order.order.product_id, plan_id);
        assert_eq!(order.order.customer_email, "athlete@example.com");
        assert_eq!(order.product_title.as_deref(), Some("Beginner Strength"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_checkout_validation_errors(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/create-checkout-session")
            .json(&json!({ "productType": "merch" }))
            .await;
        response.assert_status_bad_request();

        let body: Value = response.json();
        assert_eq!(body["message"], "Validation error");
        assert!(body["errors"].as_array().unwrap().iter().any(|e| e["field"] == "customerEmail"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_checkout_malformed_json(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/create-checkout-session")
            .content_type("application/json")
            .bytes(Bytes::from_static(b"{not json"))
            .await;

        response.assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_checkout_inactive_or_missing_product(pool: PgPool) {
        let inactive = insert_test_plan(&pool, "Retired", 1, false).await;
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/create-checkout-session")
            .json(&checkout_body("plan", inactive))
            .await;
        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["message"], "Product not found");

        // A coaching id that exists only as a plan is still unknown
        server
            .post("/api/create-checkout-session")
            .json(&checkout_body("coaching", inactive))
            .await
            .assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_checkout_hidden_coaching(pool: PgPool) {
        let package_id = insert_test_package(&pool, "Starter", Decimal::new(9999, 2), true).await;
        let mut state = create_test_state(pool);
        state.config.coaching.hidden = true;
        let server = create_test_app_with_state(state).await;

        server
            .post("/api/create-checkout-session")
            .json(&checkout_body("coaching", package_id))
            .await
            .assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_checkout_without_provider(pool: PgPool) {
        let plan_id = insert_test_plan(&pool, "Beginner Strength", 1, true).await;
        let mut state = create_test_state(pool);
        state.payment_provider = None;
        let server = create_test_app_with_state(state).await;

        let response = server
            .post("/api/create-checkout-session")
            .json(&checkout_body("plan", plan_id))
            .await;

        response.assert_status(StatusCode::NOT_IMPLEMENTED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_checkout_redirects(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.get("/api/checkout-success?session_id=cs_test_123").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(
            response.header("location"),
            "http://localhost:5173/checkout-success?session_id=cs_test_123"
        );

        let response = server.get("/api/checkout-cancel").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "http://localhost:5173/checkout-cancel");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_dummy_webhook_completes_order(pool: PgPool) {
        let plan_id = insert_test_plan(&pool, "Beginner Strength", 1, true).await;
        let server = create_test_app(pool.clone()).await;

        let body: Value = server
            .post("/api/create-checkout-session")
            .json(&checkout_body("plan", plan_id))
            .await
            .json();
        let session_id = body["sessionId"].as_str().unwrap().to_string();

        let response = server
            .post("/api/webhook")
            .json(&json!({ "type": "checkout.session.completed", "session_id": session_id }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "received": true }));

        let mut conn = pool.acquire().await.unwrap();
        let order = Orders::new(&mut conn).get_by_session_id(&session_id).await.unwrap().unwrap();
        assert_eq!(order.order.status, OrderStatus::Completed);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_malformed_webhook_is_acknowledged(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/webhook")
            .content_type("application/json")
            .bytes(Bytes::from_static(b"garbage"))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["received"], true);
        assert!(body["error"].is_string());
    }
}
