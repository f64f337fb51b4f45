use crate::api::models::orders::{ListOrdersQuery, OrderResponse, ProviderSessionResponse, SessionOrderResponse};
use crate::db::handlers::{Orders, Repository};
use crate::db::models::orders::OrderFilter;
use crate::errors::{Error, Result};
use crate::types::OrderStatus;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

fn order_not_found(id: &str) -> Error {
    Error::NotFound {
        resource: "Order".to_string(),
        id: id.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/api/display-orders",
    tag = "orders",
    summary = "List orders",
    description = "Orders newest first, optionally filtered by customer email and status",
    params(ListOrdersQuery),
    responses(
        (status = 200, description = "Matching orders", body = Vec<OrderResponse>),
        (status = 400, description = "Unknown status filter"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_orders(State(state): State<AppState>, Query(query): Query<ListOrdersQuery>) -> Result<Json<Vec<OrderResponse>>> {
    let status = query
        .status
        .as_deref()
        .map(|raw| {
            raw.parse::<OrderStatus>().map_err(|_| Error::BadRequest {
                message: format!("Invalid status '{raw}': expected pending, completed or failed"),
            })
        })
        .transpose()?;

    let filter = OrderFilter {
        customer_email: query.customer_email,
        status,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let orders = Orders::new(&mut conn).list(&filter).await?;

    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/display-orders/{id}",
    tag = "orders",
    summary = "Get order",
    description = "A UUID is looked up as an order id; anything else as a checkout session id",
    params(("id" = String, Path, description = "Order ID or checkout session ID")),
    responses(
        (status = 200, description = "Order with product details", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(id = %id))]
pub async fn get_order(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<OrderResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut orders = Orders::new(&mut conn);

    let order = match Uuid::parse_str(&id) {
        Ok(order_id) => orders.get_by_id(order_id).await?,
        Err(_) => orders.get_by_session_id(&id).await?,
    };

    order
        .map(|order| Json(OrderResponse::from(order)))
        .ok_or_else(|| order_not_found(&id))
}

#[utoipa::path(
    get,
    path = "/api/display-orders/session/{session_id}",
    tag = "orders",
    summary = "Get order by checkout session",
    description = "Returns the stored order, or the payment provider's view of the session when no order was recorded",
    params(("session_id" = String, Path, description = "Checkout session ID")),
    responses(
        (status = 200, description = "Stored order or provider session", body = SessionOrderResponse),
        (status = 404, description = "Unknown session"),
        (status = 502, description = "Payment provider error"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(session_id = %session_id))]
pub async fn get_order_by_session(State(state): State<AppState>, Path(session_id): Path<String>) -> Result<Json<SessionOrderResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if let Some(order) = Orders::new(&mut conn).get_by_session_id(&session_id).await? {
        return Ok(Json(SessionOrderResponse::Stored(Box::new(order.into()))));
    }
    drop(conn);

    // No local record yet (e.g. the webhook hasn't landed): ask the provider
    if let Some(provider) = state.payment_provider.as_ref()
        && let Some(summary) = provider.retrieve_session(&session_id).await?
    {
        return Ok(Json(SessionOrderResponse::Provider(ProviderSessionResponse::from(summary))));
    }

    Err(order_not_found(&session_id))
}

#[utoipa::path(
    get,
    path = "/api/display-orders/customer/{email}",
    tag = "orders",
    summary = "List a customer's orders",
    params(("email" = String, Path, description = "Customer email address")),
    responses(
        (status = 200, description = "The customer's orders, newest first", body = Vec<OrderResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_customer_orders(State(state): State<AppState>, Path(email): Path<String>) -> Result<Json<Vec<OrderResponse>>> {
    let filter = OrderFilter {
        customer_email: Some(email),
        status: None,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let orders = Orders::new(&mut conn).list(&filter).await?;

    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}
