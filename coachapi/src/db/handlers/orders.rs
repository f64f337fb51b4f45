//! Database repository for display orders.
//!
//! An order is written once, as `pending`, when the checkout session is created. The payment
//! webhook then moves it to `completed` or `failed`. Both transitions are single UPDATEs keyed on
//! the provider session id, guarded on the current status, so replaying a webhook is a no-op.

use async_trait::async_trait;
use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::handlers::repository::Repository;
use crate::db::models::orders::{OrderCreateDBRequest, OrderDBResponse, OrderFilter, OrderWithProductDBResponse};
use crate::types::{OrderId, abbrev_uuid};

/// Rows of the `o` CTE joined with the product each order bought
const WITH_PRODUCT: &str = r#"
    SELECT
        o.*,
        COALESCE(p.title, c.title) AS product_title,
        COALESCE(p.description, c.description) AS product_description
    FROM o
    LEFT JOIN independent_plans p ON o.product_type = 'plan' AND p.id = o.product_id
    LEFT JOIN coaching_packages c ON o.product_type = 'coaching' AND c.id = o.product_id
"#;

pub struct Orders<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Orders<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Find the order created for a checkout session, with its product details.
    #[instrument(skip(self), err)]
    pub async fn get_by_session_id(&mut self, session_id: &str) -> Result<Option<OrderWithProductDBResponse>> {
        let order = sqlx::query_as::<_, OrderWithProductDBResponse>(&format!(
            "WITH o AS (SELECT * FROM display_orders WHERE stripe_session_id = $1) {WITH_PRODUCT}"
        ))
        .bind(session_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(order)
    }

    /// Mark the session's order completed.
    ///
    /// Returns the order only if this call performed the transition; an already completed order
    /// yields `None`, which callers use to avoid sending a second confirmation email.
    #[instrument(skip(self), err)]
    pub async fn mark_completed(&mut self, session_id: &str, payment_id: Option<&str>) -> Result<Option<OrderDBResponse>> {
        let order = sqlx::query_as::<_, OrderDBResponse>(
            r#"
            UPDATE display_orders
            SET status = 'completed',
                stripe_payment_id = COALESCE($2, stripe_payment_id),
                updated_at = NOW()
            WHERE stripe_session_id = $1 AND status <> 'completed'
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(payment_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(order)
    }

    /// Mark the session's order failed. Only pending orders move; a completed order stays completed.
    #[instrument(skip(self), err)]
    pub async fn mark_failed(&mut self, session_id: &str, payment_id: Option<&str>) -> Result<Option<OrderDBResponse>> {
        let order = sqlx::query_as::<_, OrderDBResponse>(
            r#"
            UPDATE display_orders
            SET status = 'failed',
                stripe_payment_id = COALESCE($2, stripe_payment_id),
                updated_at = NOW()
            WHERE stripe_session_id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(payment_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(order)
    }
}

/// Every read and the insert return the order joined with its product's title and description.
#[async_trait]
impl<'c> Repository for Orders<'c> {
    type CreateRequest = OrderCreateDBRequest;
    type Response = OrderWithProductDBResponse;
    type Id = OrderId;
    type Filter = OrderFilter;

    #[instrument(skip(self, request), fields(session_id = %request.stripe_session_id, product_type = %request.product_type), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let order = sqlx::query_as::<_, OrderWithProductDBResponse>(&format!(
            r#"
            WITH o AS (
                INSERT INTO display_orders (customer_email, customer_name, product_type, product_id, amount, stripe_session_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            {WITH_PRODUCT}
            "#
        ))
        .bind(&request.customer_email)
        .bind(&request.customer_name)
        .bind(request.product_type)
        .bind(request.product_id)
        .bind(request.amount)
        .bind(&request.stripe_session_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let order = sqlx::query_as::<_, OrderWithProductDBResponse>(&format!(
            "WITH o AS (SELECT * FROM display_orders WHERE id = $1) {WITH_PRODUCT}"
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(order)
    }

    /// Orders matching the filter, most recent purchase first.
    #[instrument(skip(self), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let orders = sqlx::query_as::<_, OrderWithProductDBResponse>(&format!(
            r#"
            WITH o AS (
                SELECT * FROM display_orders
                WHERE ($1::text IS NULL OR customer_email = $1)
                  AND ($2::text IS NULL OR status = $2)
            )
            {WITH_PRODUCT}
            ORDER BY o.purchase_date DESC
            "#
        ))
        .bind(filter.customer_email.as_deref())
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&mut *self.db)
        .await?;

        Ok(orders)
    }
}
