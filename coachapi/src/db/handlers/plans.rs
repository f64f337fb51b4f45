//! Database repository for independent training plans.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::plans::PlanDBResponse;
use crate::types::{PlanId, abbrev_uuid};

/// Read-only repository over `independent_plans`.
pub struct Plans<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Plans<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Active plans in display order.
    #[instrument(skip(self), err)]
    pub async fn list_active(&mut self) -> Result<Vec<PlanDBResponse>> {
        let plans = sqlx::query_as::<_, PlanDBResponse>(
            r#"
            SELECT * FROM independent_plans
            WHERE active = TRUE
            ORDER BY display_order ASC, created_at ASC
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(plans)
    }

    /// The first `limit` active plans in display order.
    #[instrument(skip(self), err)]
    pub async fn list_featured(&mut self, limit: i64) -> Result<Vec<PlanDBResponse>> {
        let plans = sqlx::query_as::<_, PlanDBResponse>(
            r#"
            SELECT * FROM independent_plans
            WHERE active = TRUE
            ORDER BY display_order ASC, created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(plans)
    }

    /// Look up a plan by ID. Inactive plans are treated as missing.
    #[instrument(skip(self), fields(plan_id = %abbrev_uuid(&id)), err)]
    pub async fn get_active_by_id(&mut self, id: PlanId) -> Result<Option<PlanDBResponse>> {
        let plan = sqlx::query_as::<_, PlanDBResponse>("SELECT * FROM independent_plans WHERE id = $1 AND active = TRUE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(plan)
    }
}
