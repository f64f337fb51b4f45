//! Database repository for coaching packages.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::coaching_packages::CoachingPackageDBResponse;
use crate::types::{PackageId, abbrev_uuid};

/// Read-only repository over `coaching_packages`.
pub struct CoachingPackages<'c> {
    db: &'c mut PgConnection,
}

impl<'c> CoachingPackages<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Active packages, cheapest first.
    #[instrument(skip(self), err)]
    pub async fn list_active(&mut self) -> Result<Vec<CoachingPackageDBResponse>> {
        let packages = sqlx::query_as::<_, CoachingPackageDBResponse>(
            r#"
            SELECT * FROM coaching_packages
            WHERE active = TRUE
            ORDER BY price ASC, display_order ASC
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(packages)
    }

    /// Look up a package by ID. Inactive packages are treated as missing.
    #[instrument(skip(self), fields(package_id = %abbrev_uuid(&id)), err)]
    pub async fn get_active_by_id(&mut self, id: PackageId) -> Result<Option<CoachingPackageDBResponse>> {
        let package =
            sqlx::query_as::<_, CoachingPackageDBResponse>("SELECT * FROM coaching_packages WHERE id = $1 AND active = TRUE")
                .bind(id)
                .fetch_optional(&mut *self.db)
                .await?;

        Ok(package)
    }
}
