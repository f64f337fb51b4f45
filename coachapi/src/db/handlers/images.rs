//! Database repository for the polaroid and testimonial galleries.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::images::{PolaroidDBResponse, TestimonialImageDBResponse};

pub struct Images<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Images<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Polaroids, newest first.
    #[instrument(skip(self), err)]
    pub async fn list_polaroids(&mut self) -> Result<Vec<PolaroidDBResponse>> {
        let images = sqlx::query_as::<_, PolaroidDBResponse>("SELECT * FROM polaroids ORDER BY created_at DESC")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(images)
    }

    #[instrument(skip(self), err)]
    pub async fn list_testimonials(&mut self) -> Result<Vec<TestimonialImageDBResponse>> {
        let images = sqlx::query_as::<_, TestimonialImageDBResponse>(
            "SELECT * FROM testimonial_images ORDER BY display_order ASC, created_at ASC",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(images)
    }
}
