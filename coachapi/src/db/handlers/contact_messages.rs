//! Database repository for contact form submissions.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::contact_messages::{ContactMessageCreateDBRequest, ContactMessageDBResponse};

pub struct ContactMessages<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ContactMessages<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Store a submission; it starts unread.
    #[instrument(skip(self, request), err)]
    pub async fn create(&mut self, request: &ContactMessageCreateDBRequest) -> Result<ContactMessageDBResponse> {
        let message = sqlx::query_as::<_, ContactMessageDBResponse>(
            r#"
            INSERT INTO contact_messages (name, email, subject, message)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.subject)
        .bind(&request.message)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(message)
    }
}
