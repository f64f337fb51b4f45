//! Database repository for newsletter subscribers.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::newsletter::{SubscriberCreateDBRequest, SubscriberDBResponse};
use crate::types::{SubscriberId, abbrev_uuid};

pub struct NewsletterSubscribers<'c> {
    db: &'c mut PgConnection,
}

impl<'c> NewsletterSubscribers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Emails are stored lowercased, so lookups are case-insensitive.
    #[instrument(skip(self), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<SubscriberDBResponse>> {
        let subscriber = sqlx::query_as::<_, SubscriberDBResponse>("SELECT * FROM newsletter_subscribers WHERE email = LOWER($1)")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(subscriber)
    }

    /// Add a subscriber. The email is stored lowercased and must not already be present.
    #[instrument(skip(self, request), err)]
    pub async fn create(&mut self, request: &SubscriberCreateDBRequest) -> Result<SubscriberDBResponse> {
        let subscriber = sqlx::query_as::<_, SubscriberDBResponse>(
            "INSERT INTO newsletter_subscribers (name, email) VALUES ($1, LOWER($2)) RETURNING *",
        )
        .bind(&request.name)
        .bind(&request.email)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(subscriber)
    }

    /// Reactivate a previously unsubscribed address, updating the name.
    #[instrument(skip(self, name), fields(subscriber_id = %abbrev_uuid(&id)), err)]
    pub async fn reactivate(&mut self, id: SubscriberId, name: &str) -> Result<SubscriberDBResponse> {
        let subscriber = sqlx::query_as::<_, SubscriberDBResponse>(
            "UPDATE newsletter_subscribers SET active = TRUE, name = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(subscriber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use sqlx::PgPool;

    fn request(email: &str) -> SubscriberCreateDBRequest {
        SubscriberCreateDBRequest {
            name: "Sam".to_string(),
            email: email.to_string(),
        }
    }

    #[sqlx::test]
    async fn test_create_normalises_email(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = NewsletterSubscribers::new(&mut conn);

        let created = repo.create(&request("Sam@Example.COM")).await.unwrap();
        assert_eq!(created.email, "sam@example.com");
        assert!(created.active);

        let found = repo.get_by_email("SAM@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[sqlx::test]
    async fn test_duplicate_email_rejected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = NewsletterSubscribers::new(&mut conn);

        repo.create(&request("sam@example.com")).await.unwrap();
        let err = repo.create(&request("SAM@example.com")).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    async fn test_reactivate(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = NewsletterSubscribers::new(&mut conn);

        let created = repo.create(&request("sam@example.com")).await.unwrap();
        sqlx::query("UPDATE newsletter_subscribers SET active = FALSE WHERE id = $1")
            .bind(created.id)
            .execute(&mut *repo.db)
            .await
            .unwrap();
        assert!(!repo.get_by_email("sam@example.com").await.unwrap().unwrap().active);

        let reactivated = repo.reactivate(created.id, "Samantha").await.unwrap();
        assert!(reactivated.active);
        assert_eq!(reactivated.name, "Samantha");
        assert_eq!(repo.get_by_email("sam@example.com").await.unwrap().unwrap().id, created.id);
    }
}
