use crate::api::handlers::json_body;
use crate::api::models::newsletter::{NewsletterResponse, NewsletterSubscribe, SubscriptionOutcome};
use crate::db::handlers::NewsletterSubscribers;
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
    path = "/api/newsletter",
    tag = "newsletter",
    summary = "Subscribe to the newsletter",
    description = "New addresses are created (201). Lapsed subscribers are reactivated and active ones are left alone (200).",
    request_body = NewsletterSubscribe,
    responses(
        (status = 201, description = "Subscribed", body = NewsletterResponse),
        (status = 200, description = "Resubscribed or already subscribed", body = NewsletterResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn subscribe(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewsletterSubscribe>, JsonRejection>,
) -> Result<(StatusCode, Json<NewsletterResponse>)> {
    let request = json_body(payload)?.validate()?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut subscribers = NewsletterSubscribers::new(&mut tx);

    let (status, outcome) = match subscribers.get_by_email(&request.email).await? {
        Some(existing) if existing.active => (StatusCode::OK, SubscriptionOutcome::AlreadySubscribed),
        Some(existing) => {
            subscribers.reactivate(existing.id, &request.name).await?;
            tracing::info!("Reactivated newsletter subscriber {}", abbrev_uuid(&existing.id));
            (StatusCode::OK, SubscriptionOutcome::Resubscribed)
        }
        None => {
            let created = subscribers.create(&request).await?;
            tracing::info!("New newsletter subscriber {}", abbrev_uuid(&created.id));
            (StatusCode::CREATED, SubscriptionOutcome::Subscribed)
        }
    };

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((status, Json(NewsletterResponse::from(outcome))))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::create_test_app;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_subscribe_flows(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let body = json!({ "name": "Alex", "email": "Alex@Example.com" });

        let response = server.post("/api/newsletter").json(&body).await;
        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["status"], "subscribed");

        let response = server.post("/api/newsletter").json(&body).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "already_subscribed");

        sqlx::query("UPDATE newsletter_subscribers SET active = FALSE")
            .execute(&pool)
            .await
            .unwrap();

        let response = server
            .post("/api/newsletter")
            .json(&json!({ "name": "Alex R", "email": "alex@example.com" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "resubscribed");

        let (name, active): (String, bool) = sqlx::query_as("SELECT name, active FROM newsletter_subscribers")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(name, "Alex R");
        assert!(active);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_subscribe_validation(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/newsletter")
            .json(&json!({ "name": "Alex", "email": "alex@localhost" }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["errors"][0]["field"], "email");
    }
}
