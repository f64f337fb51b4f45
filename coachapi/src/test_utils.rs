//! Test utilities shared by unit and integration tests.

use std::sync::Once;

use crate::config::{Config, DummyConfig, EmailTransportConfig, PaymentConfig, PoolSettings};
use crate::db::models::orders::OrderCreateDBRequest;
use crate::types::{PackageId, PlanId, ProductType};
use crate::AppState;
use axum_test::TestServer;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Install the rustls crypto provider once per test binary (needed by reqwest clients).
pub fn install_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    });
}

pub fn create_test_config() -> Config {
    // Use temp directory for test emails
    let temp_dir = std::env::temp_dir().join(format!("coachapi-test-emails-{}", std::process::id()));

    let mut config = Config::default();
    config.database.pool = PoolSettings {
        max_connections: 2,
        min_connections: 0,
        ..Default::default()
    };
    config.payment = Some(PaymentConfig::Dummy(DummyConfig::default()));
    config.email.transport = EmailTransportConfig::File {
        path: temp_dir.to_string_lossy().into_owned(),
    };
    config.email.admin_email = Some("dani@example.com".to_string());
    // Rate limiting has its own tests
    config.limits.rate_limit.max_requests = 0;
    config
}

/// Application state on the given pool, with the dummy payment provider.
pub fn create_test_state(pool: PgPool) -> AppState {
    AppState::from_config(create_test_config(), pool).expect("Failed to create test state")
}

pub async fn create_test_app(pool: PgPool) -> TestServer {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: PgPool, config: Config) -> TestServer {
    let state = AppState::from_config(config, pool).expect("Failed to create test state");
    create_test_app_with_state(state).await
}

pub async fn create_test_app_with_state(state: AppState) -> TestServer {
    let router = crate::build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

pub async fn insert_test_plan(pool: &PgPool, title: &str, display_order: i32, active: bool) -> PlanId {
    sqlx::query_scalar(
        "INSERT INTO independent_plans (title, description, display_order, price, active) VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(title)
    .bind(format!("{title} training plan"))
    .bind(display_order)
    .bind(Decimal::new(2999, 2))
    .bind(active)
    .fetch_one(pool)
    .await
    .expect("Failed to insert test plan")
}

pub async fn insert_test_package(pool: &PgPool, title: &str, price: Decimal, active: bool) -> PackageId {
    sqlx::query_scalar(
        "INSERT INTO coaching_packages (title, description, features, price, active) VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(title)
    .bind(format!("{title} coaching"))
    .bind(vec!["Weekly check-ins".to_string(), "Custom programming".to_string()])
    .bind(price)
    .bind(active)
    .fetch_one(pool)
    .await
    .expect("Failed to insert test package")
}

/// A pending order for `athlete@example.com`.
pub fn order_request(product_type: ProductType, product_id: Uuid, session_id: &str) -> OrderCreateDBRequest {
    OrderCreateDBRequest {
        customer_email: "athlete@example.com".to_string(),
        customer_name: "Alex Runner".to_string(),
        product_type,
        product_id,
        amount: Decimal::new(2999, 2),
        stripe_session_id: session_id.to_string(),
    }
}
