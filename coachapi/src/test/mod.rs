//! End-to-end tests: full router, real database, Stripe mocked with wiremock.

use crate::config::{Config, PaymentConfig, StripeConfig};
use crate::db::handlers::Orders;
use crate::payment_providers::signing;
use crate::test_utils::{create_test_app, create_test_app_with_config, create_test_config, install_crypto_provider, insert_test_plan};
use crate::types::OrderStatus;
use axum::http::StatusCode;
use axum_test::TestServer;
use bytes::Bytes;
use serde_json::{Value, json};
use sqlx::PgPool;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WEBHOOK_SECRET: &str = "whsec_e2e";

fn stripe_config(server: &MockServer) -> Config {
    install_crypto_provider();
    let mut config = create_test_config();
    config.payment = Some(PaymentConfig::Stripe(StripeConfig {
        api_key: "sk_test_e2e".to_string(),
        webhook_secret: WEBHOOK_SECRET.to_string(),
        api_base: url::Url::parse(&server.uri()).unwrap(),
        ..Default::default()
    }));
    config
}

fn completed_event(session_id: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": "evt_e2e",
        "object": "event",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "object": "checkout.session",
                "payment_intent": "pi_e2e",
                "payment_status": "paid"
            }
        }
    }))
    .unwrap()
}

async fn post_webhook(server: &TestServer, payload: Vec<u8>, signature: Option<String>) -> axum_test::TestResponse {
    let mut request = server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(Bytes::from(payload));
    if let Some(signature) = signature {
        request = request.add_header(signing::SIGNATURE_HEADER, signature);
    }
    request.await
}

async fn order_status(pool: &PgPool, session_id: &str) -> OrderStatus {
    let mut conn = pool.acquire().await.unwrap();
    Orders::new(&mut conn)
        .get_by_session_id(session_id)
        .await
        .unwrap()
        .expect("order should exist")
        .order
        .status
}

/// Checkout through Stripe, then a signed webhook completes the order.
#[sqlx::test]
#[test_log::test]
async fn test_e2e_stripe_checkout_and_webhook(pool: PgPool) {
    let plan_id = insert_test_plan(&pool, "Beginner Strength", 1, true).await;

    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(header("authorization", "Bearer sk_test_e2e"))
        .and(body_string_contains("line_items%5B0%5D%5Bprice_data%5D%5Bunit_amount%5D=2999"))
        .and(body_string_contains("customer_email=athlete%40example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_e2e",
            "object": "checkout.session",
            "url": "https://checkout.stripe.com/c/pay/cs_test_e2e"
        })))
        .expect(1)
        .mount(&stripe)
        .await;

    let server = create_test_app_with_config(pool.clone(), stripe_config(&stripe)).await;

    let response = server
        .post("/api/create-checkout-session")
        .json(&json!({
            "productType": "plan",
            "productId": plan_id.to_string(),
            "customerEmail": "athlete@example.com",
            "customerName": "Alex Runner",
            "successUrl": "http://localhost:5173/checkout-success?session_id={CHECKOUT_SESSION_ID}",
            "cancelUrl": "http://localhost:5173/checkout-cancel"
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "sessionId": "cs_test_e2e", "url": "https://checkout.stripe.com/c/pay/cs_test_e2e" })
    );
    assert_eq!(order_status(&pool, "cs_test_e2e").await, OrderStatus::Pending);

    let payload = completed_event("cs_test_e2e");
    let signature = signing::signature_header(chrono::Utc::now().timestamp(), &payload, WEBHOOK_SECRET);

    let response = post_webhook(&server, payload, signature).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "received": true }));

    assert_eq!(order_status(&pool, "cs_test_e2e").await, OrderStatus::Completed);

    let order: Value = server.get("/api/display-orders/session/cs_test_e2e").await.json();
    assert_eq!(order["status"], "completed");
    assert_eq!(order["stripePaymentId"], "pi_e2e");
    assert_eq!(order["amount"], 29.99);
}

/// Bad signatures are acknowledged (200) but never touch orders; a missing header is a 400.
#[sqlx::test]
#[test_log::test]
async fn test_e2e_webhook_signature_checks(pool: PgPool) {
    let plan_id = insert_test_plan(&pool, "Beginner Strength", 1, true).await;
    {
        use crate::db::handlers::Repository;
        let mut conn = pool.acquire().await.unwrap();
        Orders::new(&mut conn)
            .create(&crate::test_utils::order_request(crate::types::ProductType::Plan, plan_id, "cs_test_sig"))
            .await
            .unwrap();
    }

    let stripe = MockServer::start().await;
    let server = create_test_app_with_config(pool.clone(), stripe_config(&stripe)).await;
    let payload = completed_event("cs_test_sig");

    let forged = signing::signature_header(chrono::Utc::now().timestamp(), &payload, "whsec_wrong");
    let response = post_webhook(&server, payload.clone(), forged).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["received"], true);
    assert_eq!(body["error"], "Invalid webhook signature");
    assert_eq!(order_status(&pool, "cs_test_sig").await, OrderStatus::Pending);

    // Signed long ago: outside the replay tolerance
    let stale = signing::signature_header(chrono::Utc::now().timestamp() - 3600, &payload, WEBHOOK_SECRET);
    let response = post_webhook(&server, payload.clone(), stale).await;
    response.assert_status_ok();
    assert!(response.json::<Value>()["error"].is_string());
    assert_eq!(order_status(&pool, "cs_test_sig").await, OrderStatus::Pending);

    let response = post_webhook(&server, payload, None).await;
    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["message"], "Stripe signature is missing");
}

/// Sessions with no stored order are looked up at Stripe.
#[sqlx::test]
#[test_log::test]
async fn test_e2e_session_lookup_falls_back_to_stripe(pool: PgPool) {
    let stripe = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_remote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_remote",
            "object": "checkout.session",
            "payment_status": "paid",
            "customer_details": { "email": "athlete@example.com" },
            "amount_total": 14900,
            "created": 1735689600
        })))
        .expect(1)
        .mount(&stripe)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "type": "invalid_request_error", "message": "No such checkout.session" }
        })))
        .mount(&stripe)
        .await;

    let server = create_test_app_with_config(pool, stripe_config(&stripe)).await;

    let response = server.get("/api/display-orders/session/cs_remote").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["id"], "cs_remote");
    assert_eq!(body["status"], "paid");
    assert_eq!(body["customerEmail"], "athlete@example.com");
    assert_eq!(body["amount"], 149.0);
    assert_eq!(body["purchaseDate"], "2025-01-01T00:00:00Z");

    server
        .get("/api/display-orders/session/cs_missing")
        .await
        .assert_status_not_found();

    // Encoded slashes in the id never reach another Stripe resource
    server
        .get("/api/display-orders/session/..%2F..%2Finvoices%2Fin_secret")
        .await
        .assert_status_not_found();
    let paths: Vec<String> = stripe.received_requests().await.unwrap().iter().map(|r| r.url.path().to_string()).collect();
    assert_eq!(paths, ["/v1/checkout/sessions/cs_remote", "/v1/checkout/sessions/cs_missing"]);
}

#[sqlx::test]
#[test_log::test]
async fn test_e2e_rate_limit(pool: PgPool) {
    let mut config = create_test_config();
    config.limits.rate_limit.max_requests = 2;
    // The mock transport has no peer address; clients are told apart by the proxy header
    config.limits.rate_limit.trust_forwarded_for = true;
    let server = create_test_app_with_config(pool, config).await;

    for remaining in ["1", "0"] {
        let response = server.get("/api").add_header("x-forwarded-for", "203.0.113.7").await;
        response.assert_status_ok();
        assert_eq!(response.header("ratelimit-limit"), "2");
        assert_eq!(response.header("ratelimit-remaining"), remaining);
    }

    let response = server.get("/api").add_header("x-forwarded-for", "203.0.113.7").await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert!(response.json::<Value>()["message"].is_string());

    // Other clients have their own window
    server
        .get("/api")
        .add_header("x-forwarded-for", "198.51.100.1")
        .await
        .assert_status_ok();

    // Payment webhooks are never limited
    let response = server
        .post("/api/webhook")
        .add_header("x-forwarded-for", "203.0.113.7")
        .json(&json!({ "type": "customer.created" }))
        .await;
    response.assert_status_ok();
}

#[sqlx::test]
#[test_log::test]
async fn test_e2e_service_routes(pool: PgPool) {
    let server = create_test_app(pool).await;

    let response = server.get("/healthz").await;
    response.assert_status_ok();
    response.assert_text("OK");

    let response = server.get("/api").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "message": "Welcome to Dani's Discipline API" }));
    assert_eq!(response.header("x-content-type-options"), "nosniff");
    assert_eq!(response.header("x-frame-options"), "DENY");

    let response = server.get("/api/does-not-exist").await;
    response.assert_status_not_found();
    assert_eq!(response.json::<Value>(), json!({ "message": "Route not found" }));

    server.get("/docs").await.assert_status_ok();
}

#[sqlx::test]
#[test_log::test]
async fn test_e2e_cors_allows_frontend(pool: PgPool) {
    let server = create_test_app(pool).await;

    let response = server
        .get("/api")
        .add_header("origin", "http://localhost:5173")
        .await;
    assert_eq!(response.header("access-control-allow-origin"), "http://localhost:5173");

    let response = server.get("/api").add_header("origin", "https://evil.example").await;
    assert!(response.maybe_header("access-control-allow-origin").is_none());
}

#[sqlx::test]
#[test_log::test]
async fn test_e2e_static_spa_fallback(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>shop</html>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log('hi')").unwrap();

    let mut config = create_test_config();
    config.static_dir = Some(dir.path().to_path_buf());
    let server = create_test_app_with_config(pool, config).await;

    server.get("/app.js").await.assert_text("console.log('hi')");
    // Client-side routes get the app shell
    server.get("/coaching/premium").await.assert_text("<html>shop</html>");
    // API routes still win
    server.get("/api").await.assert_status_ok();
}

#[sqlx::test]
#[test_log::test]
async fn test_e2e_body_limit(pool: PgPool) {
    let mut config = create_test_config();
    config.limits.max_body_bytes = 1024;
    let server = create_test_app_with_config(pool, config).await;

    let response = server
        .post("/api/contact")
        .json(&json!({
            "name": "Sam Lifter",
            "email": "sam@example.com",
            "subject": "Long",
            "message": "x".repeat(4096)
        }))
        .await;

    assert!(response.status_code().is_client_error());
}

#[sqlx::test]
#[test_log::test]
async fn test_e2e_application_on_existing_pool(pool: PgPool) {
    insert_test_plan(&pool, "Hypertrophy Block", 1, true).await;

    let server = crate::Application::new_with_pool(create_test_config(), pool)
        .unwrap()
        .into_test_server();

    let plans: Value = server.get("/api/independent-plans").await.json();
    assert_eq!(plans[0]["title"], "Hypertrophy Block");
    assert_eq!(server.get("/api").await.header("referrer-policy"), "no-referrer");
}
