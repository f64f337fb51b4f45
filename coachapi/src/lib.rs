//! # coachapi: Storefront API for a fitness coaching site
//!
//! `coachapi` is the backend behind the Dani's Discipline website. It serves the product
//! catalogue (independent training plans and coaching packages), opens hosted Stripe checkout
//! sessions, records orders and reconciles them from Stripe webhooks, and accepts contact form
//! and newsletter submissions.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL for all persistence.
//!
//! ### Request Flow
//!
//! Catalogue, order and image requests are plain reads: the handler acquires a pooled
//! connection, asks a repository in [`db::handlers`] for rows, and maps them to the API models in
//! [`api::models`].
//!
//! Checkout is a short pipeline. The handler validates the form, looks the product up (only
//! active products can be bought), asks the configured payment provider for a hosted checkout
//! session, and stores a `pending` order keyed on the session id. The browser is then sent to the
//! provider. When payment settles, the provider calls `/api/webhook`; the signature is checked
//! against the raw body, and [`fulfillment`] moves the order to `completed` or `failed` and emails
//! the customer a confirmation.
//!
//! ### Core Components
//!
//! - **API layer** ([`api`]): handlers and request/response models under `/api`
//! - **Database layer** ([`db`]): repositories over `&mut PgConnection`
//! - **Payments** (`payment_providers`): the [`PaymentProvider`](payment_providers::PaymentProvider)
//!   trait with Stripe and dummy implementations
//! - **Email** (`email`): lettre-based confirmations and admin notifications
//! - **Limits** (`limits`): per-client fixed-window rate limiting
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use coachapi::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = coachapi::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     coachapi::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod config;
pub mod db;
mod email;
pub mod errors;
mod fulfillment;
mod limits;
mod openapi;
pub mod payment_providers;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod test;

use crate::{
    api::handlers,
    config::CorsOrigin,
    email::EmailService,
    errors::Error,
    limits::{Limiters, rate_limit_middleware},
    openapi::ApiDoc,
    payment_providers::{PaymentProvider, create_provider},
};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderValue, StatusCode, header},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `db`: PostgreSQL connection pool
/// - `config`: Application configuration loaded from file and environment
/// - `payment_provider`: Checkout and webhook backend; `None` disables payment routes (501)
/// - `email`: Outgoing mail for order confirmations and contact notifications
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .email(Arc::new(email))
///     .maybe_payment_provider(provider)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub payment_provider: Option<Arc<dyn PaymentProvider>>,
    pub email: Arc<EmailService>,
}

impl AppState {
    /// Build state from configuration: email transport and (if configured) the payment provider.
    pub fn from_config(config: Config, db: PgPool) -> anyhow::Result<Self> {
        let email = EmailService::new(&config)?;
        let payment_provider = config.payment.clone().map(create_provider);
        if payment_provider.is_none() {
            tracing::warn!("No payment provider configured: checkout and webhooks will return 501");
        }

        Ok(Self::builder()
            .db(db)
            .config(config)
            .email(Arc::new(email))
            .maybe_payment_provider(payment_provider)
            .build())
    }

    /// The configured payment provider, or a 501 error when payments are disabled.
    pub fn payment_provider(&self) -> errors::Result<Arc<dyn PaymentProvider>> {
        self.payment_provider.clone().ok_or_else(|| Error::NotImplemented {
            message: "Payments are not configured".to_string(),
        })
    }
}

/// Get the coachapi database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

#[instrument(skip_all)]
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let settings = &config.database.pool;

    let mut options = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs));
    if settings.idle_timeout_secs > 0 {
        options = options.idle_timeout(Duration::from_secs(settings.idle_timeout_secs));
    }
    if settings.max_lifetime_secs > 0 {
        options = options.max_lifetime(Duration::from_secs(settings.max_lifetime_secs));
    }

    let pool = options.connect(&config.database.url).await?;
    migrator().run(&pool).await?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allow_origin = if config.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Browsers send origins without a trailing slash
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        if origins.is_empty() {
            origins.push(config.frontend_url.trim_end_matches('/').parse::<HeaderValue>()?);
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(config.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

async fn route_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(api::models::MessageResponse::new("Route not found")))
}

/// Build the main application router with all endpoints and middleware.
///
/// This function constructs the complete Axum router with:
/// - Catalogue, checkout, order, form and image routes under `/api`
/// - Per-client rate limiting on everything except the payment webhook
/// - OpenAPI docs at `/docs`
/// - Static asset serving with SPA fallback when `static_dir` is set
/// - Body size limit, security headers, CORS and request tracing
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let limiters = Limiters::new(&state.config.limits);

    let api_routes = Router::new()
        .route("/api", get(handlers::welcome))
        .route("/api/independent-plans", get(handlers::products::list_plans))
        .route("/api/independent-plans/featured", get(handlers::products::list_featured_plans))
        .route("/api/independent-plans/{id}", get(handlers::products::get_plan))
        .route("/api/coaching-packages", get(handlers::products::list_coaching_packages))
        .route(
            "/api/coaching-packages/availability",
            get(handlers::products::coaching_availability),
        )
        .route("/api/coaching-packages/{id}", get(handlers::products::get_coaching_package))
        .route(
            "/api/create-checkout-session",
            post(handlers::checkout::create_checkout_session),
        )
        .route("/api/checkout-success", get(handlers::checkout::checkout_success))
        .route("/api/checkout-cancel", get(handlers::checkout::checkout_cancel))
        .route("/api/display-orders", get(handlers::orders::list_orders))
        .route("/api/display-orders/{id}", get(handlers::orders::get_order))
        .route(
            "/api/display-orders/session/{session_id}",
            get(handlers::orders::get_order_by_session),
        )
        .route(
            "/api/display-orders/customer/{email}",
            get(handlers::orders::list_customer_orders),
        )
        .route("/api/contact", post(handlers::contact::submit_contact_form))
        .route("/api/newsletter", post(handlers::newsletter::subscribe))
        .route("/api/images/polaroids", get(handlers::images::list_polaroids))
        .route("/api/images/testimonials", get(handlers::images::list_testimonials))
        .route("/api/images/{bucket}/{filename}", get(handlers::images::get_image_url))
        .route_layer(from_fn_with_state(limiters, rate_limit_middleware))
        .with_state(state.clone());

    // The provider retries on anything but 2xx, so webhooks are never rate limited
    let webhook_routes = Router::new()
        .route("/api/webhook", post(handlers::checkout::webhook))
        .with_state(state.clone());

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(api_routes)
        .merge(webhook_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    router = match &state.config.static_dir {
        Some(dir) => {
            info!("Serving front end from {}", dir.display());
            let spa = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
            router.fallback_service(spa)
        }
        None => router.fallback(route_not_found),
    };

    router = router.layer(DefaultBodyLimit::max(state.config.limits.max_body_bytes));

    if state.config.security_headers {
        router = router.layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("no-referrer"),
                )),
        );
    }

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::DEBUG))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and the router.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database, runs migrations, and builds state
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal resolves, in-flight requests finish and the pool closes
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting coachapi with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;
        Self::new_with_pool(config, pool)
    }

    /// Create an application on an existing pool. Migrations are assumed to have run.
    pub fn new_with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        let state = AppState::from_config(config.clone(), pool.clone())?;
        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "coachapi listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Peer addresses key the rate limiter when no proxy header is present
        axum::serve(listener, self.router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
