//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! Everything lives under `/api`:
//!
//! - **Catalogue** (`/api/independent-plans/*`, `/api/coaching-packages/*`): Active products
//! - **Checkout** (`/api/create-checkout-session`, `/api/webhook`, `/api/checkout-*`): Hosted payments
//! - **Orders** (`/api/display-orders/*`): Order lookups
//! - **Forms** (`/api/contact`, `/api/newsletter`): Contact messages and newsletter sign-ups
//! - **Images** (`/api/images/*`): Gallery images and storage links
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! API documentation is available at `/docs` when the server is running.

pub mod handlers;
pub mod models;
