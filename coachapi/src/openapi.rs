//! OpenAPI documentation for the storefront API, served at `/docs`.

use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::{api, errors::FieldError, types};

/// Error body returned by every failing endpoint.
///
/// Documentation only: responses are rendered by [`crate::errors::Error`].
#[allow(unused)]
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "message": "Validation error",
    "errors": [{"field": "customerEmail", "message": "\"customerEmail\" must be a valid email"}]
}))]
pub struct ErrorBody {
    /// Safe description of what went wrong
    pub message: String,
    /// Failed field rules, present only on validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dani's Discipline API",
        description = "Catalogue, checkout, order and contact endpoints for the Dani's Discipline site."
    ),
    paths(
        api::handlers::welcome,
        api::handlers::products::list_plans,
        api::handlers::products::list_featured_plans,
        api::handlers::products::get_plan,
        api::handlers::products::list_coaching_packages,
        api::handlers::products::coaching_availability,
        api::handlers::products::get_coaching_package,
        api::handlers::checkout::create_checkout_session,
        api::handlers::checkout::webhook,
        api::handlers::checkout::checkout_success,
        api::handlers::checkout::checkout_cancel,
        api::handlers::orders::list_orders,
        api::handlers::orders::get_order,
        api::handlers::orders::get_order_by_session,
        api::handlers::orders::list_customer_orders,
        api::handlers::contact::submit_contact_form,
        api::handlers::newsletter::subscribe,
        api::handlers::images::list_polaroids,
        api::handlers::images::list_testimonials,
        api::handlers::images::get_image_url,
    ),
    components(
        schemas(
            ErrorBody,
            FieldError,
            types::ProductType,
            types::OrderStatus,
            api::models::MessageResponse,
            api::models::products::PlanResponse,
            api::models::products::CoachingPackageResponse,
            api::models::products::CoachingAvailabilityResponse,
            api::models::checkout::CheckoutCreate,
            api::models::checkout::CheckoutSessionResponse,
            api::models::checkout::WebhookAck,
            api::models::orders::OrderResponse,
            api::models::orders::ProviderSessionResponse,
            api::models::orders::SessionOrderResponse,
            api::models::contact::ContactCreate,
            api::models::contact::ContactResponse,
            api::models::newsletter::NewsletterSubscribe,
            api::models::newsletter::NewsletterResponse,
            api::models::newsletter::SubscriptionOutcome,
            api::models::images::PolaroidResponse,
            api::models::images::TestimonialImageResponse,
            api::models::images::PolaroidListResponse,
            api::models::images::TestimonialListResponse,
            api::models::images::ImageUrlResponse,
        )
    ),
    tags(
        (name = "health", description = "Service liveness"),
        (name = "plans", description = "Independent training plans"),
        (name = "coaching", description = "Coaching packages"),
        (name = "checkout", description = "Hosted checkout and payment webhooks"),
        (name = "orders", description = "Order lookups"),
        (name = "contact", description = "Contact form"),
        (name = "newsletter", description = "Newsletter sign-up"),
        (name = "images", description = "Gallery images"),
    )
)]
pub struct ApiDoc;
