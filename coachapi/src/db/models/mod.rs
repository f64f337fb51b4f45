//! Database record models matching table schemas.
//!
//! These structs correspond directly to table rows and derive `sqlx::FromRow` for query results.
//! They are kept separate from the API models in [`crate::api::models`] so the storage and wire
//! representations can evolve independently.
//!
//! - [`plans`]: Independent training plans (read-only content)
//! - [`coaching_packages`]: Coaching packages (read-only content)
//! - [`orders`]: Orders recorded at checkout and reconciled by webhooks
//! - [`newsletter`]: Newsletter subscribers
//! - [`contact_messages`]: Contact form submissions
//! - [`images`]: Polaroid and testimonial galleries

pub mod coaching_packages;
pub mod contact_messages;
pub mod images;
pub mod newsletter;
pub mod orders;
pub mod plans;
