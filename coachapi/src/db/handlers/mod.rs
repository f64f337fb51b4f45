//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection` (a pooled connection or an open transaction) and
//! returns models from [`crate::db::models`].
//!
//! # Available Repositories
//!
//! - [`Plans`]: Independent training plans (read-only)
//! - [`CoachingPackages`]: Coaching packages (read-only)
//! - [`Orders`]: Orders recorded at checkout and reconciled by payment webhooks
//! - [`NewsletterSubscribers`]: Newsletter sign-ups
//! - [`ContactMessages`]: Contact form submissions
//! - [`Images`]: Gallery images (read-only)
//!
//! ```ignore
//! use coachapi::db::handlers::{Orders, Repository};
//!
//! let mut conn = pool.acquire().await?;
//! let order = Orders::new(&mut conn).get_by_id(order_id).await?;
//! ```

pub mod coaching_packages;
pub mod contact_messages;
pub mod images;
pub mod newsletter;
pub mod orders;
pub mod plans;
pub mod repository;

pub use coaching_packages::CoachingPackages;
pub use contact_messages::ContactMessages;
pub use images::Images;
pub use newsletter::NewsletterSubscribers;
pub use orders::Orders;
pub use plans::Plans;
pub use repository::Repository;
