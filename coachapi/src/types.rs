//! Common type definitions shared by the database and API layers.
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases:
//!
//! - [`PlanId`]: Independent (self-guided) training plan
//! - [`PackageId`]: Coaching package
//! - [`OrderId`]: Display order recorded at checkout
//! - [`SubscriberId`]: Newsletter subscriber
//! - [`ContactMessageId`]: Contact form submission
//!
//! # Enums
//!
//! - [`ProductType`]: Which catalogue a purchase refers to
//! - [`OrderStatus`]: Lifecycle of an order (pending → completed | failed)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

// Type aliases for IDs
pub type PlanId = Uuid;
pub type PackageId = Uuid;
pub type OrderId = Uuid;
pub type SubscriberId = Uuid;
pub type ContactMessageId = Uuid;
pub type ImageId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Product catalogue a checkout refers to, stored as TEXT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Coaching,
    Plan,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Coaching => "coaching",
            ProductType::Plan => "plan",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coaching" => Ok(ProductType::Coaching),
            "plan" => Ok(ProductType::Plan),
            other => Err(format!("unknown product type '{other}'")),
        }
    }
}

/// Order status, stored as TEXT with a check constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "failed" => Ok(OrderStatus::Failed),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }

    #[test]
    fn test_product_type_parse() {
        assert_eq!("plan".parse::<ProductType>().unwrap(), ProductType::Plan);
        assert_eq!("coaching".parse::<ProductType>().unwrap(), ProductType::Coaching);
        assert!("Plan".parse::<ProductType>().is_err());
        assert!("membership".parse::<ProductType>().is_err());
    }

    #[test]
    fn test_order_status_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&OrderStatus::Completed).unwrap(), "\"completed\"");
        let status: OrderStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(status, OrderStatus::Failed);
        assert_eq!(OrderStatus::Pending.to_string(), "pending");
    }
}
