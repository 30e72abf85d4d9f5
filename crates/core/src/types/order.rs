//! Order records returned by the order service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{OrderId, UserId};
use super::price::Price;
use super::status::OrderStatus;

/// A single product line on a placed order, priced at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub price: Price,
    pub quantity: u32,
}

/// The customer an order belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub email: String,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<OrderUser>,
    #[serde(default)]
    pub products: Vec<OrderItem>,
    pub total_amount: Price,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_order() {
        let json = r#"{
            "_id": "ord-42",
            "user": { "_id": "u-1", "email": "asha@example.com" },
            "products": [
                { "_id": "p-1", "title": "Linen Shirt", "price": 1299, "quantity": 2 }
            ],
            "totalAmount": 2598,
            "status": "PENDING",
            "createdAt": "2025-02-01T10:00:00Z"
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.id.as_str(), "ord-42");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, Price::from_units(2598));
        assert_eq!(order.products.len(), 1);
        assert_eq!(order.user.unwrap().email, "asha@example.com");
    }

    #[test]
    fn test_status_defaults_to_pending() {
        let json = r#"{ "_id": "ord-1", "totalAmount": 0, "createdAt": "2025-02-01T10:00:00Z" }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.products.is_empty());
    }
}
