//! Integration tests for Wardrobe.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p wardrobe-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - File-backed cart: round trips, hydration ordering,
//!   snapshot compatibility
//! - `catalog_cart` - Catalog filtering and the add-to-cart size guard
//! - `checkout_flow` - Order placement against a recording order service
//!
//! The tests need no network or database; the order service is replaced by
//! [`RecordingOrders`] and storage lives in a temporary directory.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

use wardrobe_core::{Category, Gender, Price, Product, ProductId};
use wardrobe_storefront::api::ApiError;
use wardrobe_storefront::checkout::{OrderPayload, OrderPlacement, OrderReceipt};

/// A plain product with no sizes.
#[must_use]
pub fn product(id: &str, title: &str, price: u64) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        description: None,
        gender: Gender::Unisex,
        category: Category::Tshirt,
        sizes: Vec::new(),
        price: Price::from_units(price),
        stock: 10,
        image_urls: vec![format!("https://cdn.example.com/{id}.jpg")],
        created_at: DateTime::<Utc>::UNIX_EPOCH,
    }
}

/// A product that must be added with one of `sizes`.
#[must_use]
pub fn sized_product(id: &str, title: &str, price: u64, sizes: &[&str]) -> Product {
    Product {
        sizes: sizes.iter().map(|s| (*s).to_string()).collect(),
        category: Category::Shirt,
        ..product(id, title, price)
    }
}

/// Order service double that records every payload it receives.
#[derive(Debug, Default)]
pub struct RecordingOrders {
    reject_with: Option<u16>,
    received: Mutex<Vec<OrderPayload>>,
}

impl RecordingOrders {
    /// A service that accepts every order.
    #[must_use]
    pub fn accepting() -> Self {
        Self::default()
    }

    /// A service that answers every order with `status`.
    #[must_use]
    pub fn rejecting(status: u16) -> Self {
        Self {
            reject_with: Some(status),
            ..Self::default()
        }
    }

    /// Payloads received so far.
    #[must_use]
    pub fn received(&self) -> Vec<OrderPayload> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OrderPlacement for RecordingOrders {
    fn create_order(
        &self,
        payload: &OrderPayload,
    ) -> impl Future<Output = Result<OrderReceipt, ApiError>> + Send {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload.clone());

        let result = match self.reject_with {
            Some(status) => Err(ApiError::Status {
                status,
                body: "Insufficient stock".to_string(),
            }),
            None => Ok(OrderReceipt {
                order: None,
                message: Some("Order created".to_string()),
            }),
        };
        async move { result }
    }
}
