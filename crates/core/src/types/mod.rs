//! Core types for the Wardrobe storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;

pub use id::*;
pub use order::{Order, OrderItem, OrderUser};
pub use price::{CurrencyCode, Price, PriceError};
pub use product::{Category, Gender, Product};
pub use status::*;
