//! Wardrobe storefront library.
//!
//! The client side of the storefront: a persisted shopping cart, catalog
//! browsing and checkout against the storefront REST API. The `wardrobe`
//! CLI is a thin shell over this crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod state;
