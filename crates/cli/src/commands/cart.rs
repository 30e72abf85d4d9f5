//! Cart commands.
//!
//! The cart is hydrated from `WARDROBE_DATA_DIR` when the state is built,
//! and every change is written straight back.

use std::path::Path;

use tracing::info;

use wardrobe_core::{Product, ProductId};
use wardrobe_storefront::cart::{CartView, Variant};
use wardrobe_storefront::catalog;
use wardrobe_storefront::error::{AppError, Result, add_breadcrumb};
use wardrobe_storefront::state::AppState;

/// Print the cart.
///
/// # Errors
///
/// Returns an error if the view cannot be encoded as JSON.
#[allow(clippy::print_stdout)]
pub fn show(state: &AppState, json: bool) -> Result<()> {
    let view = state.cart().view();

    if json {
        let out =
            serde_json::to_string_pretty(&view).map_err(|e| AppError::Internal(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    print_view(&view);
    Ok(())
}

/// Add a product, looked up in the catalog or read from `product_file`.
///
/// # Errors
///
/// Returns an error if the product cannot be found or read, or if the size
/// selection is rejected.
pub async fn add(
    state: &AppState,
    product_id: &ProductId,
    quantity: u32,
    size: Option<&str>,
    product_file: Option<&Path>,
) -> Result<()> {
    let product = match product_file {
        Some(path) => read_product(path, product_id).await?,
        None => catalog::find_product(state.api(), product_id).await?,
    };

    state
        .cart()
        .with(|store| catalog::add_to_cart(store, product, quantity, size))?;

    add_breadcrumb(
        "cart",
        "Added item",
        Some(&[("product_id", product_id.as_str()), ("size", size.unwrap_or(""))]),
    );
    info!(product_id = %product_id, quantity, "Added to cart");
    print_badge(&state.cart().view());
    Ok(())
}

/// Remove one line.
pub fn remove(state: &AppState, product_id: &ProductId, size: Option<&str>) {
    let variant = size.map(Variant::new);
    state
        .cart()
        .with(|store| store.remove_item(product_id, variant.as_ref()));

    add_breadcrumb("cart", "Removed item", Some(&[("product_id", product_id.as_str())]));
    print_badge(&state.cart().view());
}

/// Set the quantity of one line.
pub fn set(state: &AppState, product_id: &ProductId, quantity: i64, size: Option<&str>) {
    let variant = size.map(Variant::new);
    state
        .cart()
        .with(|store| store.update_quantity(product_id, quantity, variant.as_ref()));

    print_badge(&state.cart().view());
}

/// Empty the cart.
pub fn clear(state: &AppState) {
    state.cart().with(wardrobe_storefront::cart::CartStore::clear);
    add_breadcrumb("cart", "Cleared cart", None);
    print_badge(&state.cart().view());
}

async fn read_product(path: &Path, expected: &ProductId) -> Result<Product> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::BadRequest(format!("cannot read {}: {e}", path.display()))
    })?;
    let product: Product = serde_json::from_str(&content).map_err(|e| {
        AppError::BadRequest(format!("invalid product in {}: {e}", path.display()))
    })?;

    if &product.id != expected {
        return Err(AppError::BadRequest(format!(
            "product file holds {}, not {expected}",
            product.id
        )));
    }
    Ok(product)
}

#[allow(clippy::print_stdout)]
fn print_view(view: &CartView) {
    if view.is_empty() {
        println!("Your cart is empty");
        return;
    }

    for item in &view.items {
        let title = match &item.variant {
            Some(size) => format!("{} ({size})", item.title),
            None => item.title.clone(),
        };
        println!(
            "{:<26} {:<40} {:>4} x {:>12} = {:>12}",
            item.product_id, title, item.quantity, item.price, item.line_price
        );
    }
    println!("Subtotal: {} ({} items)", view.subtotal, view.item_count);
}

#[allow(clippy::print_stdout)]
fn print_badge(view: &CartView) {
    match view.badge() {
        Some(count) => println!("Cart: {count} items, {}", view.subtotal),
        None => println!("Cart is empty"),
    }
}
