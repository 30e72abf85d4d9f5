//! Checkout command.

use wardrobe_core::CurrencyCode;
use wardrobe_storefront::checkout::{CheckoutRequest, place_order};
use wardrobe_storefront::error::{Result, add_breadcrumb};
use wardrobe_storefront::state::AppState;

/// Place an order for the cart and print the confirmation.
///
/// # Errors
///
/// Returns an error if the cart is empty, shipping details are invalid, or
/// the order service fails. The cart is kept in every error case.
#[allow(clippy::print_stdout)]
pub async fn place(state: &AppState, request: &CheckoutRequest) -> Result<()> {
    let summary = state.cart().view();
    let payment = request.payment.to_string();
    add_breadcrumb("checkout", "Placing order", Some(&[("payment", payment.as_str())]));

    let receipt = place_order(state.cart(), state.api(), request).await?;

    match &receipt.order {
        Some(order) => println!(
            "Order {} placed ({}), total {}",
            order.id,
            order.status,
            order.total_amount.display(CurrencyCode::default())
        ),
        None => println!("Order placed, total {}", summary.subtotal),
    }
    if let Some(message) = &receipt.message {
        println!("{message}");
    }
    Ok(())
}
