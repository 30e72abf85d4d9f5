//! Checkout: turn the cart into an order and clear it once the order exists.
//!
//! The order service is reached through the [`OrderPlacement`] trait so the
//! flow can run against the real API client or a test double. The cart is
//! only cleared after the service confirms the order; on any failure it is
//! left exactly as it was.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use wardrobe_core::{Order, ProductId};

use crate::api::ApiError;
use crate::cart::CartState;
use crate::state::SharedCart;

/// Errors that stop an order from being placed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("Cart is empty")]
    EmptyCart,

    /// A required shipping field was left blank.
    #[error("Missing shipping field: {0}")]
    MissingField(&'static str),

    /// The shipping email is not a plausible address.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// The order service rejected or failed the request.
    #[error("Failed to place order: {0}")]
    Api(#[from] ApiError),
}

/// Where the order should be delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingInfo {
    /// Check that every field is filled and the email looks like one.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingField` for the first blank field, or
    /// `CheckoutError::InvalidEmail` if the email has no local part or
    /// domain.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let fields = [
            ("name", &self.name),
            ("email", &self.email),
            ("address", &self.address),
            ("city", &self.city),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(CheckoutError::MissingField(name));
            }
        }

        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => Ok(()),
            _ => Err(CheckoutError::InvalidEmail(email.to_owned())),
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Pay on delivery.
    #[default]
    #[serde(rename = "cod")]
    CashOnDelivery,
    /// Credit or debit card.
    #[serde(rename = "card")]
    Card,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CashOnDelivery => write!(f, "cod"),
            Self::Card => write!(f, "card"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(Self::CashOnDelivery),
            "card" => Ok(Self::Card),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Customer input collected on the checkout page.
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    pub shipping: ShippingInfo,
    pub payment: PaymentMethod,
}

/// One ordered product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_size: Option<String>,
}

/// Body of the create-order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub items: Vec<OrderLineInput>,
}

impl From<&CartState> for OrderPayload {
    fn from(state: &CartState) -> Self {
        Self {
            items: state
                .lines()
                .iter()
                .map(|line| OrderLineInput {
                    product_id: line.product().id.clone(),
                    quantity: line.quantity(),
                    selected_size: line.variant().map(ToString::to_string),
                })
                .collect(),
        }
    }
}

/// What the order service sent back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderReceipt {
    /// The created order, when the service returns it.
    pub order: Option<Order>,
    /// Any message the service attached.
    pub message: Option<String>,
}

/// The order service.
pub trait OrderPlacement {
    /// Create an order for `payload`.
    fn create_order(
        &self,
        payload: &OrderPayload,
    ) -> impl Future<Output = Result<OrderReceipt, ApiError>> + Send;
}

/// Place an order for everything in the cart.
///
/// The payload is taken from the cart as it is when this is called. The
/// cart is cleared only after `orders` reports success.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` if there is nothing to order, a
/// validation error for bad shipping input, or `CheckoutError::Api` if the
/// order service fails. The cart is unchanged in every error case.
#[instrument(skip_all, fields(payment = %request.payment))]
pub async fn place_order<O: OrderPlacement + Sync>(
    cart: &SharedCart,
    orders: &O,
    request: &CheckoutRequest,
) -> Result<OrderReceipt, CheckoutError> {
    let payload = cart.with(|store| OrderPayload::from(store.state()));
    if payload.items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    request.shipping.validate()?;

    let receipt = match orders.create_order(&payload).await {
        Ok(receipt) => receipt,
        Err(e) => {
            warn!(error = %e, lines = payload.items.len(), "Order placement failed");
            return Err(e.into());
        }
    };

    cart.with(crate::cart::CartStore::clear);
    info!(
        lines = payload.items.len(),
        order_id = receipt.order.as_ref().map(|o| o.id.to_string()),
        "Order placed, cart cleared"
    );
    Ok(receipt)
}
