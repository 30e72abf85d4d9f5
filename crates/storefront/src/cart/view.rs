//! Display data for the cart drawer, checkout summary and header badge.

use serde::Serialize;

use wardrobe_core::CurrencyCode;

use super::state::{CartLine, CartState};

/// One cart line, formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItemView {
    pub product_id: String,
    pub title: String,
    pub variant: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: Option<String>,
}

/// Cart summary, formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
}

impl CartView {
    /// An empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_state(&CartState::new(), CurrencyCode::default())
    }

    /// Build the view from the current cart state.
    #[must_use]
    pub fn from_state(state: &CartState, currency: CurrencyCode) -> Self {
        Self {
            items: state
                .lines()
                .iter()
                .map(|line| CartItemView::from_line(line, currency))
                .collect(),
            subtotal: state.total_price().display(currency),
            item_count: state.total_item_count(),
        }
    }

    /// Header badge text; `None` hides the badge.
    #[must_use]
    pub fn badge(&self) -> Option<String> {
        (self.item_count > 0).then(|| self.item_count.to_string())
    }

    /// Whether there is anything to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&CartState> for CartView {
    fn from(state: &CartState) -> Self {
        Self::from_state(state, CurrencyCode::default())
    }
}

impl CartItemView {
    fn from_line(line: &CartLine, currency: CurrencyCode) -> Self {
        let product = line.product();
        Self {
            product_id: product.id.to_string(),
            title: product.title.clone(),
            variant: line.variant().map(ToString::to_string),
            quantity: line.quantity(),
            price: product.price.display(currency),
            line_price: line.line_price().display(currency),
            image: product.primary_image().map(String::from),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use wardrobe_core::{Category, Gender, Price, Product, ProductId};

    use super::*;
    use crate::cart::{CartOp, Variant};

    fn product(id: &str, price: u64, images: &[&str]) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Tee {id}"),
            description: None,
            gender: Gender::Women,
            category: Category::Tshirt,
            sizes: vec![],
            price: Price::from_units(price),
            stock: 1,
            image_urls: images.iter().map(|s| (*s).to_string()).collect(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_view() {
        let view = CartView::empty();
        assert!(view.is_empty());
        assert_eq!(view.subtotal, "Rs. 0");
        assert_eq!(view.item_count, 0);
        assert!(view.badge().is_none());
    }

    #[test]
    fn test_view_from_state() {
        let mut state = CartState::new();
        state.apply(&CartOp::Add {
            product: Box::new(product("p1", 100, &["a.jpg", "b.jpg"])),
            quantity: 2,
            variant: Some(Variant::new("M")),
        });
        state.apply(&CartOp::Add {
            product: Box::new(product("p2", 50, &[])),
            quantity: 1,
            variant: None,
        });

        let view = CartView::from(&state);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, "Rs. 250");
        assert_eq!(view.badge().as_deref(), Some("3"));

        let first = &view.items[0];
        assert_eq!(first.product_id, "p1");
        assert_eq!(first.variant.as_deref(), Some("M"));
        assert_eq!(first.price, "Rs. 100");
        assert_eq!(first.line_price, "Rs. 200");
        assert_eq!(first.image.as_deref(), Some("a.jpg"));

        assert!(view.items[1].image.is_none());
        assert!(view.items[1].variant.is_none());
    }

    #[test]
    fn test_other_currency_symbol() {
        let mut state = CartState::new();
        state.apply(&CartOp::Add {
            product: Box::new(product("p1", 12, &[])),
            quantity: 1,
            variant: None,
        });
        let view = CartView::from_state(&state, CurrencyCode::USD);
        assert_eq!(view.subtotal, "$ 12");
    }
}
