//! Cart line items, line identity and the pure state transitions.
//!
//! Everything here is plain data: [`CartState::apply`] takes a [`CartOp`]
//! and mutates the line sequence in place. Persistence, hydration and
//! change notification live in [`super::CartStore`].

use serde::{Deserialize, Serialize};

use wardrobe_core::{Price, Product, ProductId};

/// A variant selection (e.g., a size label) that is part of line identity.
///
/// A line without a variant uses `None`, which never compares equal to any
/// `Variant`, including the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variant(String);

impl Variant {
    /// Create a variant from a label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Get the label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Variant {
    fn from(label: &str) -> Self {
        Self(label.to_owned())
    }
}

impl From<String> for Variant {
    fn from(label: String) -> Self {
        Self(label)
    }
}

/// Identity of a cart line: product plus optional variant.
///
/// Compared field by field, so `("ab", "cd")` and `("abc", "d")` are
/// different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: ProductId,
    pub variant: Option<Variant>,
}

impl LineKey {
    /// Build a key from borrowed parts.
    #[must_use]
    pub fn new(product_id: &ProductId, variant: Option<&Variant>) -> Self {
        Self {
            product_id: product_id.clone(),
            variant: variant.cloned(),
        }
    }

    /// Whether `line` has exactly this identity.
    #[must_use]
    pub fn matches(&self, line: &CartLine) -> bool {
        line.product.id == self.product_id && line.variant == self.variant
    }
}

/// One product-variant combination in the cart and its quantity.
///
/// The serialized shape (`product`, `quantity`, `selectedSize`) is the
/// persisted snapshot format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    product: Product,
    quantity: u32,
    #[serde(
        rename = "selectedSize",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    variant: Option<Variant>,
}

impl CartLine {
    fn new(product: Product, quantity: u32, variant: Option<Variant>) -> Self {
        Self {
            product,
            quantity: quantity.max(1),
            variant,
        }
    }

    /// Product as it was when first added.
    #[must_use]
    pub const fn product(&self) -> &Product {
        &self.product
    }

    /// Quantity, always at least 1.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Variant selection, if any.
    #[must_use]
    pub const fn variant(&self) -> Option<&Variant> {
        self.variant.as_ref()
    }

    /// Identity key of this line.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(&self.product.id, self.variant.as_ref())
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_price(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// A single cart mutation.
///
/// Mutations made before the store has hydrated are queued in this form
/// and replayed onto the restored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOp {
    /// Add `quantity` of a product-variant, merging into an existing line.
    Add {
        product: Box<Product>,
        quantity: u32,
        variant: Option<Variant>,
    },
    /// Remove the line with this key.
    Remove(LineKey),
    /// Set a line's quantity, clamped to at least 1.
    SetQuantity { key: LineKey, quantity: i64 },
    /// Remove every line.
    Clear,
}

/// Ordered sequence of cart lines with unique identity keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CartState {
    lines: Vec<CartLine>,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Find the line with the given identity.
    #[must_use]
    pub fn find(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| key.matches(line))
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of unit price times quantity over all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.lines.iter().map(CartLine::line_price).sum()
    }

    /// Apply a mutation. Returns `true` if the lines changed.
    pub fn apply(&mut self, op: &CartOp) -> bool {
        match op {
            CartOp::Add {
                product,
                quantity,
                variant,
            } => {
                let key = LineKey::new(&product.id, variant.as_ref());
                let quantity = (*quantity).max(1);
                if let Some(line) = self.lines.iter_mut().find(|line| key.matches(line)) {
                    line.quantity = line.quantity.saturating_add(quantity);
                } else {
                    self.lines.push(CartLine::new(
                        (**product).clone(),
                        quantity,
                        variant.clone(),
                    ));
                }
                true
            }
            CartOp::Remove(key) => {
                let before = self.lines.len();
                self.lines.retain(|line| !key.matches(line));
                self.lines.len() != before
            }
            CartOp::SetQuantity { key, quantity } => {
                let clamped = u32::try_from((*quantity).max(1)).unwrap_or(u32::MAX);
                match self.lines.iter_mut().find(|line| key.matches(line)) {
                    Some(line) if line.quantity != clamped => {
                        line.quantity = clamped;
                        true
                    }
                    _ => false,
                }
            }
            CartOp::Clear => {
                let changed = !self.lines.is_empty();
                self.lines.clear();
                changed
            }
        }
    }

    /// Rebuild a state from raw lines, restoring the invariants.
    ///
    /// Quantities below 1 are raised to 1 and lines sharing a key are merged
    /// into the first occurrence.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut state = Self::new();
        for line in lines {
            state.apply(&CartOp::Add {
                product: Box::new(line.product),
                quantity: line.quantity,
                variant: line.variant,
            });
        }
        state
    }
}

impl<'de> Deserialize<'de> for CartState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Vec::<CartLine>::deserialize(deserializer).map(Self::from_lines)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use wardrobe_core::{Category, Gender};

    use super::*;

    fn product(id: &str, price: u64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            description: None,
            gender: Gender::Unisex,
            category: Category::Tshirt,
            sizes: vec![],
            price: Price::from_units(price),
            stock: 10,
            image_urls: vec![],
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn add(product: &Product, quantity: u32, variant: Option<&str>) -> CartOp {
        CartOp::Add {
            product: Box::new(product.clone()),
            quantity,
            variant: variant.map(Variant::from),
        }
    }

    #[test]
    fn test_key_does_not_collide_on_concatenation() {
        let mut state = CartState::new();
        state.apply(&add(&product("ab", 1), 1, Some("cd")));
        state.apply(&add(&product("abc", 1), 1, Some("d")));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_empty_variant_is_distinct_from_none() {
        let shirt = product("p1", 10);
        let mut state = CartState::new();
        state.apply(&add(&shirt, 1, None));
        state.apply(&add(&shirt, 1, Some("")));
        assert_eq!(state.len(), 2);
        assert!(state.find(&LineKey::new(&shirt.id, None)).is_some());
        assert!(
            state
                .find(&LineKey::new(&shirt.id, Some(&Variant::new(""))))
                .is_some()
        );
    }

    #[test]
    fn test_add_zero_quantity_normalizes_to_one() {
        let mut state = CartState::new();
        state.apply(&add(&product("p1", 10), 0, None));
        assert_eq!(state.lines()[0].quantity(), 1);
    }

    #[test]
    fn test_merge_saturates() {
        let shirt = product("p1", 10);
        let mut state = CartState::new();
        state.apply(&add(&shirt, u32::MAX, None));
        state.apply(&add(&shirt, 5, None));
        assert_eq!(state.lines()[0].quantity(), u32::MAX);
    }

    #[test]
    fn test_totals_saturate_at_saturated_quantities() {
        let mut state = CartState::new();
        for id in ["p1", "p2"] {
            let item = product(id, u64::MAX);
            state.apply(&add(&item, 1, None));
            state.apply(&CartOp::SetQuantity {
                key: LineKey::new(&item.id, None),
                quantity: i64::MAX,
            });
        }

        assert_eq!(state.total_item_count(), u64::from(u32::MAX) * 2);
        let total = state.total_price();
        assert!(total > state.lines()[0].line_price());
        assert_eq!(total + Price::from_units(1), total);
    }

    #[test]
    fn test_set_quantity_reports_change() {
        let shirt = product("p1", 10);
        let key = LineKey::new(&shirt.id, None);
        let mut state = CartState::new();
        state.apply(&add(&shirt, 2, None));

        assert!(!state.apply(&CartOp::SetQuantity {
            key: key.clone(),
            quantity: 2
        }));
        assert!(state.apply(&CartOp::SetQuantity {
            key: key.clone(),
            quantity: i64::MAX
        }));
        assert_eq!(state.find(&key).unwrap().quantity(), u32::MAX);
    }

    #[test]
    fn test_snapshot_format() {
        let shirt = product("p1", 100);
        let mut state = CartState::new();
        state.apply(&add(&shirt, 2, Some("M")));
        state.apply(&add(&shirt, 1, None));

        let value = serde_json::to_value(&state).unwrap();
        let lines = value.as_array().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["quantity"], 2);
        assert_eq!(lines[0]["selectedSize"], "M");
        assert_eq!(lines[0]["product"]["_id"], "p1");
        assert!(lines[1].get("selectedSize").is_none());
    }

    #[test]
    fn test_deserialize_repairs_invariants() {
        let shirt = product("p1", 100);
        let line = serde_json::json!({ "product": shirt, "quantity": 0, "selectedSize": "M" });
        let dup = serde_json::json!({ "product": shirt, "quantity": 3, "selectedSize": "M" });
        let raw = serde_json::Value::Array(vec![line, dup]);

        let state: CartState = serde_json::from_value(raw).unwrap();
        assert_eq!(state.len(), 1);
        assert_eq!(state.lines()[0].quantity(), 4);
    }
}
