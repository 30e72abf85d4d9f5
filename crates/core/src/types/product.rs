//! Product records as served by the storefront API.
//!
//! Field names follow the API's JSON (`_id`, `imageUrls`, `createdAt`), so a
//! product fetched from the catalog can be stored in the cart and written to
//! persisted storage without any reshaping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Department a product is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Men,
    Women,
    Unisex,
}

impl Gender {
    /// All genders in display order.
    pub const ALL: [Self; 3] = [Self::Men, Self::Women, Self::Unisex];
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Men => write!(f, "MEN"),
            Self::Women => write!(f, "WOMEN"),
            Self::Unisex => write!(f, "UNISEX"),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MEN" => Ok(Self::Men),
            "WOMEN" => Ok(Self::Women),
            "UNISEX" => Ok(Self::Unisex),
            _ => Err(format!("invalid gender: {s}")),
        }
    }
}

/// Garment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Tshirt,
    Shirt,
    Short,
    Denim,
    Officewear,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 5] = [
        Self::Tshirt,
        Self::Shirt,
        Self::Short,
        Self::Denim,
        Self::Officewear,
    ];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Tshirt => "TSHIRT",
            Self::Shirt => "SHIRT",
            Self::Short => "SHORT",
            Self::Denim => "DENIM",
            Self::Officewear => "OFFICEWEAR",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("invalid category: {s}"))
    }
}

/// A product listed in the catalog.
///
/// The cart treats this as an opaque value: it only reads `id` for line
/// identity and `price` for totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stable catalog identifier.
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub gender: Gender,
    pub category: Category,
    /// Sizes the customer must pick from before adding to cart.
    #[serde(default)]
    pub sizes: Vec<String>,
    pub price: Price,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// First image, used as the cart thumbnail.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }

    /// Whether the product must be added with a size selection.
    #[must_use]
    pub fn has_sizes(&self) -> bool {
        !self.sizes.is_empty()
    }

    /// Whether `size` is one of the offered sizes.
    #[must_use]
    pub fn offers_size(&self, size: &str) -> bool {
        self.sizes.iter().any(|s| s == size)
    }
}
