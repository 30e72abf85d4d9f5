//! Catalog browsing: product pages, client-side filtering and the
//! "add to cart" action with its size guard.
//!
//! The API only paginates; search, filters and sorting run locally over the
//! fetched products, then the result is paged again for display.

use std::cmp::Ordering;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use wardrobe_core::{Category, Gender, Price, Product, ProductId};

use crate::api::{ApiClient, ApiError};
use crate::cart::{CartStore, Variant};

/// Products shown per catalog page.
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Page size used when scanning the whole catalog.
const SCAN_PAGE_LIMIT: u32 = 100;

/// Errors from catalog actions.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The product comes in sizes and none was picked.
    #[error("Please select a size")]
    SizeRequired,

    /// The picked size is not one the product offers.
    #[error("Size {0} is not available for this product")]
    UnknownSize(String),

    /// Fetching the catalog failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// One page of products as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub data: Vec<Product>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub page: u32,
}

// =============================================================================
// Query
// =============================================================================

/// Catalog ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// API order.
    #[default]
    Default,
    PriceLow,
    PriceHigh,
    NameAsc,
    NameDesc,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::PriceLow => write!(f, "price_low"),
            Self::PriceHigh => write!(f, "price_high"),
            Self::NameAsc => write!(f, "name_asc"),
            Self::NameDesc => write!(f, "name_desc"),
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "price_low" => Ok(Self::PriceLow),
            "price_high" => Ok(Self::PriceHigh),
            "name_asc" => Ok(Self::NameAsc),
            "name_desc" => Ok(Self::NameDesc),
            _ => Err(format!("invalid sort order: {s}")),
        }
    }
}

/// Filters and ordering chosen on the products page.
///
/// `None` means "all" for every filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    pub gender: Option<Gender>,
    pub category: Option<Category>,
    /// Inclusive lower price bound.
    pub min_price: Option<Price>,
    /// Inclusive upper price bound.
    pub max_price: Option<Price>,
    pub sort: SortOrder,
}

impl ProductQuery {
    /// Whether `product` passes every filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let title_matches = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .is_none_or(|needle| product.title.to_lowercase().contains(&needle.to_lowercase()));

        title_matches
            && self.gender.is_none_or(|g| product.gender == g)
            && self.category.is_none_or(|c| product.category == c)
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
    }

    /// Filter then sort. Sorting is stable, so ties keep API order.
    #[must_use]
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        let mut products: Vec<Product> = products.into_iter().filter(|p| self.matches(p)).collect();

        match self.sort {
            SortOrder::Default => {}
            SortOrder::PriceLow => products.sort_by(|a, b| a.price.cmp(&b.price)),
            SortOrder::PriceHigh => products.sort_by(|a, b| b.price.cmp(&a.price)),
            SortOrder::NameAsc => products.sort_by(|a, b| compare_titles(&a.title, &b.title)),
            SortOrder::NameDesc => products.sort_by(|a, b| compare_titles(&b.title, &a.title)),
        }

        products
    }
}

/// Case-insensitive title order, falling back to exact order on ties.
fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Items on 1-based `page`. Out-of-range pages are empty.
#[must_use]
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    if page == 0 || per_page == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(per_page);
    let end = start.saturating_add(per_page).min(items.len());
    items.get(start..end).unwrap_or(&[])
}

/// Number of pages needed for `total` items.
#[must_use]
pub const fn page_count(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

// =============================================================================
// Actions
// =============================================================================

/// Add `product` to the cart from the product detail view.
///
/// Products that list sizes need one of them; products without sizes are
/// added with no variant and any `size` is ignored.
///
/// # Errors
///
/// Returns `CatalogError::SizeRequired` if the product has sizes and `size`
/// is blank, or `CatalogError::UnknownSize` if it is not offered.
pub fn add_to_cart(
    store: &mut CartStore,
    product: Product,
    quantity: u32,
    size: Option<&str>,
) -> Result<(), CatalogError> {
    let variant = if product.has_sizes() {
        let size = size
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(CatalogError::SizeRequired)?;
        if !product.offers_size(size) {
            return Err(CatalogError::UnknownSize(size.to_owned()));
        }
        Some(Variant::new(size))
    } else {
        None
    };

    store.add_item(product, quantity, variant);
    Ok(())
}

/// Find a product by id, walking the catalog page by page.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if no page holds the product, or the first
/// request error.
#[instrument(skip(api), fields(product_id = %id))]
pub async fn find_product(api: &ApiClient, id: &ProductId) -> Result<Product, ApiError> {
    scan_pages(id, move |page| api.get_products(page, SCAN_PAGE_LIMIT)).await
}

/// Fetch pages from 1 until one holds `id` or `totalPages` is reached.
async fn scan_pages<F, Fut>(id: &ProductId, mut fetch: F) -> Result<Product, ApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<ProductPage, ApiError>>,
{
    let mut page = 1;
    loop {
        let result = fetch(page).await?;
        if let Some(product) = result.data.into_iter().find(|p| &p.id == id) {
            return Ok(product);
        }
        if page >= result.total_pages {
            debug!(pages = page, "Product not in catalog");
            return Err(ApiError::NotFound(format!("product {id}")));
        }
        page += 1;
    }
}
