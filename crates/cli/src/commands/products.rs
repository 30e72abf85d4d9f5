//! Catalog listing.

use tracing::info;

use wardrobe_core::{CurrencyCode, Product};
use wardrobe_storefront::catalog::{DEFAULT_PAGE_SIZE, ProductQuery, page_count, paginate};
use wardrobe_storefront::error::{AppError, Result};
use wardrobe_storefront::state::AppState;

/// Products fetched in one request before filtering locally.
const CATALOG_FETCH_LIMIT: u32 = 200;

/// List one page of the filtered catalog.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched.
#[allow(clippy::print_stdout)]
pub async fn list(state: &AppState, query: &ProductQuery, page: usize, json: bool) -> Result<()> {
    let fetched = state.api().get_products(1, CATALOG_FETCH_LIMIT).await?;
    let products = query.apply(fetched.data);
    let pages = page_count(products.len(), DEFAULT_PAGE_SIZE);
    let shown = paginate(&products, page, DEFAULT_PAGE_SIZE);

    info!(
        matched = products.len(),
        page,
        pages,
        "Listing products"
    );

    if json {
        let out = serde_json::to_string_pretty(shown)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    if shown.is_empty() {
        println!("No products found");
        return Ok(());
    }

    for product in shown {
        println!("{}", format_row(product));
    }
    println!("Page {page} of {pages} ({} products)", products.len());
    Ok(())
}

fn format_row(product: &Product) -> String {
    let sizes = if product.has_sizes() {
        product.sizes.join("/")
    } else {
        "-".to_string()
    };
    format!(
        "{:<26} {:<32} {:>12}  {:<10} {:<8} {}",
        product.id.as_str(),
        product.title,
        product.price.display(CurrencyCode::default()),
        product.category.to_string(),
        product.gender.to_string(),
        sizes
    )
}
