//! Wardrobe CLI - browse the catalog, manage the cart and check out.
//!
//! # Usage
//!
//! ```bash
//! # List products, filtered and sorted
//! wardrobe products list --category shirt --sort price_low
//!
//! # Add two of a product in size M
//! wardrobe cart add 65f1c0 -q 2 -s M
//!
//! # Show the cart
//! wardrobe cart show
//!
//! # Place the order
//! wardrobe checkout --name "Asha Rao" --email asha@example.com \
//!     --address "12 MG Road" --city Pune --postal-code 411001 --country India
//! ```
//!
//! # Commands
//!
//! - `products list` - Browse the catalog
//! - `cart show|add|remove|set|clear` - Manage the persisted cart
//! - `checkout` - Place an order for the cart
//!
//! The cart is persisted under `WARDROBE_DATA_DIR` between invocations.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wardrobe_core::{Category, Gender, Price};
use wardrobe_storefront::api::ApiError;
use wardrobe_storefront::cart::FileStorage;
use wardrobe_storefront::catalog::SortOrder;
use wardrobe_storefront::checkout::PaymentMethod;
use wardrobe_storefront::config::StorefrontConfig;
use wardrobe_storefront::error::Result;
use wardrobe_storefront::state::AppState;

mod commands;

#[derive(Parser)]
#[command(name = "wardrobe")]
#[command(author, version, about = "Wardrobe storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for everything in the cart
    Checkout {
        /// Full name of the recipient
        #[arg(long)]
        name: String,

        /// Contact email address
        #[arg(long)]
        email: String,

        /// Street address
        #[arg(long)]
        address: String,

        #[arg(long)]
        city: String,

        #[arg(long)]
        postal_code: String,

        #[arg(long)]
        country: String,

        /// Payment method (`cod`, `card`)
        #[arg(short, long, default_value = "cod")]
        payment: PaymentMethod,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List catalog products
    List {
        /// Page to show (12 products per page)
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Only titles containing this text
        #[arg(long)]
        search: Option<String>,

        /// Gender (`men`, `women`, `unisex`)
        #[arg(long)]
        gender: Option<Gender>,

        /// Category (`tshirt`, `shirt`, `short`, `denim`, `officewear`)
        #[arg(long)]
        category: Option<Category>,

        #[arg(long, value_parser = parse_price)]
        min_price: Option<Price>,

        #[arg(long, value_parser = parse_price)]
        max_price: Option<Price>,

        /// Sort order (`default`, `price_low`, `price_high`, `name_asc`, `name_desc`)
        #[arg(long, default_value = "default")]
        sort: SortOrder,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart contents and subtotal
    Show {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add a product to the cart
    Add {
        /// Catalog product ID
        product_id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Size, required for products that come in sizes
        #[arg(short, long)]
        size: Option<String>,

        /// Read the product from a JSON file instead of the catalog
        #[arg(long)]
        product_file: Option<PathBuf>,
    },
    /// Remove a line from the cart
    Remove {
        product_id: String,

        #[arg(short, long)]
        size: Option<String>,
    },
    /// Set the quantity of a line (values below 1 become 1)
    Set {
        product_id: String,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,

        #[arg(short, long)]
        size: Option<String>,
    },
    /// Empty the cart
    Clear,
}

/// Parse a non-negative decimal price.
fn parse_price(raw: &str) -> std::result::Result<Price, String> {
    let amount: Decimal = raw.trim().parse().map_err(|e| format!("{e}"))?;
    Price::new(amount).map_err(|e| e.to_string())
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration from environment (needed for Sentry init)
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output stays pipeable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wardrobe_storefront=warn,wardrobe=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let e = e.report();
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<()> {
    let storage = FileStorage::open(config.data_dir.clone())?;
    let state = AppState::new(config, storage).map_err(ApiError::from)?;

    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List {
                page,
                search,
                gender,
                category,
                min_price,
                max_price,
                sort,
                json,
            } => {
                let query = wardrobe_storefront::catalog::ProductQuery {
                    search,
                    gender,
                    category,
                    min_price,
                    max_price,
                    sort,
                };
                commands::products::list(&state, &query, page, json).await?;
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Show { json } => commands::cart::show(&state, json)?,
            CartAction::Add {
                product_id,
                quantity,
                size,
                product_file,
            } => {
                commands::cart::add(
                    &state,
                    &product_id.into(),
                    quantity,
                    size.as_deref(),
                    product_file.as_deref(),
                )
                .await?;
            }
            CartAction::Remove { product_id, size } => {
                commands::cart::remove(&state, &product_id.into(), size.as_deref());
            }
            CartAction::Set {
                product_id,
                quantity,
                size,
            } => commands::cart::set(&state, &product_id.into(), quantity, size.as_deref()),
            CartAction::Clear => commands::cart::clear(&state),
        },
        Commands::Checkout {
            name,
            email,
            address,
            city,
            postal_code,
            country,
            payment,
        } => {
            let request = wardrobe_storefront::checkout::CheckoutRequest {
                shipping: wardrobe_storefront::checkout::ShippingInfo {
                    name,
                    email,
                    address,
                    city,
                    postal_code,
                    country,
                },
                payment,
            };
            commands::checkout::place(&state, &request).await?;
        }
    }
    Ok(())
}
