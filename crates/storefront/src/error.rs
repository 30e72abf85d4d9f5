//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for everything a storefront command can
//! fail with. Unexpected failures are captured to Sentry via
//! [`AppError::report`] before being shown to the user.

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::StorageError;
use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Persistent storage could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Storefront API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Catalog action was rejected.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Checkout was rejected or failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this is a fault worth tracking rather than a user mistake.
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        match self {
            Self::Storage(_) | Self::Internal(_) => true,
            Self::Api(err)
            | Self::Catalog(CatalogError::Api(err))
            | Self::Checkout(CheckoutError::Api(err)) => !matches!(err, ApiError::NotFound(_)),
            Self::Config(_) | Self::Catalog(_) | Self::Checkout(_) | Self::BadRequest(_) => false,
        }
    }

    /// Capture unexpected errors to Sentry and log them.
    ///
    /// Returns `self` so it can be used inline before printing.
    #[must_use]
    pub fn report(self) -> Self {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Command error"
            );
        }
        self
    }

    /// Message safe to show the user.
    ///
    /// Don't expose response bodies or storage paths.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(_) | Self::Internal(_) => "Internal error".to_string(),
            Self::Api(err)
            | Self::Catalog(CatalogError::Api(err))
            | Self::Checkout(CheckoutError::Api(err)) => match err {
                ApiError::NotFound(what) => format!("Not found: {what}"),
                ApiError::RateLimited(secs) => {
                    format!("Too many requests, try again in {secs} seconds")
                }
                ApiError::Status { status, .. } if *status < 500 => {
                    "The store rejected the request".to_string()
                }
                _ => "The store is unavailable, please try again".to_string(),
            },
            _ => self.to_string(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "p1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
