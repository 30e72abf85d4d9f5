//! REST client for the storefront API.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP via `reqwest`
//! - The API is the source of truth for products and orders; the only
//!   client-held state is the cart
//! - Product pages are cached in memory via `moka` (5 minute TTL)
//!
//! # Endpoints
//!
//! - `GET  product?page=&limit=` - paginated catalog
//! - `POST orders/create` - create an order from cart lines
//! - `GET  orders/{id}` - fetch a single order
//!
//! # Example
//!
//! ```rust,ignore
//! use wardrobe_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let page = client.get_products(1, 12).await?;
//! ```

mod client;

pub use client::ApiClient;

use thiserror::Error;

/// Errors that can occur when talking to the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint path could not be joined to the base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl ApiError {
    /// Whether retrying the same request later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status >= 500,
            Self::RateLimited(_) => true,
            Self::Parse(_) | Self::Url(_) | Self::NotFound(_) => false,
        }
    }
}

/// Keep at most `limit` characters of a response body for logs and errors.
fn truncate_body(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("order ord-1".to_string());
        assert_eq!(err.to_string(), "Not found: order ord-1");

        let err = ApiError::Status {
            status: 400,
            body: "Insufficient stock".to_string(),
        };
        assert_eq!(err.to_string(), "API returned 400: Insufficient stock");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ApiError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
        assert!(err.is_transient());
    }

    #[test]
    fn test_transient_classification() {
        let server = ApiError::Status {
            status: 503,
            body: String::new(),
        };
        let client = ApiError::Status {
            status: 422,
            body: String::new(),
        };
        assert!(server.is_transient());
        assert!(!client.is_transient());
        assert!(!ApiError::NotFound("x".to_string()).is_transient());
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("héllo world", 5), "héllo");
        assert_eq!(truncate_body("ok", 500), "ok");
    }
}
