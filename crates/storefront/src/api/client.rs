//! Storefront REST API client implementation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use wardrobe_core::Order;

use super::{ApiError, truncate_body};
use crate::catalog::ProductPage;
use crate::checkout::{OrderPayload, OrderPlacement, OrderReceipt};
use crate::config::ApiConfig;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheap to clone; clones share the connection pool and product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    products: Cache<(u32, u32), ProductPage>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.inner.token.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let products = Cache::builder()
            .max_capacity(100)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                token: config.token.clone(),
                products,
            }),
        })
    }

    /// Resolve an endpoint path against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.inner.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Send a request and decode a JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T, ApiError> {
        let text = self.send_raw(request, resource).await?;
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %truncate_body(&text, 500),
                    "Failed to parse API response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    /// Send a request and return the body text of a success response.
    async fn send_raw(&self, request: RequestBuilder, resource: &str) -> Result<String, ApiError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(resource.to_string()));
        }

        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate_body(&text, 500),
                "API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate_body(&text, 200),
            });
        }

        Ok(text)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get one page of the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn get_products(&self, page: u32, limit: u32) -> Result<ProductPage, ApiError> {
        let page = page.max(1);
        let limit = limit.max(1);

        if let Some(cached) = self.inner.products.get(&(page, limit)).await {
            debug!("Cache hit for product page");
            return Ok(cached);
        }

        let mut url = self.endpoint("product")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());

        let result: ProductPage = self
            .send(self.inner.client.get(url), "product page")
            .await?;

        self.inner
            .products
            .insert((page, limit), result.clone())
            .await;

        Ok(result)
    }

    /// Drop cached catalog pages (stock changes after an order).
    pub fn invalidate_products(&self) {
        self.inner.products.invalidate_all();
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Create an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the order or the request fails.
    #[instrument(skip(self, payload), fields(lines = payload.items.len()))]
    pub async fn create_order(&self, payload: &OrderPayload) -> Result<OrderReceipt, ApiError> {
        let url = self.endpoint("orders/create")?;
        let text = self
            .send_raw(self.inner.client.post(url).json(payload), "orders/create")
            .await?;

        self.invalidate_products();
        Ok(parse_receipt(&text))
    }
}

impl OrderPlacement for ApiClient {
    fn create_order(
        &self,
        payload: &OrderPayload,
    ) -> impl Future<Output = Result<OrderReceipt, ApiError>> + Send {
        Self::create_order(self, payload)
    }
}

// =============================================================================
// Response Shapes
// =============================================================================

/// An order either bare or wrapped under `order`/`data`.
#[derive(Deserialize)]
#[serde(untagged)]
enum OrderEnvelope {
    Wrapped { order: Order },
    Data { data: Order },
    Bare(Order),
}

impl OrderEnvelope {
    fn into_order(self) -> Order {
        match self {
            Self::Wrapped { order } | Self::Data { data: order } | Self::Bare(order) => order,
        }
    }
}

/// Create-order responses vary; keep whatever order and message they carry.
fn parse_receipt(text: &str) -> OrderReceipt {
    let value = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Create-order response carried no JSON body");
            return OrderReceipt::default();
        }
    };

    OrderReceipt {
        order: OrderEnvelope::deserialize(&value)
            .ok()
            .map(OrderEnvelope::into_order),
        message: value
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(String::from),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: Url::parse(base).unwrap(),
            token: Some(SecretString::from("tok_live_abc")),
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    const ORDER: &str = r#"{ "_id": "ord-7", "totalAmount": 250, "status": "PENDING", "createdAt": "2025-02-01T10:00:00Z" }"#;

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let client = client("http://localhost:5000/api/");
        assert_eq!(
            client.endpoint("orders/create").unwrap().as_str(),
            "http://localhost:5000/api/orders/create"
        );
        assert_eq!(
            client.endpoint("product").unwrap().as_str(),
            "http://localhost:5000/api/product"
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let debug_output = format!("{:?}", client("http://localhost:5000/api/"));
        assert!(debug_output.contains("authenticated: true"));
        assert!(!debug_output.contains("tok_live_abc"));
    }

    #[test]
    fn test_parse_receipt_shapes() {
        let bare = parse_receipt(ORDER);
        assert_eq!(bare.order.unwrap().id.as_str(), "ord-7");

        let wrapped = parse_receipt(&format!(
            r#"{{ "message": "Order created", "order": {ORDER} }}"#
        ));
        assert_eq!(wrapped.message.as_deref(), Some("Order created"));
        assert!(wrapped.order.is_some());

        let data = parse_receipt(&format!(r#"{{ "data": {ORDER} }}"#));
        assert!(data.order.is_some());

        let message_only = parse_receipt(r#"{ "message": "ok" }"#);
        assert!(message_only.order.is_none());
        assert_eq!(message_only.message.as_deref(), Some("ok"));

        assert_eq!(parse_receipt(""), OrderReceipt::default());
    }

    #[test]
    fn test_order_envelope() {
        let order: OrderEnvelope = serde_json::from_str(&format!(r#"{{ "order": {ORDER} }}"#)).unwrap();
        assert_eq!(order.into_order().total_amount.to_string(), "250");
    }
}
