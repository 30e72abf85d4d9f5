//! Application state shared across consumers.

use std::sync::{Arc, Mutex, PoisonError};

use crate::api::ApiClient;
use crate::cart::{CartStorage, CartStore, CartView};
use crate::config::StorefrontConfig;

/// Shared handle to the session's cart store.
///
/// Every consumer holds a clone of the same handle; mutations are applied
/// one at a time under the lock, so concurrent callers always see the last
/// committed state.
#[derive(Clone)]
pub struct SharedCart {
    inner: Arc<Mutex<CartStore>>,
}

impl SharedCart {
    /// Wrap a store.
    #[must_use]
    pub fn new(store: CartStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Run `f` with exclusive access to the store.
    ///
    /// Keep `f` short and never hold the store across an `.await`.
    pub fn with<R>(&self, f: impl FnOnce(&mut CartStore) -> R) -> R {
        let mut store = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut store)
    }

    /// Current view for the drawer and header.
    #[must_use]
    pub fn view(&self) -> CartView {
        self.with(|store| CartView::from(store.state()))
    }
}

impl std::fmt::Debug for SharedCart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with(|store| f.debug_tuple("SharedCart").field(&*store).finish())
    }
}

/// Application state handed to each consumer.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the API client, configuration and the cart.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    cart: SharedCart,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Opens (and hydrates) the cart over `storage` using the configured key.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(
        config: StorefrontConfig,
        storage: impl CartStorage + 'static,
    ) -> Result<Self, reqwest::Error> {
        let api = ApiClient::new(&config.api)?;
        let cart = SharedCart::new(CartStore::open(storage, config.cart_key.clone()));

        Ok(Self {
            inner: Arc::new(AppStateInner { config, api, cart }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the REST API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get the shared cart.
    #[must_use]
    pub fn cart(&self) -> &SharedCart {
        &self.inner.cart
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::*;
    use crate::cart::MemoryStorage;
    use crate::config::ApiConfig;

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            api: ApiConfig {
                base_url: Url::parse("http://localhost:5000/api/").unwrap(),
                token: None,
                timeout: Duration::from_secs(5),
            },
            data_dir: ".wardrobe".into(),
            cart_key: "cart".to_string(),
            sentry_dsn: None,
        }
    }

    #[test]
    fn test_state_hydrates_cart_from_storage() {
        let storage = MemoryStorage::with_slot("cart", "[]");
        let state = AppState::new(config(), storage).unwrap();
        assert!(state.cart().with(|store| store.is_hydrated()));
        assert!(state.cart().view().is_empty());
    }

    #[test]
    fn test_clones_share_one_cart() {
        let state = AppState::new(config(), MemoryStorage::new()).unwrap();
        let header = state.clone();
        state.cart().with(|store| {
            store.update_quantity(&"missing".into(), 3, None);
        });
        assert_eq!(header.cart().with(|store| store.key().to_owned()), "cart");
        assert!(std::ptr::eq(state.cart(), header.cart()));
    }
}
