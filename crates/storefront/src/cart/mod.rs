//! Shopping cart state and persistence.
//!
//! [`CartStore`] owns the cart for the session. Every consumer (catalog
//! add-to-cart, cart drawer, checkout, header badge) reads and mutates the
//! cart through it, which is what keeps line identity and quantity rules
//! intact.
//!
//! # Persistence
//!
//! The store mirrors its state into a [`CartStorage`] slot as a JSON array
//! of lines. Write-back is gated on hydration:
//!
//! 1. `CartStore::new` starts empty and un-hydrated.
//! 2. Mutations before [`CartStore::hydrate`] apply in memory and are queued.
//! 3. `hydrate` restores the stored snapshot (or starts empty if the slot is
//!    missing or malformed), replays the queued mutations on top, and only
//!    then writes back.
//! 4. Afterwards every mutation writes the full state back.
//!
//! Storage failures never surface to callers; in-memory state stays
//! authoritative and the failure is logged.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut cart = CartStore::open(FileStorage::open(".wardrobe")?, DEFAULT_CART_KEY);
//! cart.add_item(product, 2, Some(Variant::new("M")));
//! println!("{} items, Rs. {}", cart.total_item_count(), cart.total_price());
//! ```

mod state;
pub mod storage;
pub mod view;

pub use state::{CartLine, CartOp, CartState, LineKey, Variant};
pub use storage::{CartStorage, DEFAULT_CART_KEY, FileStorage, MemoryStorage, StorageError};
pub use view::{CartItemView, CartView};

use tracing::{debug, instrument, warn};

use wardrobe_core::{Price, Product, ProductId};

/// Callback invoked with the committed state after a change.
type Listener = Box<dyn Fn(&CartState) + Send>;

/// Handle returned by [`CartStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What [`CartStore::hydrate`] found in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// A snapshot with this many lines was restored.
    Restored(usize),
    /// The slot was empty.
    Missing,
    /// The slot could not be read or parsed and was ignored.
    Discarded,
    /// The store had already hydrated; nothing was read.
    AlreadyHydrated,
}

/// The session's authoritative cart.
pub struct CartStore {
    state: CartState,
    storage: Box<dyn CartStorage>,
    key: String,
    hydrated: bool,
    pending: Vec<CartOp>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("hydrated", &self.hydrated)
            .field("lines", &self.state.len())
            .field("pending", &self.pending.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create an empty, un-hydrated store over `storage`.
    ///
    /// Nothing is written to storage until [`hydrate`](Self::hydrate) runs.
    pub fn new(storage: impl CartStorage + 'static, key: impl Into<String>) -> Self {
        Self {
            state: CartState::new(),
            storage: Box::new(storage),
            key: key.into(),
            hydrated: false,
            pending: Vec::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Create a store and hydrate it immediately.
    pub fn open(storage: impl CartStorage + 'static, key: impl Into<String>) -> Self {
        let mut store = Self::new(storage, key);
        store.hydrate();
        store
    }

    /// Load the persisted snapshot and enable write-back.
    ///
    /// Runs once; later calls return [`Hydration::AlreadyHydrated`].
    /// Mutations made before this call are replayed onto the restored
    /// snapshot and the merged state is written back.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn hydrate(&mut self) -> Hydration {
        if self.hydrated {
            return Hydration::AlreadyHydrated;
        }

        let (mut state, outcome) = self.read_snapshot();

        let pending = std::mem::take(&mut self.pending);
        for op in &pending {
            state.apply(op);
        }
        self.state = state;
        self.hydrated = true;

        debug!(
            ?outcome,
            replayed = pending.len(),
            lines = self.state.len(),
            "Cart hydrated"
        );

        if !pending.is_empty() {
            self.write_back();
        }
        self.notify();
        outcome
    }

    fn read_snapshot(&self) -> (CartState, Hydration) {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return (CartState::new(), Hydration::Missing),
            Err(e) => {
                warn!(error = %e, "Failed to read cart snapshot, starting empty");
                return (CartState::new(), Hydration::Discarded);
            }
        };

        match serde_json::from_str::<CartState>(&raw) {
            Ok(state) => {
                let lines = state.len();
                (state, Hydration::Restored(lines))
            }
            Err(e) => {
                warn!(
                    error = %e,
                    snapshot = %raw.chars().take(200).collect::<String>(),
                    "Discarding malformed cart snapshot"
                );
                (CartState::new(), Hydration::Discarded)
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` of a product-variant.
    ///
    /// Merges into an existing line with the same identity (quantities add,
    /// position is kept); otherwise appends a new line. A quantity of 0 is
    /// treated as 1.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_item(&mut self, product: Product, quantity: u32, variant: Option<Variant>) {
        self.commit(CartOp::Add {
            product: Box::new(product),
            quantity,
            variant,
        });
    }

    /// Remove the line for this product-variant. Missing lines are ignored.
    #[instrument(skip(self))]
    pub fn remove_item(&mut self, product_id: &ProductId, variant: Option<&Variant>) {
        self.commit(CartOp::Remove(LineKey::new(product_id, variant)));
    }

    /// Set a line's quantity to `max(1, quantity)`. Missing lines are ignored.
    #[instrument(skip(self))]
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
        variant: Option<&Variant>,
    ) {
        self.commit(CartOp::SetQuantity {
            key: LineKey::new(product_id, variant),
            quantity,
        });
    }

    /// Remove every line.
    #[instrument(skip(self))]
    pub fn clear(&mut self) {
        self.commit(CartOp::Clear);
    }

    fn commit(&mut self, op: CartOp) {
        let changed = self.state.apply(&op);

        if self.hydrated {
            self.write_back();
        } else {
            debug!("Cart not hydrated yet, deferring write-back");
            self.pending.push(op);
        }

        if changed {
            self.notify();
        }
    }

    fn write_back(&mut self) {
        let json = match serde_json::to_string(&self.state) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize cart");
                return;
            }
        };

        if let Err(e) = self.storage.set(&self.key, &json) {
            warn!(
                error = %e,
                key = %self.key,
                "Failed to persist cart, keeping in-memory state"
            );
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        self.state.lines()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Line for a product-variant, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId, variant: Option<&Variant>) -> Option<&CartLine> {
        self.state.find(&LineKey::new(product_id, variant))
    }

    /// Sum of quantities (the header badge).
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.state.total_item_count()
    }

    /// Sum of price times quantity (the drawer and checkout summary).
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.state.total_price()
    }

    /// Whether hydration has run.
    #[must_use]
    pub const fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Storage key of the snapshot.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Register a callback run after hydration and after every mutation that
    /// changes the cart.
    pub fn subscribe(&mut self, listener: impl Fn(&CartState) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.state);
        }
    }
}
