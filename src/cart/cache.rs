//! Write-through cart cache with sticky ownership (spec.md §4.2).
//!
//! Grounded on `websocket/connection.rs`'s registry shape — one shared,
//! lock-guarded table keyed by an id — generalized from a connection
//! registry into a TTL-bounded object cache using the `cached` crate's
//! `TimedCache` (the same crate the teacher reserves for hot-reload config
//! endpoints in `gateway/cache.rs`), wrapped in a mutex since `TimedCache`
//! itself is not `Sync`.

use cached::{Cached, TimedCache};
use std::sync::Mutex;

use crate::core_ids::TerminalId;
use crate::error::CoreError;

use super::models::{Cart, CartId};

const CART_CACHE_TTL_SECS: u64 = 10 * 60 * 60;

pub struct CartCache {
    inner: Mutex<TimedCache<CartId, Cart>>,
}

impl CartCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TimedCache::with_lifespan(CART_CACHE_TTL_SECS)),
        }
    }

    pub fn get(&self, cart_id: &CartId) -> Option<Cart> {
        let mut cache = self.inner.lock().expect("cart cache mutex poisoned");
        cache.cache_get(cart_id).cloned()
    }

    pub fn put(&self, cart: Cart) {
        let mut cache = self.inner.lock().expect("cart cache mutex poisoned");
        cache.cache_set(cart.cart_id, cart);
    }

    pub fn remove(&self, cart_id: &CartId) {
        let mut cache = self.inner.lock().expect("cart cache mutex poisoned");
        cache.cache_remove(cart_id);
    }

    /// Enforces "a cart is owned by the terminal that created it;
    /// concurrent modifications from another origin fail with
    /// `OwnershipViolation`" (spec.md §4.2).
    pub fn check_ownership(cart: &Cart, caller_terminal: &TerminalId) -> Result<(), CoreError> {
        if &cart.terminal_id != caller_terminal {
            return Err(CoreError::Authorization(format!(
                "cart {} is owned by a different terminal",
                cart.cart_id
            )));
        }
        Ok(())
    }
}

impl Default for CartCache {
    fn default() -> Self {
        Self::new()
    }
}
