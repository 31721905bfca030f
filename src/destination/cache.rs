//! Process-wide sequence token cache.

use crate::error::LogsError;
use crate::types::DestinationKey;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Unresolved,
    Resolved(Option<String>),
}

type SlotLock = Arc<AsyncMutex<Slot>>;

static GLOBAL: Lazy<TokenCache> = Lazy::new(TokenCache::new);

/// Maps each destination to its current sequence token.
///
/// A resolved entry holds `Some(token)`, or `None` for a stream that has
/// never been written to. Each destination has its own async lock, so work
/// on different destinations never contends. Clones share the same entries.
///
/// Resolved entries are kept for as long as the cache lives. Entries that
/// are unresolved and not in use are dropped by [`TokenCache::remove`] and
/// [`TokenCache::prune`].
#[derive(Clone, Default)]
pub struct TokenCache {
    slots: Arc<Mutex<HashMap<DestinationKey, SlotLock>>>,
}

impl TokenCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache shared by the whole process.
    pub fn global() -> TokenCache {
        GLOBAL.clone()
    }

    fn slot(&self, key: &DestinationKey) -> SlotLock {
        self.slots
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(Slot::Unresolved)))
            .clone()
    }

    /// Take exclusive use of a destination's token.
    ///
    /// Only one lease per destination exists at a time across all clones of
    /// this cache; other callers wait until it is dropped.
    pub async fn lease(&self, key: &DestinationKey) -> TokenLease {
        let guard = self.slot(key).lock_owned().await;
        TokenLease {
            key: key.clone(),
            guard,
            in_flight: false,
        }
    }

    /// Return the cached token, resolving it with `init` when absent.
    ///
    /// Concurrent callers for the same key run `init` at most once between
    /// them and all observe its result. A failed `init` caches nothing.
    pub async fn get_or_initialize<F, Fut>(
        &self,
        key: &DestinationKey,
        init: F,
    ) -> Result<Option<String>, LogsError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<String>, LogsError>>,
    {
        let mut lease = self.lease(key).await;
        lease.get_or_initialize(init).await
    }

    /// Cached token, or `None` when the destination is unresolved.
    pub async fn get(&self, key: &DestinationKey) -> Option<Option<String>> {
        self.lease(key).await.token().map(|t| t.map(str::to_string))
    }

    /// Replace the token unconditionally.
    pub async fn update(&self, key: &DestinationKey, token: Option<String>) {
        self.lease(key).await.set(token);
    }

    /// Evict a destination, forcing the next use to resolve it again.
    ///
    /// The entry itself is dropped unless another caller holds or awaits
    /// its lease.
    pub async fn remove(&self, key: &DestinationKey) {
        self.lease(key).await.invalidate();

        let mut slots = self.slots.lock();
        if slots.get(key).map_or(false, is_idle) {
            slots.remove(key);
        }
    }

    /// Drop every unresolved entry nobody is using. Returns how many went.
    pub fn prune(&self) -> usize {
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|_, slot| !is_idle(slot));
        before - slots.len()
    }

    /// Number of destinations tracked.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Whether no destination is tracked.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

// Leases and waiters hold a clone of the slot, and clones are only made
// under the map lock, so a count of one means nothing can be using it.
fn is_idle(slot: &SlotLock) -> bool {
    Arc::strong_count(slot) == 1 && matches!(slot.try_lock().as_deref(), Ok(Slot::Unresolved))
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("destinations", &self.len())
            .finish()
    }
}

/// Exclusive hold on one destination's token entry.
///
/// A lease dropped between [`TokenLease::begin_append`] and the following
/// [`TokenLease::set`] or [`TokenLease::invalidate`] evicts the entry, as
/// the append may have consumed the token.
pub struct TokenLease {
    key: DestinationKey,
    guard: OwnedMutexGuard<Slot>,
    in_flight: bool,
}

impl TokenLease {
    /// Destination this lease covers.
    pub fn key(&self) -> &DestinationKey {
        &self.key
    }

    /// Whether the token has been resolved.
    pub fn is_resolved(&self) -> bool {
        matches!(*self.guard, Slot::Resolved(_))
    }

    /// `Some(token)` when resolved.
    pub fn token(&self) -> Option<Option<&str>> {
        match &*self.guard {
            Slot::Unresolved => None,
            Slot::Resolved(token) => Some(token.as_deref()),
        }
    }

    /// Record the token to present on the next append.
    pub fn set(&mut self, token: Option<String>) {
        trace!(destination = %self.key, token = ?token, "Updating sequence token");
        self.in_flight = false;
        *self.guard = Slot::Resolved(token);
    }

    /// Mark the entry unresolved.
    pub fn invalidate(&mut self) {
        trace!(destination = %self.key, "Evicting sequence token");
        self.in_flight = false;
        *self.guard = Slot::Unresolved;
    }

    /// Note that an append using the current token is about to be sent.
    pub fn begin_append(&mut self) {
        self.in_flight = true;
    }

    /// Note that the append failed without consuming the token.
    pub fn abandon_append(&mut self) {
        self.in_flight = false;
    }

    /// Return the token, resolving it with `init` when absent.
    pub async fn get_or_initialize<F, Fut>(&mut self, init: F) -> Result<Option<String>, LogsError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<String>, LogsError>>,
    {
        if let Slot::Resolved(token) = &*self.guard {
            return Ok(token.clone());
        }
        let token = init().await?;
        self.set(token.clone());
        Ok(token)
    }
}

impl Drop for TokenLease {
    fn drop(&mut self) {
        if self.in_flight {
            trace!(destination = %self.key, "Append interrupted, evicting sequence token");
            *self.guard = Slot::Unresolved;
        }
    }
}

impl std::fmt::Debug for TokenLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenLease")
            .field("key", &self.key)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
