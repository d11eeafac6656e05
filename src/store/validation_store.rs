use super::{
    cache_set::{CacheElement, CacheSet, ElementKind, SharedSet},
    snapshot::Snapshot,
    state::InitializationState,
    ValidationStoreBuilder,
};
use crate::common::concurrent::EpochCell;

use std::{collections::HashSet, fmt, sync::Arc, time::SystemTime};

/// A thread-safe store of named reference sets, queried during validation.
///
/// Each cache key (e.g. `"SupplierIds"`) maps to one immutable [`CacheSet`] of
/// currently valid values. The whole key-to-set mapping is a snapshot that is
/// replaced atomically on every mutation, so readers never take a lock, never
/// copy, and never observe a partially updated set. Writers derive a new snapshot
/// from the current one and install it with a compare-and-exchange; sets that
/// did not change are shared between snapshots.
///
/// Missing keys and element type mismatches are never errors. Every query
/// degrades to `false`, `None` or `0` instead.
///
/// To share the same store across threads, clone it. This is a cheap operation
/// and all clones see the same state.
///
/// # Examples
///
/// ```rust
/// use refcache::ValidationStore;
///
/// let store = ValidationStore::new();
/// store.set_cache("SupplierIds", vec![1, 2, 3, 4, 5]);
///
/// // A record referencing supplier 999 fails an existence check...
/// assert!(!store.contains("SupplierIds", &999));
/// // ...while supplier 3 passes.
/// assert!(store.contains("SupplierIds", &3));
///
/// // Asking for the wrong element type is the same as asking for a missing key.
/// assert!(store.get_cache::<String>("SupplierIds").is_none());
///
/// store.mark_initialized(Some("startup"));
/// assert!(store.state().is_initialized());
/// ```
#[derive(Clone)]
pub struct ValidationStore {
    inner: Arc<Inner>,
}

struct Inner {
    name: Option<String>,
    initial_capacity: usize,
    snapshot: EpochCell<Snapshot>,
    state: EpochCell<InitializationState>,
}

impl Default for ValidationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = self.cache_keys();
        keys.sort_unstable();

        f.debug_struct("ValidationStore")
            .field("name", &self.inner.name)
            .field("keys", &keys)
            .field("state", &self.state())
            .finish()
    }
}

impl ValidationStore {
    /// Constructs a new, empty `ValidationStore`.
    ///
    /// To configure the store, use [`builder`](#method.builder).
    pub fn new() -> Self {
        Self::with_everything(None, None)
    }

    /// Returns a [`ValidationStoreBuilder`][builder-struct], which can build a
    /// `ValidationStore` with a name and an initial capacity.
    ///
    /// [builder-struct]: ./struct.ValidationStoreBuilder.html
    pub fn builder() -> ValidationStoreBuilder {
        ValidationStoreBuilder::new()
    }

    pub(crate) fn with_everything(name: Option<String>, initial_capacity: Option<usize>) -> Self {
        let initial_capacity = initial_capacity.unwrap_or_default();
        Self {
            inner: Arc::new(Inner {
                name,
                initial_capacity,
                snapshot: EpochCell::new(Snapshot::with_capacity(initial_capacity)),
                state: EpochCell::new(InitializationState::default()),
            }),
        }
    }

    /// Returns the name of this store, if one was given to the builder.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    // ---------------------------------------------------------------------------
    // Writers

    /// Replaces the set stored under `key` with the distinct elements of
    /// `values`.
    ///
    /// Order and duplicates in `values` do not matter. An empty `values` still
    /// loads the key: `is_cache_loaded` returns `true` and every `contains`
    /// returns `false`.
    pub fn set_cache<T, I>(&self, key: &str, values: I)
    where
        T: CacheElement,
        I: IntoIterator<Item = T>,
    {
        self.publish(key, CacheSet::from_values(values));
    }

    pub(crate) fn publish(&self, key: &str, set: CacheSet) {
        #[cfg(feature = "logging")]
        let (kind, len) = (set.kind(), set.len());

        self.inner
            .snapshot
            .update(|snapshot| Some(snapshot.with_set(key, set.clone())));

        #[cfg(feature = "logging")]
        log::debug!(
            "{}Published {len} {kind} value(s) under cache key '{key}'",
            self.inner.log_prefix()
        );
    }

    /// Adds `value` to the set stored under `key`.
    ///
    /// The current set is copied, extended and published as a new set. If `key`
    /// is not loaded, or holds elements of another type, it is replaced by a set
    /// containing only `value`.
    pub fn add_to_cache<T: CacheElement>(&self, key: &str, value: T) {
        self.inner.snapshot.update(|snapshot| {
            let mut values = match snapshot.get(key).and_then(T::typed_set) {
                Some(current) if current.contains(&value) => return None,
                Some(current) => HashSet::clone(current),
                None => HashSet::with_capacity(1),
            };
            values.insert(value.clone());
            Some(snapshot.with_set(key, T::into_cache_set(values)))
        });
    }

    /// Removes `value` from the set stored under `key`.
    ///
    /// Does nothing if `key` is not loaded, holds elements of another type, or
    /// does not contain `value`.
    pub fn remove_from_cache<T: CacheElement>(&self, key: &str, value: &T) {
        self.inner.snapshot.update(|snapshot| {
            let current = snapshot.get(key).and_then(T::typed_set)?;
            if !current.contains(value) {
                return None;
            }
            let mut values = HashSet::clone(current);
            values.remove(value);
            Some(snapshot.with_set(key, T::into_cache_set(values)))
        });
    }

    /// Removes `key` and its set. Calling this on a key that is not loaded is a
    /// no-op.
    pub fn clear_cache(&self, key: &str) {
        let removed = self
            .inner
            .snapshot
            .update(|snapshot| snapshot.without_key(key));

        if removed {
            #[cfg(feature = "logging")]
            log::debug!("{}Cleared cache key '{key}'", self.inner.log_prefix());
        }
    }

    /// Removes every key.
    pub fn clear_all_caches(&self) {
        self.inner
            .snapshot
            .replace(Snapshot::with_capacity(self.inner.initial_capacity));

        #[cfg(feature = "logging")]
        log::debug!("{}Cleared all cache keys", self.inner.log_prefix());
    }

    // ---------------------------------------------------------------------------
    // Readers

    /// Returns the set stored under `key` if its elements are of type `T`.
    ///
    /// Returns `None` if `key` is not loaded or holds elements of another type.
    /// The returned set is not affected by later writes to the store.
    pub fn get_cache<T: CacheElement>(&self, key: &str) -> Option<SharedSet<T>> {
        self.inner
            .snapshot
            .read(|snapshot| snapshot.get(key).and_then(T::typed_set).cloned())
    }

    /// Returns `true` if the set stored under `key` holds elements of type `T`
    /// and contains `value`.
    pub fn contains<T: CacheElement>(&self, key: &str, value: &T) -> bool {
        self.inner.snapshot.read(|snapshot| {
            snapshot
                .get(key)
                .map_or(false, |set| set.contains(value))
        })
    }

    /// Returns `true` if the set stored under `key` is a text set containing
    /// `value`.
    pub fn contains_str(&self, key: &str, value: &str) -> bool {
        self.inner.snapshot.read(|snapshot| {
            snapshot
                .get(key)
                .map_or(false, |set| set.contains_str(value))
        })
    }

    /// Returns `true` if `key` has been loaded and not cleared since.
    pub fn is_cache_loaded(&self, key: &str) -> bool {
        self.inner
            .snapshot
            .read(|snapshot| snapshot.contains_key(key))
    }

    /// Returns the number of elements in the set stored under `key`, or `0` if
    /// `key` is not loaded.
    pub fn cache_count(&self, key: &str) -> usize {
        self.inner
            .snapshot
            .read(|snapshot| snapshot.get(key).map_or(0, CacheSet::len))
    }

    /// Returns the element type of the set stored under `key`.
    pub fn element_kind(&self, key: &str) -> Option<ElementKind> {
        self.inner
            .snapshot
            .read(|snapshot| snapshot.get(key).map(CacheSet::kind))
    }

    /// Returns the keys loaded at the time of the call, in no particular order.
    ///
    /// Intended for diagnostics: concurrent writers may have changed the key set
    /// by the time the caller looks at the result.
    pub fn cache_keys(&self) -> Vec<String> {
        self.inner
            .snapshot
            .read(|snapshot| snapshot.keys().map(ToString::to_string).collect())
    }

    /// Returns the number of loaded keys.
    pub fn len(&self) -> usize {
        self.inner.snapshot.read(Snapshot::len)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.snapshot.read(Snapshot::is_empty)
    }

    // ---------------------------------------------------------------------------
    // Initialization state

    /// Returns a copy of the current initialization state.
    pub fn state(&self) -> InitializationState {
        self.inner.state.load_cloned()
    }

    /// Records a completed reload cycle triggered by `source` (e.g. `"startup"`
    /// or `"refresher"`) at the current time.
    pub fn mark_initialized(&self, source: Option<&str>) {
        self.inner
            .state
            .replace(InitializationState::initialized(source, SystemTime::now()));

        #[cfg(feature = "logging")]
        log::info!(
            "{}Reference data initialized (source: {})",
            self.inner.log_prefix(),
            source.unwrap_or("unknown")
        );
    }

    /// Resets the initialization state to "never loaded".
    pub fn reset_initialization(&self) {
        self.inner.state.replace(InitializationState::default());
    }

    /// Sets only the `is_initialized` flag, keeping the other fields.
    pub fn update_is_initialized(&self, is_initialized: bool) {
        self.inner
            .state
            .update(|state| Some(state.with_is_initialized(is_initialized)));
    }

    /// Sets only the last reload source, keeping the other fields.
    pub fn update_last_reload_source(&self, source: Option<&str>) {
        self.inner
            .state
            .update(|state| Some(state.with_last_reload_source(source)));
    }

    /// Sets only the last reload time, keeping the other fields.
    pub fn update_last_reload_time(&self, time: SystemTime) {
        self.inner
            .state
            .update(|state| Some(state.with_last_reload_time(time)));
    }

    #[cfg(feature = "logging")]
    pub(crate) fn log_prefix(&self) -> String {
        self.inner.log_prefix()
    }
}

impl Inner {
    #[cfg(feature = "logging")]
    fn log_prefix(&self) -> String {
        crate::common::log_prefix(self.name.as_deref())
    }
}
