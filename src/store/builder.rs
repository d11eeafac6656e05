use super::ValidationStore;

/// Builds a [`ValidationStore`][store-struct] with various configuration knobs.
///
/// [store-struct]: ./struct.ValidationStore.html
///
/// # Examples
///
/// ```rust
/// use refcache::ValidationStore;
///
/// let store = ValidationStore::builder()
///     // Prefix log messages with "[reference-data] ".
///     .name("reference-data")
///     // Expect about 8 reference sets.
///     .initial_capacity(8)
///     .build();
///
/// store.set_cache("SupplierIds", vec![1, 2, 3]);
/// assert!(store.contains("SupplierIds", &2));
/// assert_eq!(store.name(), Some("reference-data"));
/// ```
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct ValidationStoreBuilder {
    name: Option<String>,
    initial_capacity: Option<usize>,
}

impl ValidationStoreBuilder {
    /// Construct a new `ValidationStoreBuilder` with no name and the default
    /// initial capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name of the store. The name is used as a prefix of the log
    /// messages the store and its loaders emit.
    pub fn name(self, name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..self
        }
    }

    /// Sets the number of cache keys the store should be able to hold without
    /// reallocating its key map.
    pub fn initial_capacity(self, number_of_keys: usize) -> Self {
        Self {
            initial_capacity: Some(number_of_keys),
            ..self
        }
    }

    /// Builds a `ValidationStore`.
    pub fn build(self) -> ValidationStore {
        ValidationStore::with_everything(self.name, self.initial_capacity)
    }
}
