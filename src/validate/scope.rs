use super::{ItemErrors, Validate};
use crate::{store::CacheElement, ValidationStore};

/// Loads one or more reference sets for a batch validation and clears them again
/// when the scope is dropped.
///
/// # Examples
///
/// ```rust
/// use refcache::{
///     models::CreateProductRequest,
///     validate::{ValidationScope, CATEGORIES, PRODUCT_CODES, SUPPLIER_IDS},
///     ValidationStore,
/// };
///
/// let store = ValidationStore::new();
/// let products = vec![
///     CreateProductRequest::new("P100", "Standing Desk", "Furniture", 3),
///     CreateProductRequest::new("P001", "Gaming Mouse", "Peripherals", 999),
/// ];
///
/// {
///     let mut scope = ValidationScope::new(&store);
///     scope
///         .load_cache(SUPPLIER_IDS, vec![1, 2, 3, 4, 5])
///         .load_cache(CATEGORIES, vec!["Furniture".to_string(), "Peripherals".to_string()])
///         .load_cache(PRODUCT_CODES, vec!["P001".to_string()]);
///
///     let failures = scope.validate_list(&products);
///     assert_eq!(failures.len(), 1);
///     assert_eq!(failures[0].index, 1);
///     // Duplicate product code and unknown supplier.
///     assert_eq!(failures[0].errors.len(), 2);
/// }
///
/// // The scope cleared what it loaded.
/// assert!(!store.is_cache_loaded(SUPPLIER_IDS));
/// ```
#[derive(Debug)]
pub struct ValidationScope {
    store: ValidationStore,
    loaded_keys: Vec<String>,
    auto_clear: bool,
}

impl ValidationScope {
    /// Creates a scope on `store` that clears the keys it loads when dropped.
    pub fn new(store: &ValidationStore) -> Self {
        Self {
            store: store.clone(),
            loaded_keys: Vec::new(),
            auto_clear: true,
        }
    }

    /// Sets whether the keys loaded through this scope are cleared on drop.
    /// Default: `true`.
    #[must_use]
    pub fn auto_clear(mut self, enabled: bool) -> Self {
        self.auto_clear = enabled;
        self
    }

    /// Publishes `values` under `key` and remembers the key. Can be chained to
    /// load several sets.
    pub fn load_cache<T, I>(&mut self, key: &str, values: I) -> &mut Self
    where
        T: CacheElement,
        I: IntoIterator<Item = T>,
    {
        self.store.set_cache(key, values);
        if !self.loaded_keys.iter().any(|k| k == key) {
            self.loaded_keys.push(key.to_string());
        }
        self
    }

    pub fn store(&self) -> &ValidationStore {
        &self.store
    }

    /// Returns the keys loaded through this scope, in loading order.
    pub fn loaded_keys(&self) -> &[String] {
        &self.loaded_keys
    }

    /// Validates every item and returns the failures of the invalid ones, in
    /// list order.
    pub fn validate_list<'a, T: Validate>(&self, items: &'a [T]) -> Vec<ItemErrors<'a, T>> {
        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let errors = item.validate(&self.store);
                if errors.is_empty() {
                    None
                } else {
                    Some(ItemErrors {
                        index,
                        item,
                        errors,
                    })
                }
            })
            .collect()
    }
}

impl Drop for ValidationScope {
    fn drop(&mut self) {
        if self.auto_clear {
            for key in &self.loaded_keys {
                self.store.clear_cache(key);
            }
        }
    }
}
