use crate::{
    common::error::{BoxError, LoadError, ReloadError},
    store::{CacheElement, CacheSet},
    ValidationStore,
};

use std::{fmt, time::Duration};

type LoadFn = Box<dyn Fn() -> Result<CacheSet, BoxError> + Send + Sync + 'static>;

struct Source {
    key: String,
    fetch: LoadFn,
}

/// The outcome of a successful reload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    loaded: Vec<(String, usize)>,
    elapsed: Duration,
}

impl LoadReport {
    /// Returns the loaded cache keys with the number of distinct values each set
    /// received, in registration order.
    pub fn loaded(&self) -> &[(String, usize)] {
        &self.loaded
    }

    /// Returns the total number of values loaded.
    pub fn total_values(&self) -> usize {
        self.loaded.iter().map(|(_, count)| count).sum()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Loads reference sets from their authoritative sources into a
/// [`ValidationStore`][store-struct].
///
/// A source is a closure registered per cache key that returns every currently
/// valid value, typically by querying a database (e.g. "select all supplier
/// IDs"). The loader does not know or care how the values are produced.
///
/// [store-struct]: ../struct.ValidationStore.html
///
/// # Examples
///
/// ```rust
/// use refcache::{loader::CacheLoader, ValidationStore};
///
/// let store = ValidationStore::new();
/// let mut loader = CacheLoader::new(&store);
/// loader
///     .register("SupplierIds", || Ok(vec![1, 2, 3, 4, 5]))
///     .register("Categories", || Ok(vec!["Electronics".to_string()]));
///
/// let report = loader.reload_all("startup").unwrap();
/// assert_eq!(report.total_values(), 6);
///
/// assert!(store.contains("SupplierIds", &3));
/// assert_eq!(store.state().last_reload_source(), Some("startup"));
/// ```
pub struct CacheLoader {
    store: ValidationStore,
    sources: Vec<Source>,
}

impl fmt::Debug for CacheLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheLoader")
            .field("store", &self.store)
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CacheLoader {
    pub fn new(store: &ValidationStore) -> Self {
        Self {
            store: store.clone(),
            sources: Vec::new(),
        }
    }

    /// Registers the source of the set under `key`. Registering a key twice
    /// replaces the earlier source.
    pub fn register<T, F>(&mut self, key: &str, fetch: F) -> &mut Self
    where
        T: CacheElement,
        F: Fn() -> Result<Vec<T>, BoxError> + Send + Sync + 'static,
    {
        let fetch: LoadFn = Box::new(move || fetch().map(CacheSet::from_values));

        match self.sources.iter_mut().find(|s| s.key == key) {
            Some(existing) => existing.fetch = fetch,
            None => self.sources.push(Source {
                key: key.to_string(),
                fetch,
            }),
        }
        self
    }

    pub fn store(&self) -> &ValidationStore {
        &self.store
    }

    /// Returns the registered cache keys, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.key.as_str())
    }

    /// Fetches and publishes the set under `key`. Returns the number of distinct
    /// values loaded.
    ///
    /// On failure the set previously published under `key` (if any) is kept.
    pub fn load(&self, key: &str) -> Result<usize, LoadError> {
        let source = self
            .sources
            .iter()
            .find(|s| s.key == key)
            .ok_or_else(|| LoadError::UnknownKey(key.to_string()))?;
        self.load_source(source)
    }

    fn load_source(&self, source: &Source) -> Result<usize, LoadError> {
        let set = (source.fetch)().map_err(|e| LoadError::Source {
            key: source.key.clone(),
            source: e,
        })?;
        let count = set.len();
        self.store.publish(&source.key, set);
        Ok(count)
    }

    /// Loads every registered source and, if all of them succeed, marks the
    /// store initialized with `source` as the reload source.
    ///
    /// A failing source does not stop the others from loading. Its key keeps
    /// whatever set it had before.
    pub fn reload_all(&self, source: &str) -> Result<LoadReport, ReloadError> {
        let started = quanta::Instant::now();
        let mut report = LoadReport::default();
        let mut failures = Vec::new();

        for s in &self.sources {
            match self.load_source(s) {
                Ok(count) => report.loaded.push((s.key.clone(), count)),
                Err(e) => {
                    #[cfg(feature = "logging")]
                    log::warn!("{}{e}: {}", self.store.log_prefix(), error_chain(&e));
                    failures.push(e);
                }
            }
        }
        report.elapsed = quanta::Instant::now().duration_since(started);

        if !failures.is_empty() {
            return Err(ReloadError::new(failures, self.sources.len(), report));
        }

        self.store.mark_initialized(Some(source));

        #[cfg(feature = "logging")]
        log::info!(
            "{}Reloaded {} reference set(s) with {} value(s) in {:?} (source: {source})",
            self.store.log_prefix(),
            report.loaded.len(),
            report.total_values(),
            report.elapsed
        );

        Ok(report)
    }

    /// Removes every set from the store, including sets this loader did not
    /// register.
    pub fn clear_all_caches(&self) {
        self.store.clear_all_caches();
    }
}

#[cfg(feature = "logging")]
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut causes = Vec::new();
    let mut current = e.source();
    while let Some(cause) = current {
        causes.push(cause.to_string());
        current = cause.source();
    }
    causes.join(": ")
}

#[cfg(test)]
mod tests {
    use super::CacheLoader;
    use crate::{common::error::LoadError, ValidationStore};

    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    #[test]
    fn load_one_key() {
        let store = ValidationStore::new();
        let mut loader = CacheLoader::new(&store);
        loader.register("SupplierIds", || Ok(vec![1, 2, 2, 3]));

        assert_eq!(loader.load("SupplierIds").unwrap(), 3);
        assert!(store.contains("SupplierIds", &2));
        // Loading a single key does not mark the store initialized.
        assert!(!store.state().is_initialized());
    }

    #[test]
    fn load_unknown_key() {
        let store = ValidationStore::new();
        let loader = CacheLoader::new(&store);

        match loader.load("Nope") {
            Err(e @ LoadError::UnknownKey(_)) => assert_eq!(e.key(), "Nope"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn register_replaces_source() {
        let store = ValidationStore::new();
        let mut loader = CacheLoader::new(&store);
        loader
            .register("SupplierIds", || Ok(vec![1]))
            .register("SupplierIds", || Ok(vec![7, 8]));

        assert_eq!(loader.keys().collect::<Vec<_>>(), vec!["SupplierIds"]);
        assert_eq!(loader.load("SupplierIds").unwrap(), 2);
        assert!(store.contains("SupplierIds", &7));
        assert!(!store.contains("SupplierIds", &1));
    }

    #[test]
    fn reload_all_marks_initialized() {
        let store = ValidationStore::new();
        let mut loader = CacheLoader::new(&store);
        loader
            .register("SupplierIds", || Ok(vec![1, 2, 3]))
            .register("ProductCodes", || Ok(vec!["P001".to_string()]));

        let report = loader.reload_all("startup").unwrap();
        assert_eq!(
            report.loaded(),
            [("SupplierIds".to_string(), 3), ("ProductCodes".to_string(), 1)]
        );
        assert_eq!(report.total_values(), 4);

        let state = store.state();
        assert!(state.is_initialized());
        assert_eq!(state.last_reload_source(), Some("startup"));
    }

    #[test]
    fn failing_source_keeps_previous_set() {
        let store = ValidationStore::new();
        let fail = Arc::new(AtomicBool::new(false));

        let mut loader = CacheLoader::new(&store);
        let fail_clone = Arc::clone(&fail);
        loader
            .register("SupplierIds", move || {
                if fail_clone.load(Ordering::Acquire) {
                    Err("connection refused".into())
                } else {
                    Ok(vec![1, 2, 3])
                }
            })
            .register("Categories", || Ok(vec!["Furniture".to_string()]));

        loader.reload_all("startup").unwrap();
        store.reset_initialization();

        fail.store(true, Ordering::Release);
        let err = loader.reload_all("background-job").unwrap_err();

        assert_eq!(err.attempted(), 2);
        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].key(), "SupplierIds");
        assert_eq!(err.report().loaded().len(), 1);
        assert_eq!(err.to_string(), "1 of 2 reference set(s) failed to load");

        // The old set is still there, and the store was not marked initialized.
        assert_eq!(store.cache_count("SupplierIds"), 3);
        assert!(!store.state().is_initialized());
    }

    #[test]
    fn clear_all_caches() {
        let store = ValidationStore::new();
        let mut loader = CacheLoader::new(&store);
        loader.register("SupplierIds", || Ok(vec![1]));
        loader.reload_all("startup").unwrap();

        loader.clear_all_caches();
        assert!(!store.is_cache_loaded("SupplierIds"));
    }
}
