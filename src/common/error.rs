use crate::loader::LoadReport;

/// The boxed error type reference data sources report their failures with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type for loading one reference set through a
/// [`CacheLoader`][cache-loader].
///
/// [cache-loader]: ./loader/struct.CacheLoader.html
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    /// No source has been registered for the cache key.
    #[error("No reference source is registered for cache key '{0}'")]
    UnknownKey(String),

    /// The source failed to produce the reference values. The previously loaded
    /// set (if any) stays in the store.
    #[error("Failed to fetch the reference values for cache key '{key}'")]
    Source {
        key: String,
        #[source]
        source: BoxError,
    },
}

impl LoadError {
    /// Returns the cache key this error is about.
    pub fn key(&self) -> &str {
        match self {
            Self::UnknownKey(key) | Self::Source { key, .. } => key,
        }
    }
}

/// The error type for [`CacheLoader::reload_all`][reload-all]. Returned when at
/// least one registered source failed.
///
/// The sets that did load were published anyway; they are listed in
/// [`report`](#method.report).
///
/// [reload-all]: ./loader/struct.CacheLoader.html#method.reload_all
#[derive(thiserror::Error, Debug)]
#[error("{} of {attempted} reference set(s) failed to load", .failures.len())]
pub struct ReloadError {
    failures: Vec<LoadError>,
    attempted: usize,
    report: LoadReport,
}

impl ReloadError {
    pub(crate) fn new(failures: Vec<LoadError>, attempted: usize, report: LoadReport) -> Self {
        Self {
            failures,
            attempted,
            report,
        }
    }

    /// Returns the per-key failures.
    pub fn failures(&self) -> &[LoadError] {
        &self.failures
    }

    /// Returns the number of sources the reload attempted.
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Returns the sets that loaded successfully during the failed reload.
    pub fn report(&self) -> &LoadReport {
        &self.report
    }
}
