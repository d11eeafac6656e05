use std::time::SystemTime;

/// Records whether the reference sets of a store have been loaded at least once,
/// and by whom and when they were last reloaded.
///
/// Validation rules configured with
/// [`MissingCachePolicy::SkipUntilInitialized`][skip-until] read this to decide
/// whether a missing set is an error or just "not ready yet".
///
/// [skip-until]: ../validate/enum.MissingCachePolicy.html#variant.SkipUntilInitialized
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InitializationState {
    is_initialized: bool,
    last_reload_source: Option<String>,
    last_reload_time: Option<SystemTime>,
}

impl InitializationState {
    pub(crate) fn initialized(source: Option<&str>, time: SystemTime) -> Self {
        Self {
            is_initialized: true,
            last_reload_source: source.map(ToString::to_string),
            last_reload_time: Some(time),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    /// Returns the label of whatever triggered the last reload, e.g. `"startup"`.
    pub fn last_reload_source(&self) -> Option<&str> {
        self.last_reload_source.as_deref()
    }

    pub fn last_reload_time(&self) -> Option<SystemTime> {
        self.last_reload_time
    }

    pub(crate) fn with_is_initialized(&self, is_initialized: bool) -> Self {
        Self {
            is_initialized,
            ..self.clone()
        }
    }

    pub(crate) fn with_last_reload_source(&self, source: Option<&str>) -> Self {
        Self {
            last_reload_source: source.map(ToString::to_string),
            ..self.clone()
        }
    }

    pub(crate) fn with_last_reload_time(&self, time: SystemTime) -> Self {
        Self {
            last_reload_time: Some(time),
            ..self.clone()
        }
    }
}
