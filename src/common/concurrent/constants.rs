pub(crate) const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5 * 60;

/// Shorter refresh intervals are raised to this.
pub(crate) const MIN_REFRESH_INTERVAL_MILLIS: u64 = 10;

pub(crate) const DEFAULT_REFRESHER_THREAD_NAME: &str = "refcache-refresher";

/// The reload source label the refresher thread passes to `mark_initialized`.
pub(crate) const REFRESHER_RELOAD_SOURCE: &str = "refresher";
