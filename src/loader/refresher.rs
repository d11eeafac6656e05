use super::CacheLoader;
use crate::common::concurrent::constants::{
    DEFAULT_REFRESHER_THREAD_NAME, DEFAULT_REFRESH_INTERVAL_SECS, MIN_REFRESH_INTERVAL_MILLIS,
    REFRESHER_RELOAD_SOURCE,
};

use crossbeam_channel::{RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

/// Configuration of a [`Refresher`].
#[derive(Clone, Debug)]
pub struct RefresherConfig {
    interval: Duration,
    run_immediately: bool,
    thread_name: String,
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            run_immediately: false,
            thread_name: DEFAULT_REFRESHER_THREAD_NAME.to_string(),
        }
    }
}

impl RefresherConfig {
    /// Sets the time between two reloads. Default: 5 minutes.
    ///
    /// Intervals shorter than 10 milliseconds (including `Duration::ZERO`) are
    /// raised to 10 milliseconds.
    #[must_use]
    pub fn interval(self, interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(MIN_REFRESH_INTERVAL_MILLIS)),
            ..self
        }
    }

    /// Sets whether the first reload happens as soon as the refresher starts
    /// rather than after the first interval. Default: `false`.
    #[must_use]
    pub fn run_immediately(self, enabled: bool) -> Self {
        Self {
            run_immediately: enabled,
            ..self
        }
    }

    #[must_use]
    pub fn thread_name(self, name: &str) -> Self {
        Self {
            thread_name: name.to_string(),
            ..self
        }
    }
}

/// A background thread that periodically reloads every source of a
/// [`CacheLoader`] and marks the store initialized with the `"refresher"` reload
/// source.
///
/// Failed reloads are logged and retried on the next tick. The thread stops when
/// [`stop`](#method.stop) is called or the `Refresher` is dropped.
///
/// # Examples
///
/// ```rust
/// use refcache::{
///     loader::{CacheLoader, Refresher, RefresherConfig},
///     ValidationStore,
/// };
/// use std::{sync::Arc, time::Duration};
///
/// let store = ValidationStore::new();
/// let mut loader = CacheLoader::new(&store);
/// loader.register("SupplierIds", || Ok(vec![1, 2, 3]));
///
/// let config = RefresherConfig::default()
///     .interval(Duration::from_secs(60))
///     .run_immediately(true);
/// let refresher = Refresher::start(Arc::new(loader), config).unwrap();
///
/// // ...
///
/// refresher.stop();
/// assert!(!refresher.is_running());
/// ```
pub struct Refresher {
    handle: Mutex<Option<(Sender<()>, JoinHandle<()>)>>,
}

impl std::fmt::Debug for Refresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refresher")
            .field("is_running", &self.is_running())
            .finish()
    }
}

impl Refresher {
    /// Spawns the refresher thread.
    pub fn start(loader: Arc<CacheLoader>, config: RefresherConfig) -> io::Result<Self> {
        // The thread never sends on this channel. Dropping the sender wakes it
        // up with a disconnect.
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);

        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                if config.run_immediately {
                    reload(&loader);
                }
                loop {
                    match stop_rx.recv_timeout(config.interval) {
                        Err(RecvTimeoutError::Timeout) => reload(&loader),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        Ok(Self {
            handle: Mutex::new(Some((stop_tx, handle))),
        })
    }

    /// Stops the thread and waits for an in-flight reload to finish. Calling this
    /// more than once is a no-op.
    pub fn stop(&self) {
        let handle = self.handle.lock().take();
        if let Some((stop_tx, handle)) = handle {
            drop(stop_tx);
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.lock().is_some()
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn reload(loader: &CacheLoader) {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    // A panicking source must not take the thread down. Every set the panicking
    // reload had already published is complete.
    let result = catch_unwind(AssertUnwindSafe(|| {
        loader.reload_all(REFRESHER_RELOAD_SOURCE)
    }));

    match result {
        Ok(Ok(_report)) => (),
        Ok(Err(_error)) => {
            #[cfg(feature = "logging")]
            log::warn!(
                "{}Periodic reload failed: {_error}. Retrying in the next interval",
                loader.store().log_prefix()
            );
        }
        Err(_payload) => {
            #[cfg(feature = "logging")]
            log::error!(
                "{}Periodic reload panicked: {}",
                loader.store().log_prefix(),
                panic_message(&*_payload)
            );
        }
    }
}

#[cfg(feature = "logging")]
fn panic_message(payload: &(dyn std::any::Any + Send + 'static)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::{Refresher, RefresherConfig};
    use crate::{loader::CacheLoader, ValidationStore};

    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::{Duration, Instant},
    };

    fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
        let started = Instant::now();
        while started.elapsed() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    #[test]
    fn reloads_periodically() {
        let store = ValidationStore::new();
        let fetches = Arc::new(AtomicUsize::new(0));

        let mut loader = CacheLoader::new(&store);
        let counter = Arc::clone(&fetches);
        loader.register("SupplierIds", move || {
            let n = counter.fetch_add(1, Ordering::AcqRel) as i32;
            Ok(vec![n])
        });

        let config = RefresherConfig::default().interval(Duration::from_millis(10));
        let refresher = Refresher::start(Arc::new(loader), config).unwrap();
        assert!(refresher.is_running());

        assert!(wait_until(Duration::from_secs(10), || fetches
            .load(Ordering::Acquire)
            >= 3));
        refresher.stop();
        assert!(!refresher.is_running());

        let state = store.state();
        assert!(state.is_initialized());
        assert_eq!(state.last_reload_source(), Some("refresher"));

        // No reloads after stop returned.
        let after_stop = fetches.load(Ordering::Acquire);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(fetches.load(Ordering::Acquire), after_stop);
    }

    #[test]
    fn zero_interval_is_raised_to_the_minimum() {
        let config = RefresherConfig::default().interval(Duration::ZERO);
        assert_eq!(config.interval, Duration::from_millis(10));

        let config = RefresherConfig::default().interval(Duration::from_millis(250));
        assert_eq!(config.interval, Duration::from_millis(250));
    }

    #[test]
    fn zero_interval_does_not_spin() {
        let store = ValidationStore::new();
        let fetches = Arc::new(AtomicUsize::new(0));

        let mut loader = CacheLoader::new(&store);
        let counter = Arc::clone(&fetches);
        loader.register("SupplierIds", move || {
            counter.fetch_add(1, Ordering::AcqRel);
            Ok(vec![1])
        });

        let config = RefresherConfig::default().interval(Duration::ZERO);
        let refresher = Refresher::start(Arc::new(loader), config).unwrap();
        thread::sleep(Duration::from_millis(100));
        refresher.stop();

        // About ten reloads at the 10 ms minimum. A busy loop would do thousands.
        let count = fetches.load(Ordering::Acquire);
        assert!(count < 100, "reloaded {count} times in 100 ms");
    }

    #[test]
    fn run_immediately() {
        let store = ValidationStore::new();
        let mut loader = CacheLoader::new(&store);
        loader.register("Categories", || Ok(vec!["Chair".to_string()]));

        let config = RefresherConfig::default()
            .interval(Duration::from_secs(3600))
            .run_immediately(true);
        let refresher = Refresher::start(Arc::new(loader), config).unwrap();

        assert!(wait_until(Duration::from_secs(10), || store
            .is_cache_loaded("Categories")));
        // Stopping does not wait for the hour-long interval.
        refresher.stop();
    }

    #[test]
    fn survives_failing_and_panicking_sources() {
        let store = ValidationStore::new();
        let fetches = Arc::new(AtomicUsize::new(0));

        let mut loader = CacheLoader::new(&store);
        let counter = Arc::clone(&fetches);
        loader.register::<i32, _>("SupplierIds", move || {
            match counter.fetch_add(1, Ordering::AcqRel) {
                0 => Err("timeout".into()),
                1 => panic!("source panicked"),
                _ => Ok(vec![1]),
            }
        });

        let config = RefresherConfig::default()
            .interval(Duration::from_millis(10))
            .run_immediately(true);
        let refresher = Refresher::start(Arc::new(loader), config).unwrap();

        assert!(wait_until(Duration::from_secs(10), || store
            .contains("SupplierIds", &1)));
        assert!(refresher.is_running());
        drop(refresher);

        assert!(fetches.load(Ordering::Acquire) >= 3);
    }
}
