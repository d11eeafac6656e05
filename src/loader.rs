//! Loading reference sets from their sources, once or periodically.

mod cache_loader;
mod refresher;

pub use {
    cache_loader::{CacheLoader, LoadReport},
    refresher::{Refresher, RefresherConfig},
};
