//! Provides the lock-free reference set store.

mod builder;
mod cache_set;
mod snapshot;
mod state;
mod validation_store;

pub use {
    builder::ValidationStoreBuilder,
    cache_set::{CacheElement, CacheSet, ElementKind, SharedSet},
    state::InitializationState,
    validation_store::ValidationStore,
};
