#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

//! Refcache is a lock-free store of named reference sets for validating
//! submitted values against the data that is currently valid.
//!
//! A reference set is the collection of values a foreign-key-style field may take
//! right now: the existing supplier IDs, the known product categories, the
//! product codes already in use. Validation runs on hot request paths and needs a
//! synchronous, cheap answer to "does this value exist?", so the sets are kept
//! in memory and refreshed from the authoritative source now and then.
//!
//! # Features
//!
//! - [`ValidationStore`][store-struct] keeps every set in one immutable snapshot
//!   that is replaced atomically. Readers never lock and never see a partially
//!   updated set. Writers never lose each other's updates.
//! - Each set holds elements of a single type (`i32`, `i64`, `String` or
//!   `Uuid`). Asking for another type is the same as asking for a missing key.
//! - The store tracks whether a full reload has completed, what triggered it, and
//!   when.
//! - The [`validate`][validate-mod] module provides membership rules ("exists",
//!   "is unique") with configurable handling of sets that are not loaded yet, and
//!   a [`ValidationScope`][scope-struct] for batch validation.
//! - The [`loader`][loader-mod] module loads sets from registered sources, once
//!   or periodically on a background thread.
//!
//! [store-struct]: ./struct.ValidationStore.html
//! [validate-mod]: ./validate/index.html
//! [scope-struct]: ./validate/struct.ValidationScope.html
//! [loader-mod]: ./loader/index.html
//!
//! # Example
//!
//! ```rust
//! use refcache::{
//!     loader::CacheLoader,
//!     models::CreateProductRequest,
//!     validate::{Validate, CATEGORIES, PRODUCT_CODES, SUPPLIER_IDS},
//!     ValidationStore,
//! };
//!
//! let store = ValidationStore::builder().name("inventory").build();
//!
//! let mut loader = CacheLoader::new(&store);
//! loader
//!     .register(SUPPLIER_IDS, || Ok(vec![1, 2, 3, 4, 5]))
//!     .register(CATEGORIES, || {
//!         Ok(vec!["Electronics".to_string(), "Furniture".to_string()])
//!     })
//!     .register(PRODUCT_CODES, || Ok(vec!["P001".to_string()]));
//! loader.reload_all("startup").unwrap();
//!
//! let ok = CreateProductRequest::new("P002", "Office Chair", "Furniture", 3);
//! assert!(ok.is_valid(&store));
//!
//! let bad = CreateProductRequest::new("P001", "Office Chair", "Furniture", 999);
//! let errors = bad.validate(&store);
//! assert_eq!(errors.len(), 2);
//! assert_eq!(errors[1].message(), "Supplier ID '999' does not exist");
//!
//! // A new supplier was inserted into the database.
//! store.add_to_cache(SUPPLIER_IDS, 999);
//! assert_eq!(bad.validate(&store).len(), 1);
//! ```
//!
//! # Logging
//!
//! With the default `logging` feature, store mutations and reloads are reported
//! through the [`log`](https://docs.rs/log) crate. Messages of a named store are
//! prefixed with `[name] `.
//!
//! # Minimum Supported Rust Versions
//!
//! This crate's minimum supported Rust version (MSRV) is 1.65.

pub(crate) mod common;
pub mod loader;
pub mod models;
pub(crate) mod store;
pub mod validate;

pub use common::error::{BoxError, LoadError, ReloadError};
pub use store::{
    CacheElement, CacheSet, ElementKind, InitializationState, SharedSet, ValidationStore,
    ValidationStoreBuilder,
};
