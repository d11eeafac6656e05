#![cfg(test)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use refcache::{
    loader::{CacheLoader, Refresher, RefresherConfig},
    models::CreateProductRequest,
    validate::{
        supplier_exists, MissingCachePolicy, Validate, ValidationScope, CATEGORIES,
        PRODUCT_CODES, SUPPLIER_IDS,
    },
    ElementKind, LoadError, ValidationStore,
};
use uuid::Uuid;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn supplier_existence_scenario() {
    let store = ValidationStore::new();
    store.set_cache(SUPPLIER_IDS, vec![1, 2, 3, 4, 5]);

    assert!(!store.contains(SUPPLIER_IDS, &999));
    assert!(store.contains(SUPPLIER_IDS, &3));
    assert_eq!(store.cache_count(SUPPLIER_IDS), 5);

    let rule = supplier_exists();
    assert!(rule.check(&store, "supplier_id", Some(&3)).is_ok());
    assert_eq!(
        rule.check(&store, "supplier_id", Some(&999))
            .unwrap_err()
            .to_string(),
        "supplier_id: Supplier ID '999' does not exist"
    );
}

#[test]
fn uuid_and_i64_sets() {
    let store = ValidationStore::new();
    let known = Uuid::new_v4();
    store.set_cache("OrderIds", vec![known]);
    store.set_cache("Barcodes", vec![4_006_381_333_931_i64]);

    assert_eq!(store.element_kind("OrderIds"), Some(ElementKind::Uuid));
    assert!(store.contains("OrderIds", &known));
    assert!(!store.contains("OrderIds", &Uuid::new_v4()));

    assert!(store.contains("Barcodes", &4_006_381_333_931_i64));
    // Same numeric value, other element type.
    assert!(!store.contains("Barcodes", &1_i32));
    assert!(store.get_cache::<i32>("Barcodes").is_none());
}

#[test]
fn startup_load_then_validate() -> anyhow::Result<()> {
    init_logger();

    let store = ValidationStore::builder()
        .name("inventory")
        .initial_capacity(3)
        .build();

    let mut loader = CacheLoader::new(&store);
    loader
        .register(SUPPLIER_IDS, || Ok(vec![1, 2, 3]))
        .register(CATEGORIES, || {
            Ok(vec!["Electronics".to_string(), "Furniture".to_string()])
        })
        .register(PRODUCT_CODES, || Ok(vec!["P001".to_string()]));

    let report = loader.reload_all("startup")?;
    assert_eq!(report.loaded().len(), 3);
    assert!(store.state().is_initialized());

    let requests = [
        CreateProductRequest::new("P002", "Desk Lamp", "Electronics", 1),
        CreateProductRequest::new("P001", "Desk Lamp", "Electronics", 1),
        CreateProductRequest::new("P003", "Sofa", "Outdoor", 7),
    ];
    let valid: Vec<_> = requests.iter().map(|r| r.is_valid(&store)).collect();
    assert_eq!(valid, vec![true, false, false]);

    // The product got created, so its code is taken now.
    store.add_to_cache(PRODUCT_CODES, "P002".to_string());
    assert!(!requests[0].is_valid(&store));

    Ok(())
}

#[test]
fn unknown_key_error() {
    let store = ValidationStore::new();
    let loader = CacheLoader::new(&store);

    let err = loader.load("Warehouses").unwrap_err();
    assert!(matches!(err, LoadError::UnknownKey(_)));
    assert_eq!(
        err.to_string(),
        "No reference source is registered for cache key 'Warehouses'"
    );
}

#[test]
fn skip_until_initialized_follows_the_store_state() {
    let store = ValidationStore::new();
    let rule = supplier_exists().on_missing_cache(MissingCachePolicy::SkipUntilInitialized);

    // Not ready yet: let the value through.
    assert!(rule.check(&store, "supplier_id", Some(&42)).is_ok());

    let mut loader = CacheLoader::new(&store);
    loader.register(SUPPLIER_IDS, || Ok(vec![1]));
    loader.reload_all("startup").expect("every source loads");
    assert!(rule.check(&store, "supplier_id", Some(&42)).is_err());

    // Initialized but the set was cleared afterwards.
    store.clear_cache(SUPPLIER_IDS);
    let err = rule.check(&store, "supplier_id", Some(&1)).unwrap_err();
    assert!(err.message().contains("cache is not loaded"));
}

#[test]
fn batch_validation_scope() {
    let store = ValidationStore::new();
    let products = vec![
        CreateProductRequest::new("P100", "Bookshelf", "Furniture", 2),
        CreateProductRequest::new("P101", "B", "Furniture", 2),
        CreateProductRequest::new("P102", "Armchair", "Furniture", 2),
    ];

    {
        let mut scope = ValidationScope::new(&store);
        scope
            .load_cache(SUPPLIER_IDS, vec![1, 2])
            .load_cache(CATEGORIES, vec!["Furniture".to_string()])
            .load_cache(PRODUCT_CODES, Vec::<String>::new());

        let failures = scope.validate_list(&products);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert_eq!(failures[0].item.product_code, "P101");
        assert_eq!(failures[0].errors[0].member(), "product_name");
    }

    assert!(store.is_empty());
}

#[test]
fn refresher_keeps_the_store_current() {
    init_logger();

    let store = ValidationStore::builder().name("refreshing").build();
    let generation = Arc::new(AtomicUsize::new(0));

    let mut loader = CacheLoader::new(&store);
    let gen = Arc::clone(&generation);
    loader.register(SUPPLIER_IDS, move || {
        // Every reload sees one more supplier.
        let n = gen.fetch_add(1, Ordering::AcqRel) as i32;
        Ok((0..=n).collect::<Vec<_>>())
    });
    let loader = Arc::new(loader);

    loader.reload_all("startup").expect("every source loads");
    assert_eq!(store.state().last_reload_source(), Some("startup"));
    assert_eq!(store.cache_count(SUPPLIER_IDS), 1);

    let refresher = Refresher::start(
        Arc::clone(&loader),
        RefresherConfig::default()
            .interval(Duration::from_millis(10))
            .thread_name("test-refresher"),
    )
    .expect("failed to spawn the refresher");

    let deadline = Instant::now() + Duration::from_secs(10);
    while store.cache_count(SUPPLIER_IDS) < 4 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    refresher.stop();

    assert!(store.cache_count(SUPPLIER_IDS) >= 4);
    assert_eq!(store.state().last_reload_source(), Some("refresher"));
}
