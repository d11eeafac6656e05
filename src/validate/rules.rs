use super::FieldError;
use crate::{store::CacheElement, ValidationStore};

use std::{borrow::Cow, fmt, marker::PhantomData};

/// The cache key of the valid supplier IDs (`i32`).
pub const SUPPLIER_IDS: &str = "SupplierIds";

/// The cache key of the valid product categories (text).
pub const CATEGORIES: &str = "Categories";

/// The cache key of the product codes already in use (text).
pub const PRODUCT_CODES: &str = "ProductCodes";

/// What a [`MembershipRule`] does when its reference set is not loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingCachePolicy {
    /// Fail validation with a "cache is not loaded" message.
    #[default]
    Reject,
    /// Treat the value as valid.
    Skip,
    /// Treat the value as valid until the store has been marked initialized,
    /// and reject it afterwards.
    SkipUntilInitialized,
}

impl MissingCachePolicy {
    fn apply(self, store: &ValidationStore, member: &str, entity: &str) -> Result<(), FieldError> {
        let reject = || {
            Err(FieldError::new(
                member,
                format!("{entity} cache is not loaded. Load the cache before validating"),
            ))
        };

        match self {
            Self::Reject => reject(),
            Self::Skip => Ok(()),
            Self::SkipUntilInitialized if store.state().is_initialized() => reject(),
            Self::SkipUntilInitialized => Ok(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Expect {
    Member,
    NonMember,
}

/// A rule checking a value against the reference set stored under one cache key.
///
/// - [`exists`](#method.exists) passes when the value is in the set (e.g. "does
///   this supplier exist?").
/// - [`unique`](#method.unique) passes when the value is NOT in the set (e.g. "is
///   this product code still free?").
///
/// A `None` value always passes; pair the rule with [`required`] if the member is
/// mandatory.
///
/// # Examples
///
/// ```rust
/// use refcache::{validate::MembershipRule, ValidationStore};
///
/// let store = ValidationStore::new();
/// let rule = MembershipRule::<i32>::exists("WarehouseIds", "Warehouse");
///
/// // Not loaded yet.
/// assert!(rule.check(&store, "warehouse_id", Some(&1)).is_err());
///
/// store.set_cache("WarehouseIds", vec![1, 2]);
/// assert!(rule.check(&store, "warehouse_id", Some(&1)).is_ok());
///
/// let err = rule.check(&store, "warehouse_id", Some(&3)).unwrap_err();
/// assert_eq!(err.message(), "Warehouse '3' does not exist");
/// ```
pub struct MembershipRule<T> {
    cache_key: Cow<'static, str>,
    entity_name: Cow<'static, str>,
    message: Option<Cow<'static, str>>,
    on_missing_cache: MissingCachePolicy,
    expect: Expect,
    _marker: PhantomData<fn(&T)>,
}

impl<T> Clone for MembershipRule<T> {
    fn clone(&self) -> Self {
        Self {
            cache_key: self.cache_key.clone(),
            entity_name: self.entity_name.clone(),
            message: self.message.clone(),
            on_missing_cache: self.on_missing_cache,
            expect: self.expect,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for MembershipRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MembershipRule")
            .field("cache_key", &self.cache_key)
            .field("entity_name", &self.entity_name)
            .field("expect", &self.expect)
            .field("on_missing_cache", &self.on_missing_cache)
            .finish()
    }
}

impl<T> MembershipRule<T>
where
    T: CacheElement + fmt::Display,
{
    /// A rule that passes when the value is a member of the set under
    /// `cache_key`. `entity_name` is used in the failure messages.
    pub fn exists(
        cache_key: impl Into<Cow<'static, str>>,
        entity_name: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::with_expectation(cache_key.into(), entity_name.into(), Expect::Member)
    }

    /// A rule that passes when the value is not a member of the set under
    /// `cache_key`.
    pub fn unique(
        cache_key: impl Into<Cow<'static, str>>,
        entity_name: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::with_expectation(cache_key.into(), entity_name.into(), Expect::NonMember)
    }

    fn with_expectation(
        cache_key: Cow<'static, str>,
        entity_name: Cow<'static, str>,
        expect: Expect,
    ) -> Self {
        Self {
            cache_key,
            entity_name,
            message: None,
            on_missing_cache: MissingCachePolicy::default(),
            expect,
            _marker: PhantomData,
        }
    }

    /// Replaces the default failure message (which names the offending value).
    pub fn with_message(self, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: Some(message.into()),
            ..self
        }
    }

    /// Sets what the rule does when its reference set is not loaded.
    /// Default: [`MissingCachePolicy::Reject`].
    pub fn on_missing_cache(self, policy: MissingCachePolicy) -> Self {
        Self {
            on_missing_cache: policy,
            ..self
        }
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Checks `value`, reporting failures against `member`.
    pub fn check(
        &self,
        store: &ValidationStore,
        member: &str,
        value: Option<&T>,
    ) -> Result<(), FieldError> {
        let value = match value {
            Some(value) => value,
            None => return Ok(()),
        };

        if !store.is_cache_loaded(&self.cache_key) {
            return self
                .on_missing_cache
                .apply(store, member, &self.entity_name);
        }

        let is_member = store.contains(&self.cache_key, value);
        match (self.expect, is_member) {
            (Expect::Member, true) | (Expect::NonMember, false) => Ok(()),
            (Expect::Member, false) => Err(self.failure(member, value, "does not exist")),
            (Expect::NonMember, true) => Err(self.failure(member, value, "already exists")),
        }
    }

    fn failure(&self, member: &str, value: &T, reason: &str) -> FieldError {
        match &self.message {
            Some(message) => FieldError::new(member, message.to_string()),
            None => FieldError::new(
                member,
                format!("{} '{value}' {reason}", self.entity_name),
            ),
        }
    }
}

/// Passes when the supplier ID is in the [`SUPPLIER_IDS`] set.
pub fn supplier_exists() -> MembershipRule<i32> {
    MembershipRule::exists(SUPPLIER_IDS, "Supplier ID")
}

/// Passes when the category is in the [`CATEGORIES`] set.
pub fn category_exists() -> MembershipRule<String> {
    MembershipRule::exists(CATEGORIES, "Category")
}

/// Passes when the product code is NOT in the [`PRODUCT_CODES`] set.
pub fn product_code_unique() -> MembershipRule<String> {
    MembershipRule::unique(PRODUCT_CODES, "Product Code")
}

/// Fails when `value` is empty or whitespace only.
pub fn required(member: &str, value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        Err(FieldError::new(member, format!("{member} is required")))
    } else {
        Ok(())
    }
}

/// Fails when `value` has fewer than `min` characters.
pub fn min_length(member: &str, value: &str, min: usize) -> Result<(), FieldError> {
    if value.chars().count() < min {
        Err(FieldError::new(
            member,
            format!("{member} must be at least {min} characters long"),
        ))
    } else {
        Ok(())
    }
}
