//! Validation rules that check submitted values against the reference sets of a
//! [`ValidationStore`][store-struct].
//!
//! [store-struct]: ../struct.ValidationStore.html

mod rules;
mod scope;

pub use {
    rules::{
        category_exists, min_length, product_code_unique, required, supplier_exists,
        MembershipRule, MissingCachePolicy, CATEGORIES, PRODUCT_CODES, SUPPLIER_IDS,
    },
    scope::ValidationScope,
};

use crate::ValidationStore;

use smallvec::SmallVec;
use std::fmt;

/// A validation failure of one member (field) of an object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    member: String,
    message: String,
}

impl FieldError {
    pub fn new(member: &str, message: impl Into<String>) -> Self {
        Self {
            member: member.to_string(),
            message: message.into(),
        }
    }

    /// Returns the name of the member that failed validation.
    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.member, self.message)
    }
}

/// The failures of one object. Most objects fail on a handful of members at most.
pub type FieldErrors = SmallVec<[FieldError; 4]>;

/// An object that can be validated against the reference sets of a store.
pub trait Validate {
    /// Returns every member failure. An empty result means the object is valid.
    fn validate(&self, store: &ValidationStore) -> FieldErrors;

    fn is_valid(&self, store: &ValidationStore) -> bool {
        self.validate(store).is_empty()
    }
}

/// The failures of one item of a list validated by
/// [`ValidationScope::validate_list`][validate-list].
///
/// [validate-list]: ./struct.ValidationScope.html#method.validate_list
#[derive(Debug)]
pub struct ItemErrors<'a, T> {
    /// The position of the item in the validated list.
    pub index: usize,
    pub item: &'a T,
    pub errors: FieldErrors,
}
