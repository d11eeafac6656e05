use std::{collections::HashSet, fmt, hash::Hash};

use triomphe::Arc as TrioArc;
use uuid::Uuid;

/// An immutable, shared set of reference values.
///
/// A `SharedSet` obtained from [`ValidationStore::get_cache`][get-cache] keeps
/// its contents after the store publishes a newer set under the same key.
///
/// [get-cache]: ./struct.ValidationStore.html#method.get_cache
pub type SharedSet<T> = TrioArc<HashSet<T>>;

/// The element type of a reference set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Int32,
    Int64,
    Text,
    Uuid,
}

impl ElementKind {
    /// Returns the lower-case name used in log messages, e.g. `"i32"` or
    /// `"text"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Int32 => "i32",
            Self::Int64 => "i64",
            Self::Text => "text",
            Self::Uuid => "uuid",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One published reference set, tagged with its element type.
///
/// Cloning a `CacheSet` only bumps a reference count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheSet {
    Int32(SharedSet<i32>),
    Int64(SharedSet<i64>),
    Text(SharedSet<String>),
    Uuid(SharedSet<Uuid>),
}

impl CacheSet {
    /// Builds a set from `values`, dropping duplicates.
    pub fn from_values<T, I>(values: I) -> Self
    where
        T: CacheElement,
        I: IntoIterator<Item = T>,
    {
        T::into_cache_set(values.into_iter().collect())
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Int32(_) => ElementKind::Int32,
            Self::Int64(_) => ElementKind::Int64,
            Self::Text(_) => ElementKind::Text,
            Self::Uuid(_) => ElementKind::Uuid,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Int32(set) => set.len(),
            Self::Int64(set) => set.len(),
            Self::Text(set) => set.len(),
            Self::Uuid(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the typed set if this set holds elements of type `T`.
    pub fn as_typed<T: CacheElement>(&self) -> Option<&SharedSet<T>> {
        T::typed_set(self)
    }

    pub fn contains<T: CacheElement>(&self, value: &T) -> bool {
        self.as_typed::<T>().map_or(false, |set| set.contains(value))
    }

    /// Like `contains` for text sets, without allocating a `String`.
    pub fn contains_str(&self, value: &str) -> bool {
        match self {
            Self::Text(set) => set.contains(value),
            _ => false,
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A value type that can be stored in a [`CacheSet`].
///
/// Implemented for `i32`, `i64`, `String` and `uuid::Uuid`. Sets of different
/// element types never compare equal and are never returned for one another.
pub trait CacheElement: sealed::Sealed + Eq + Hash + Clone + Send + Sync + 'static {
    /// The [`CacheSet`] variant sets of this type are stored as.
    const KIND: ElementKind;

    /// Wraps `values` in the matching [`CacheSet`] variant.
    fn into_cache_set(values: HashSet<Self>) -> CacheSet;

    /// Returns the typed set if `set` is of the [`KIND`](Self::KIND) variant.
    fn typed_set(set: &CacheSet) -> Option<&SharedSet<Self>>;
}

macro_rules! cache_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl CacheElement for $ty {
                const KIND: ElementKind = ElementKind::$variant;

                fn into_cache_set(values: HashSet<Self>) -> CacheSet {
                    CacheSet::$variant(TrioArc::new(values))
                }

                fn typed_set(set: &CacheSet) -> Option<&SharedSet<Self>> {
                    match set {
                        CacheSet::$variant(typed) => Some(typed),
                        _ => None,
                    }
                }
            }
        )*
    };
}

cache_element! {
    i32 => Int32,
    i64 => Int64,
    String => Text,
    Uuid => Uuid,
}
