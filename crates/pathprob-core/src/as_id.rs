//! Interned AS identifiers with a total, lexicographic ordering.
//!
//! The upstream inference pipeline compares AS numbers as the strings read
//! off the wire format (`"174" < "23"` lexicographically, not numerically);
//! we keep that convention since the output file formats and the
//! reproducibility guarantee in spec section 5 are defined relative to it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An opaque, cheaply-cloneable AS identifier. Equality and ordering are
/// delegated to the underlying string, so two `AsId`s compare exactly as
/// their textual AS numbers would.
#[derive(Clone, Eq)]
pub struct AsId(Arc<str>);

impl AsId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for AsId {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl std::hash::Hash for AsId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl PartialOrd for AsId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AsId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for AsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for AsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AsId({:?})", self.0)
    }
}

/// Deduplicating string table. Every distinct AS number is stored once; all
/// `AsId`s for the same number share the same backing allocation.
#[derive(Default)]
pub struct Interner {
    table: HashMap<Box<str>, AsId>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> AsId {
        if let Some(id) = self.table.get(s) {
            return id.clone();
        }
        let id = AsId(Arc::from(s));
        self.table.insert(Box::from(s), id.clone());
        id
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_dedups_equal_strings() {
        let mut it = Interner::new();
        let a = it.intern("174");
        let b = it.intern("174");
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(it.len(), 1);
    }

    #[test]
    fn ordering_is_lexicographic_not_numeric() {
        let mut it = Interner::new();
        let a = it.intern("174");
        let b = it.intern("23");
        // "174" < "23" lexicographically even though 174 > 23 numerically.
        assert!(a < b);
    }
}
