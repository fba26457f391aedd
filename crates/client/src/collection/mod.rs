//! Optimistic collections.
//!
//! A [`OptimisticCollection`] holds an ordered sequence of line items owned by
//! one page component. Mutations follow a fixed contract: validate locally,
//! snapshot, apply immediately, issue the remote call, then either supersede
//! the optimistic state with an authoritative refetch (success) or restore
//! the snapshot verbatim (failure).
//!
//! The per-key pending set rejects a second mutation on a key whose remote
//! call is still outstanding, so interleaved snapshots can never corrupt the
//! rollback state.

pub mod cart;
pub mod wishlist;

pub use cart::CartController;
pub use wishlist::WishlistController;

use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

use crate::error::ApiError;

/// An item in an optimistic collection, uniquely identified by its key.
pub trait LineItem: Clone + Send + Sync + 'static {
    /// Composite key type; one key maps to at most one item.
    type Key: Eq + Hash + Clone + Display + Send + Sync;

    /// The item's key.
    fn key(&self) -> Self::Key;
}

/// Immutable copy of a collection's items, taken before an optimistic
/// mutation and restored verbatim if the remote call fails.
pub type Snapshot<I> = Vec<I>;

/// Ordered, uniquely-keyed sequence of line items with snapshot/rollback
/// and per-key pending tracking.
#[derive(Debug)]
pub struct OptimisticCollection<I: LineItem> {
    items: Vec<I>,
    pending: HashSet<I::Key>,
}

impl<I: LineItem> Default for OptimisticCollection<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: LineItem> OptimisticCollection<I> {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            pending: HashSet::new(),
        }
    }

    /// The current items, in order.
    #[must_use]
    pub fn items(&self) -> &[I] {
        &self.items
    }

    /// Look up an item by key.
    #[must_use]
    pub fn get(&self, key: &I::Key) -> Option<&I> {
        self.items.iter().find(|item| item.key() == *key)
    }

    /// Whether an item with `key` exists.
    #[must_use]
    pub fn contains(&self, key: &I::Key) -> bool {
        self.get(key).is_some()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the whole collection with an authoritative server result.
    ///
    /// Duplicate keys from the server are collapsed, keeping the first
    /// occurrence, so the uniqueness invariant holds regardless of input.
    pub fn replace(&mut self, items: Vec<I>) {
        let mut seen = HashSet::new();
        self.items = items
            .into_iter()
            .filter(|item| seen.insert(item.key()))
            .collect();
    }

    /// Begin a mutation on `key`: reject if one is already outstanding,
    /// otherwise mark the key pending and return a snapshot to roll back to.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when `key` already has a mutation in
    /// flight.
    pub fn begin(&mut self, key: &I::Key) -> Result<Snapshot<I>, ApiError> {
        if self.pending.contains(key) {
            return Err(ApiError::Validation(format!(
                "another update for {key} is still in progress"
            )));
        }
        self.pending.insert(key.clone());
        Ok(self.items.clone())
    }

    /// Clear the pending flag for `key`. Called on every settle path.
    pub fn finish(&mut self, key: &I::Key) {
        self.pending.remove(key);
    }

    /// Whether a mutation on `key` is outstanding.
    #[must_use]
    pub fn is_pending(&self, key: &I::Key) -> bool {
        self.pending.contains(key)
    }

    /// Restore a snapshot taken by [`Self::begin`], discarding the
    /// optimistic state.
    pub fn restore(&mut self, snapshot: Snapshot<I>) {
        self.items = snapshot;
    }

    /// Mutate the item with `key` in place, if present.
    pub fn update_item(&mut self, key: &I::Key, f: impl FnOnce(&mut I)) {
        if let Some(item) = self.items.iter_mut().find(|item| item.key() == *key) {
            f(item);
        }
    }

    /// Remove the item with `key`, if present.
    pub fn remove_item(&mut self, key: &I::Key) {
        self.items.retain(|item| item.key() != *key);
    }

    /// Append an item. The caller is responsible for having checked that no
    /// item with the same key exists.
    pub fn push_item(&mut self, item: I) {
        debug_assert!(!self.contains(&item.key()));
        self.items.push(item);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{CartLine, LineProduct};
    use rust_decimal::Decimal;
    use shopkit_core::LineKey;

    fn line(product_id: &str, quantity: i64) -> CartLine {
        CartLine {
            key: LineKey::new(product_id, Some("M".to_string()), None),
            quantity,
            product: LineProduct {
                name: product_id.to_string(),
                price: Decimal::from(10),
                images: vec![],
                stock: 5,
                discount: Decimal::ZERO,
            },
        }
    }

    #[test]
    fn test_begin_rejects_pending_key() {
        let mut collection = OptimisticCollection::new();
        collection.replace(vec![line("p1", 1)]);
        let key = line("p1", 1).key;

        let snapshot = collection.begin(&key).unwrap();
        assert!(collection.is_pending(&key));

        // A second mutation on the same key is rejected while the first is
        // outstanding.
        let err = collection.begin(&key).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        collection.finish(&key);
        collection.restore(snapshot);
        assert!(collection.begin(&key).is_ok());
    }

    #[test]
    fn test_begin_allows_distinct_keys() {
        let mut collection = OptimisticCollection::new();
        collection.replace(vec![line("p1", 1), line("p2", 1)]);

        let k1 = line("p1", 1).key;
        let k2 = line("p2", 1).key;
        assert!(collection.begin(&k1).is_ok());
        assert!(collection.begin(&k2).is_ok());
    }

    #[test]
    fn test_restore_returns_exact_snapshot() {
        let mut collection = OptimisticCollection::new();
        collection.replace(vec![line("p1", 3)]);
        let key = line("p1", 3).key;

        let snapshot = collection.begin(&key).unwrap();
        collection.update_item(&key, |item| item.quantity = 4);
        assert_eq!(collection.get(&key).unwrap().quantity, 4);

        collection.restore(snapshot);
        collection.finish(&key);
        assert_eq!(collection.get(&key).unwrap().quantity, 3);
    }

    #[test]
    fn test_replace_collapses_duplicate_keys() {
        let mut collection = OptimisticCollection::new();
        collection.replace(vec![line("p1", 1), line("p1", 9), line("p2", 2)]);
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get(&line("p1", 1).key).unwrap().quantity, 1);
    }
}
