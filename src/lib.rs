//! This crate provides an identifier allocator ("IDR"), which hands out the
//! smallest free integer identifier within a range, associates a payload with
//! it, and later lets you look that payload up or release it by identifier.
//!
//! This is the kind of facility that is used to hand out file descriptors,
//! object handles or slot numbers, where identifiers must stay dense, be
//! reusable as soon as they are released, and be cheap to search for.
//!
//! # Identifier space
//!
//! Every allocator manages a single linear identifier space. Internally,
//! identifiers are tracked as **relative indices**, and the allocator's
//! **base** is added to them on the way out (and subtracted on the way in).
//! Allocation ranges are always expressed in relative terms, as half-open
//! `[min, max)` ranges.
//!
//! Relative index 0 is reserved and is never allocated, so an allocator with a
//! base of 100 hands out 101 first.
//!
//! # Data structure
//!
//! Every live identifier is tracked by an entry that belongs to two indices:
//!
//! - An **ordered index** (balanced tree keyed by relative index), which finds
//!   the entry at or right below a given index in logarithmic time.
//! - A **sequential index** (doubly linked list of the same entries, in the
//!   same order), which steps from an entry to its successor in O(1).
//!
//! Allocation uses the former to jump to the start of the requested range,
//! and the latter to walk forward until the first gap. Since low identifiers
//! tend to be densely allocated, that walk is usually very short.
//!
//! # Allocation policies
//!
//! - `alloc*` methods return the lowest free identifier of the range.
//! - `alloc_cyclic*` methods start searching at a rotating cursor, right after
//!   the last identifier handed out in this way, and wrap around to the start
//!   of the range if need be. This spreads the reuse of released identifiers
//!   across the space instead of always reusing the lowest one.
//!
//! Both come in a variant where the allocator stores the payload in an entry
//! of its own, and a variant where the caller hands over a prebuilt `IdrNode`
//! and gets it back on removal (see the `alloc_node*` methods).
//!
//! # Concurrency
//!
//! An `Idr` is a plain single-threaded data structure. If you need to share
//! one between threads, put it behind a lock, or shard the identifier space
//! across multiple allocators with different bases.
//!
//! # Example
//!
//! ```
//! use idr::Idr;
//!
//! let mut idr = Idr::with_base(100);
//! let first = idr.alloc("first").unwrap();
//! let second = idr.alloc("second").unwrap();
//! assert_eq!((first, second), (101, 102));
//!
//! assert_eq!(idr.find(first), Some(&"first"));
//! assert_eq!(idr.remove(first), Some("first"));
//! assert_eq!(idr.find(first), None);
//!
//! // Released identifiers are immediately reused...
//! assert_eq!(idr.alloc("third").unwrap(), 101);
//!
//! // ...unless cyclic allocation is used
//! idr.remove(101);
//! assert_eq!(idr.alloc_cyclic("fourth").unwrap(), 101);
//! idr.remove(101);
//! assert_eq!(idr.alloc_cyclic("fifth").unwrap(), 103);
//! ```

mod allocation;
mod builder;
mod error;
mod hole;
mod node;
mod store;

use crate::store::{Entries, Entry, Origin, Store};

use log::{debug, trace};

use std::{collections::BTreeMap, iter::FusedIterator};


pub use crate::{
    builder::Builder,
    error::{AllocError, NodeAllocError},
    node::IdrNode,
};


/// An identifier allocator
#[derive(Debug)]
pub struct Idr<T> {
    /// Ordered index, from relative index to entry slot key
    tree: BTreeMap<usize, usize>,

    /// Entry storage, which also holds the sequential index
    store: Store<T>,

    /// Offset between relative indices and identifiers
    base: usize,

    /// Relative index at which the next cyclic allocation starts searching
    cursor: usize,
}

impl<T> Idr<T> {
    /// Create an empty allocator with a base of 0
    pub fn new() -> Self {
        Self::with_base(0)
    }

    /// Create an empty allocator, whose identifiers are offset by `base`
    pub fn with_base(base: usize) -> Self {
        Self::from_parts(base, 0, None)
    }

    /// Allocator constructor proper, used by `Builder`
    ///
    /// Use `Builder::new()` for anything beyond a base.
    pub(crate) fn from_parts(base: usize, capacity: usize, max_entries: Option<usize>) -> Self {
        Self {
            tree: BTreeMap::new(),
            store: Store::new(capacity, max_entries),
            base,
            cursor: 0,
        }
    }

    /// Offset added to relative indices to produce identifiers
    pub fn base(&self) -> usize {
        self.base
    }

    /// Relative index at which the next cyclic allocation will start
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of identifiers currently allocated
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Truth that no identifier is currently allocated
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Allocate the lowest free identifier in `[min, max)`, where the bounds
    /// are relative to the allocator's base
    ///
    /// The payload is dropped if allocation fails. An empty range (including
    /// `min > max`) is reported as exhausted. The range is silently narrowed
    /// so that `max + base` does not overflow.
    pub fn alloc_range(&mut self, payload: T, min: usize, max: usize) -> Result<usize, AllocError> {
        if min > max {
            log::warn!("Inverted identifier range [{}, {})", min, max);
        }
        let index = self
            .insert_range(payload, Origin::Allocator, min, max)
            .map_err(|(error, _payload)| error)?;
        Ok(self.absolute(index))
    }

    /// Allocate the lowest free identifier
    pub fn alloc(&mut self, payload: T) -> Result<usize, AllocError> {
        self.alloc_range(payload, 0, usize::MAX)
    }

    /// Allocate the lowest free identifier at or above relative index `min`
    pub fn alloc_min(&mut self, payload: T, min: usize) -> Result<usize, AllocError> {
        self.alloc_range(payload, min, usize::MAX)
    }

    /// Allocate the lowest free identifier below relative index `max`
    pub fn alloc_max(&mut self, payload: T, max: usize) -> Result<usize, AllocError> {
        self.alloc_range(payload, 0, max)
    }

    /// Allocate an identifier in `[min, max)` using the cyclic policy
    ///
    /// The search starts at the cursor, clamped into the range, and falls back
    /// to a search over the whole range if no identifier is free above the
    /// cursor. On success, the cursor moves right past the new identifier. On
    /// failure, the payload is dropped and the cursor does not move.
    pub fn alloc_cyclic_range(&mut self, payload: T, min: usize, max: usize) -> Result<usize, AllocError> {
        if min > max {
            log::warn!("Inverted identifier range [{}, {})", min, max);
        }
        let index = self
            .insert_cyclic(payload, Origin::Allocator, min, max)
            .map_err(|(error, _payload)| error)?;
        Ok(self.absolute(index))
    }

    pub fn alloc_cyclic(&mut self, payload: T) -> Result<usize, AllocError> {
        self.alloc_cyclic_range(payload, 0, usize::MAX)
    }

    pub fn alloc_cyclic_min(&mut self, payload: T, min: usize) -> Result<usize, AllocError> {
        self.alloc_cyclic_range(payload, min, usize::MAX)
    }

    pub fn alloc_cyclic_max(&mut self, payload: T, max: usize) -> Result<usize, AllocError> {
        self.alloc_cyclic_range(payload, 0, max)
    }

    /// Release an identifier, returning its payload
    ///
    /// Returns `None` if the identifier is not currently allocated, which
    /// includes releasing the same identifier twice.
    pub fn remove(&mut self, id: usize) -> Option<T> {
        let entry = self.take_entry(id)?;
        trace!("Released identifier {}", id);
        Some(entry.payload)
    }

    /// Look up the payload associated with an identifier
    pub fn find(&self, id: usize) -> Option<&T> {
        let key = self.key_of(id)?;
        Some(&self.store[key].payload)
    }

    /// Look up the payload associated with an identifier, mutably
    pub fn find_mut(&mut self, id: usize) -> Option<&mut T> {
        let key = self.key_of(id)?;
        Some(self.store.payload_mut(key))
    }

    /// Truth that an identifier is currently allocated
    pub fn contains(&self, id: usize) -> bool {
        self.key_of(id).is_some()
    }

    /// Release every identifier, dropping the associated payloads
    ///
    /// The base and the cyclic cursor are left as they are, so cyclic
    /// allocation carries on where it left off instead of immediately reusing
    /// the identifiers that were just released.
    pub fn clear(&mut self) {
        debug!("Clearing {} identifiers", self.len());
        self.tree.clear();
        self.store.clear();
    }

    /// Iterate over (identifier, payload) pairs, by increasing identifier
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            entries: self.store.iter(),
            remaining: self.len(),
            base: self.base,
        }
    }

    /// Remove an entry from both indices
    pub(crate) fn take_entry(&mut self, id: usize) -> Option<Entry<T>> {
        let index = id.checked_sub(self.base)?;
        let key = self.tree.remove(&index)?;
        let entry = self.store.remove(key);
        self.debug_check_invariants();
        Some(entry)
    }

    /// Slot key of an identifier's entry, if allocated
    fn key_of(&self, id: usize) -> Option<usize> {
        let index = id.checked_sub(self.base)?;
        self.tree.get(&index).copied()
    }

    /// Translate a relative index into an identifier
    pub(crate) fn absolute(&self, index: usize) -> usize {
        debug_assert!(index < self.max_relative(), "Identifier is not representable");
        index + self.base
    }

    /// Exclusive upper bound on relative indices with representable identifiers
    pub(crate) fn max_relative(&self) -> usize {
        usize::MAX - self.base
    }

    /// Cheap consistency check between the two indices, for debug builds
    pub(crate) fn debug_check_invariants(&self) {
        debug_assert_eq!(self.tree.len(), self.store.len(),
                         "Ordered and sequential indices went out of sync");
        debug_assert_eq!(
            self.store.first_key().map(|key| self.store[key].index),
            self.tree.keys().next().copied(),
            "Ordered and sequential indices disagree on the lowest index"
        );
    }

    /// Full consistency check between the two indices
    ///
    /// Both indices must reference the same entries, in the same order, with
    /// strictly increasing indices, and index 0 must never be used.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let from_tree = self.tree.iter()
                                 .map(|(&index, &key)| (index, key))
                                 .collect::<Vec<_>>();
        let from_list = self.store.iter()
                                  .map(|(key, entry)| (entry.index, key))
                                  .collect::<Vec<_>>();
        assert_eq!(from_tree, from_list);
        assert!(from_list.windows(2).all(|pair| pair[0].0 < pair[1].0));
        assert!(!self.tree.contains_key(&0));
    }
}

impl<T> Default for Idr<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'idr, T> IntoIterator for &'idr Idr<T> {
    type Item = (usize, &'idr T);
    type IntoIter = Iter<'idr, T>;

    fn into_iter(self) -> Iter<'idr, T> {
        self.iter()
    }
}


/// Iterator over the identifiers of an `Idr`, see `Idr::iter()`
pub struct Iter<'idr, T> {
    entries: Entries<'idr, T>,
    remaining: usize,
    base: usize,
}

impl<'idr, T> Iterator for Iter<'idr, T> {
    type Item = (usize, &'idr T);

    fn next(&mut self) -> Option<Self::Item> {
        let (_key, entry) = self.entries.next()?;
        self.remaining -= 1;
        Some((entry.index + self.base, &entry.payload))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_offset() {
        let mut idr = Idr::with_base(100);
        assert_eq!(idr.alloc_range('a', 0, 10), Ok(101));
        assert_eq!(idr.find(101), Some(&'a'));
        assert_eq!(idr.find(1), None);
        assert_eq!(idr.find(0), None);
        assert_eq!(idr.remove(1), None);

        assert_eq!(idr.remove(101), Some('a'));
        assert_eq!(idr.find(101), None);
        assert_eq!(idr.remove(101), None);
        idr.check_invariants();
    }

    #[test]
    fn wrappers_default_bounds() {
        let mut idr = Idr::new();
        assert_eq!(idr.alloc(()), Ok(1));
        assert_eq!(idr.alloc_min((), 10), Ok(10));
        assert_eq!(idr.alloc_max((), 3), Ok(2));
        assert_eq!(idr.alloc_max((), 3),
                   Err(AllocError::Exhausted { min: 0, max: 3 }));

        assert_eq!(idr.alloc_cyclic_min((), 20), Ok(20));
        assert_eq!(idr.alloc_cyclic(()), Ok(21));
        assert_eq!(idr.alloc_cyclic_max((), 12), Ok(3));
        idr.check_invariants();
    }

    #[test]
    fn inverted_range() {
        let mut idr = Idr::new();
        assert_eq!(idr.alloc_range((), 5, 2),
                   Err(AllocError::Exhausted { min: 5, max: 2 }));
        assert_eq!(idr.alloc_cyclic_range((), 5, 2),
                   Err(AllocError::Exhausted { min: 5, max: 2 }));
        assert!(idr.is_empty());
        assert_eq!(idr.cursor(), 0);
    }

    #[test]
    fn find_mut_and_contains() {
        let mut idr = Idr::new();
        let id = idr.alloc(String::from("abc")).unwrap();
        idr.find_mut(id).unwrap().push('d');
        assert_eq!(idr.find(id).map(String::as_str), Some("abcd"));
        assert!(idr.contains(id));
        assert!(!idr.contains(id + 1));
        assert!(idr.find_mut(id + 1).is_none());
    }

    #[test]
    fn clear_keeps_base_and_cursor() {
        let mut idr = Idr::with_base(7);
        for _ in 0..5 {
            idr.alloc_cyclic(()).unwrap();
        }
        assert_eq!(idr.cursor(), 6);

        idr.clear();
        assert!(idr.is_empty());
        assert_eq!(idr.iter().count(), 0);
        assert_eq!(idr.base(), 7);
        assert_eq!(idr.cursor(), 6);
        idr.check_invariants();

        assert_eq!(idr.alloc(()), Ok(8));
        assert_eq!(idr.alloc_cyclic(()), Ok(13));
    }

    #[test]
    fn iterate_in_order() {
        let mut idr = Idr::with_base(1000);
        idr.alloc_min('c', 30).unwrap();
        idr.alloc_min('a', 10).unwrap();
        idr.alloc_min('b', 20).unwrap();
        idr.alloc('z').unwrap();

        let iter = idr.iter();
        assert_eq!(iter.len(), 4);
        assert_eq!(
            iter.collect::<Vec<_>>(),
            vec![(1001, &'z'), (1010, &'a'), (1020, &'b'), (1030, &'c')]
        );
        assert_eq!((&idr).into_iter().map(|(id, _)| id).last(), Some(1030));
    }

    #[test]
    fn drop_releases_payloads() {
        use std::rc::Rc;

        let payload = Rc::new(());
        let mut idr = Idr::new();
        for _ in 0..10 {
            idr.alloc(Rc::clone(&payload)).unwrap();
        }
        idr.alloc_node(IdrNode::new(Rc::clone(&payload))).unwrap();
        assert_eq!(Rc::strong_count(&payload), 12);

        // Failed allocations do not leak their payload
        assert!(idr.alloc_max(Rc::clone(&payload), 5).is_err());
        assert_eq!(Rc::strong_count(&payload), 12);

        idr.remove(3);
        assert_eq!(Rc::strong_count(&payload), 11);
        drop(idr);
        assert_eq!(Rc::strong_count(&payload), 1);
    }
}
