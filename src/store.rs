//! Entry storage, and the sequential index threaded through it
//!
//! Every live identifier is backed by one `Entry`, stored in a slab arena so
//! that it keeps a stable slot key for as long as it is live. The entries are
//! additionally chained into a doubly linked list, in strictly increasing
//! relative index order, which is what lets the free-range search step from
//! an identifier to its successor in O(1).
//!
//! The ordered index (see `Idr`) maps relative indices to the same slot keys,
//! so both indices reference the arena without owning anything themselves.

use slab::Slab;

use std::ops::Index;


/// Party responsible for an entry's storage
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Origin {
    /// Entry was created by the allocator on behalf of the caller, and counts
    /// against the storage budget (if any)
    Allocator,

    /// Entry was handed over by the caller as an `IdrNode`, and will be handed
    /// back on removal
    Caller,
}

/// One allocated identifier slot
#[derive(Debug)]
pub(crate) struct Entry<T> {
    /// Identifier of this entry, relative to the allocator's base
    pub index: usize,

    /// Caller-provided payload, never interpreted by the allocator
    pub payload: T,

    /// Which side is responsible for this entry's storage
    pub origin: Origin,

    // Sequential index links (slot keys of the neighbouring entries)
    prev: Option<usize>,
    next: Option<usize>,
}

/// Position at which a new entry is spliced into the sequential index
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Link {
    /// Right before the entry with this slot key
    Before(usize),

    /// After the last entry (or as the only entry of an empty list)
    Tail,
}

/// Arena of entries, chained in increasing index order
#[derive(Debug)]
pub(crate) struct Store<T> {
    /// Entry storage
    slots: Slab<Entry<T>>,

    /// Slot key of the entry with the lowest index, if any
    head: Option<usize>,

    /// Slot key of the entry with the highest index, if any
    tail: Option<usize>,

    /// Number of live entries with `Origin::Allocator`
    num_owned: usize,

    /// Maximal number of live entries with `Origin::Allocator`, if bounded
    max_owned: Option<usize>,
}

impl<T> Store<T> {
    /// Set up an empty store with room for `capacity` entries
    pub fn new(capacity: usize, max_owned: Option<usize>) -> Self {
        Self {
            slots: Slab::with_capacity(capacity),
            head: None,
            tail: None,
            num_owned: 0,
            max_owned,
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Truth that an entry of this origin can be created right now
    ///
    /// Only allocator-owned entries are subjected to the storage budget, since
    /// the caller has already paid for the storage of the others.
    pub fn can_create(&self, origin: Origin) -> bool {
        match (origin, self.max_owned) {
            (Origin::Allocator, Some(max_owned)) => self.num_owned < max_owned,
            _ => true,
        }
    }

    /// Slot key of the first entry in index order, if any
    pub fn first_key(&self) -> Option<usize> {
        self.head
    }

    /// Slot key of the entry that follows `key` in index order, if any
    pub fn next_key(&self, key: usize) -> Option<usize> {
        self.slots[key].next
    }

    /// Insertion point right after the entry at `key`
    pub fn link_after(&self, key: usize) -> Link {
        self.next_key(key).map_or(Link::Tail, Link::Before)
    }

    /// Insertion point before every other entry
    pub fn link_first(&self) -> Link {
        self.head.map_or(Link::Tail, Link::Before)
    }

    /// Access an entry's payload mutably
    pub fn payload_mut(&mut self, key: usize) -> &mut T {
        &mut self.slots[key].payload
    }

    /// Create an entry and splice it into the sequential index at `link`
    ///
    /// Returns the slot key of the new entry. The caller is responsible for
    /// picking a `link` which keeps the list sorted by index, and for checking
    /// `can_create()` beforehand.
    pub fn insert(&mut self, index: usize, payload: T, origin: Origin, link: Link) -> usize {
        debug_assert!(self.can_create(origin), "Entry storage budget exceeded");

        let (prev, next) = match link {
            Link::Before(next) => (self.slots[next].prev, Some(next)),
            Link::Tail => (self.tail, None),
        };

        // Check that the list stays sorted in debug builds
        if let Some(prev) = prev {
            debug_assert!(self.slots[prev].index < index,
                          "Entry spliced before a lower-index entry");
        }
        if let Some(next) = next {
            debug_assert!(self.slots[next].index > index,
                          "Entry spliced after a higher-index entry");
        }

        let key = self.slots.insert(Entry { index, payload, origin, prev, next });
        match prev {
            Some(prev) => self.slots[prev].next = Some(key),
            None => self.head = Some(key),
        }
        match next {
            Some(next) => self.slots[next].prev = Some(key),
            None => self.tail = Some(key),
        }
        if origin == Origin::Allocator {
            self.num_owned += 1;
        }
        key
    }

    /// Unlink the entry at `key` from the sequential index and take it out
    pub fn remove(&mut self, key: usize) -> Entry<T> {
        let entry = self.slots.remove(key);
        match entry.prev {
            Some(prev) => self.slots[prev].next = entry.next,
            None => self.head = entry.next,
        }
        match entry.next {
            Some(next) => self.slots[next].prev = entry.prev,
            None => self.tail = entry.prev,
        }
        if entry.origin == Origin::Allocator {
            self.num_owned -= 1;
        }
        entry
    }

    /// Drop every entry, keeping the arena's storage around for reuse
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
        self.num_owned = 0;
    }

    /// Iterate over (slot key, entry) pairs in sequential index order
    pub fn iter(&self) -> Entries<'_, T> {
        Entries { store: self, cursor: self.head }
    }
}

impl<T> Index<usize> for Store<T> {
    type Output = Entry<T>;

    fn index(&self, key: usize) -> &Entry<T> {
        &self.slots[key]
    }
}


/// Walk through the sequential index
pub(crate) struct Entries<'store, T> {
    store: &'store Store<T>,
    cursor: Option<usize>,
}

impl<'store, T> Iterator for Entries<'store, T> {
    type Item = (usize, &'store Entry<T>);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.cursor?;
        let entry = &self.store[key];
        self.cursor = entry.next;
        Some((key, entry))
    }
}
