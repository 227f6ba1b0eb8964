//! Mechanism for configuring an `Idr`, with proper invariant checking

use crate::Idr;


/// Builder for an identifier allocator
//
// NOTE: Every setting may only be specified once.
#[derive(Debug, Default)]
pub struct Builder {
    /// Offset added to every relative index to produce identifiers
    /// - Will be set to 0 if unspecified
    base: Option<usize>,

    /// Number of entries for which storage is reserved upfront
    /// - Will be set to 0 if unspecified
    capacity: Option<usize>,

    /// Maximal number of live entries created by the allocator itself
    /// - Unbounded if unspecified
    /// - Entries handed over by the caller as `IdrNode`s do not count
    max_entries: Option<usize>,
}

impl Builder {
    /// Start building an allocator
    pub const fn new() -> Self {
        Self {
            base: None,
            capacity: None,
            max_entries: None,
        }
    }

    /// Set the allocator's base
    ///
    /// Identifiers handed out by the allocator are relative indices plus this
    /// offset. Since relative index 0 is never allocated, the lowest
    /// identifier that can be handed out is `base + 1`.
    pub fn base(&mut self, base: usize) -> &mut Self {
        assert!(self.base.replace(base).is_none(),
                "Base must only be set once");
        self
    }

    /// Reserve storage for this many entries upfront
    ///
    /// Storage will still grow on demand past this point, unless a budget is
    /// set with `max_entries()`.
    pub fn capacity(&mut self, capacity: usize) -> &mut Self {
        assert!(self.capacity.replace(capacity).is_none(),
                "Capacity must only be set once");
        self
    }

    /// Bound the number of entries that the allocator may create
    ///
    /// Once that many allocator-created entries are live, the `alloc*` family
    /// of methods fails with `AllocError::OutOfMemory` until some of them are
    /// released. The `alloc_node*` family is not affected.
    pub fn max_entries(&mut self, max_entries: usize) -> &mut Self {
        assert!(self.max_entries.replace(max_entries).is_none(),
                "Entry budget must only be set once");
        self
    }

    /// Build the previously configured allocator
    pub fn build<T>(&self) -> Idr<T> {
        let base = self.base.unwrap_or(0);
        let mut capacity = self.capacity.unwrap_or(0);

        // There is no point in reserving storage that cannot be used
        if let Some(max_entries) = self.max_entries {
            capacity = capacity.min(max_entries);
        }

        Idr::from_parts(base, capacity, self.max_entries)
    }
}
