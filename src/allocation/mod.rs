//! Insertion of new entries into both indices, and the cyclic policy

use crate::{
    error::AllocError,
    hole::{self, Hole},
    store::Origin,
    Idr,
};

use log::{debug, trace};


impl<T> Idr<T> {
    /// Insert a payload at the lowest free relative index in `[min, max)`
    ///
    /// Returns the relative index on success. On failure, the payload is given
    /// back along with the reason, and the allocator is left untouched.
    pub(crate) fn insert_range(
        &mut self,
        payload: T,
        origin: Origin,
        min: usize,
        max: usize,
    ) -> Result<usize, (AllocError, T)> {
        if !self.store.can_create(origin) {
            debug!("No storage left for a new entry");
            return Err((AllocError::OutOfMemory, payload));
        }

        match self.search(min, max) {
            Some(hole) => Ok(self.splice(hole, payload, origin)),
            None => {
                debug!("Relative range [{}, {}) is exhausted", min, max);
                Err((AllocError::Exhausted { min, max }, payload))
            }
        }
    }

    /// Insert a payload using the cyclic policy over `[min, max)`
    ///
    /// The search starts at the cursor (brought back within the range) and
    /// wraps around to `min` once if nothing is free above the cursor. On
    /// success, the cursor moves right past the new index.
    pub(crate) fn insert_cyclic(
        &mut self,
        payload: T,
        origin: Origin,
        min: usize,
        max: usize,
    ) -> Result<usize, (AllocError, T)> {
        if !self.store.can_create(origin) {
            debug!("No storage left for a new entry");
            return Err((AllocError::OutOfMemory, payload));
        }

        let start = self.cursor.max(min).min(max);
        let hole = match self.search(start, max) {
            Some(hole) => hole,
            None => {
                trace!("Cyclic search wraps around from {} to {}", start, min);
                match self.search(min, max) {
                    Some(hole) => hole,
                    None => {
                        debug!("Relative range [{}, {}) is exhausted", min, max);
                        return Err((AllocError::Exhausted { min, max }, payload));
                    }
                }
            }
        };

        let index = self.splice(hole, payload, origin);

        // Cannot overflow, since index is below an exclusive bound
        self.cursor = index + 1;
        Ok(index)
    }

    /// Search for a free relative index whose identifier is representable
    fn search(&self, min: usize, max: usize) -> Option<Hole> {
        let max = max.min(self.max_relative());
        hole::search(&self.tree, &self.store, min, max)
    }

    /// Create an entry at a hole and link it into both indices
    fn splice(&mut self, hole: Hole, payload: T, origin: Origin) -> usize {
        let key = self.store.insert(hole.index, payload, origin, hole.link);
        let displaced = self.tree.insert(hole.index, key);
        debug_assert!(displaced.is_none(), "Hole search returned a used index");
        self.debug_check_invariants();
        trace!("Allocated relative index {}", hole.index);
        hole.index
    }
}
