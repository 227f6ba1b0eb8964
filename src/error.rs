//! Ways in which identifier allocation can fail

use crate::node::IdrNode;

use thiserror::Error;


/// Identifier allocation failure
///
/// Allocation never leaves a partial result behind: when one of these errors
/// is reported, the allocator is in the same state as before the call.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum AllocError {
    /// Every identifier of the requested range is in use
    ///
    /// Bounds are relative to the allocator's base, as they were requested.
    #[error("no free identifier in relative range [{min}, {max})")]
    Exhausted { min: usize, max: usize },

    /// The entry storage budget set with `Builder::max_entries()` is used up
    #[error("entry storage budget is exhausted")]
    OutOfMemory,
}

/// Caller-owned node allocation failure
///
/// Gives the node back, so that the caller keeps ownership of it.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct NodeAllocError<T> {
    /// Why allocation failed
    pub error: AllocError,

    /// The node that could not be inserted, untouched
    pub node: IdrNode<T>,
}

impl<T> NodeAllocError<T> {
    /// Recover the node that could not be inserted
    pub fn into_node(self) -> IdrNode<T> {
        self.node
    }
}
