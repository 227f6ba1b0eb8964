//! Caller-owned entry records, and the allocation family that consumes them
//!
//! The `alloc*` family of `Idr` creates entries on the caller's behalf, which
//! can fail when the entry storage budget is used up. This family lets the
//! caller build the `IdrNode` ahead of time (typically as part of a larger
//! record) and hand it over: the allocator only ever fails with exhaustion,
//! in which case the node is given back, and `remove_node()` returns the node
//! instead of dropping it.

use crate::{
    error::{AllocError, NodeAllocError},
    store::Origin,
    Idr,
};

use log::trace;


/// Caller-owned identifier record
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct IdrNode<T> {
    /// Relative index that was assigned to this node, if any
    index: Option<usize>,

    /// Caller payload
    payload: T,
}

impl<T> IdrNode<T> {
    /// Wrap a payload into a node which can be inserted into an `Idr`
    pub const fn new(payload: T) -> Self {
        Self { index: None, payload }
    }

    /// Relative index (identifier minus the allocator's base) that this node
    /// held, if it went through an `Idr`
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut T {
        &mut self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl<T> From<T> for IdrNode<T> {
    fn from(payload: T) -> Self {
        Self::new(payload)
    }
}


impl<T> Idr<T> {
    /// Insert a caller-owned node at the lowest free identifier in
    /// `[min, max)` (relative bounds), returning that identifier
    pub fn alloc_node_range(
        &mut self,
        node: IdrNode<T>,
        min: usize,
        max: usize,
    ) -> Result<usize, NodeAllocError<T>> {
        let IdrNode { index: previous, payload } = node;
        let index = self
            .insert_range(payload, Origin::Caller, min, max)
            .map_err(|(error, payload)| give_back(error, previous, payload))?;
        Ok(self.absolute(index))
    }

    /// Insert a caller-owned node at the lowest free identifier
    pub fn alloc_node(&mut self, node: IdrNode<T>) -> Result<usize, NodeAllocError<T>> {
        self.alloc_node_range(node, 0, usize::MAX)
    }

    /// Insert a caller-owned node at the lowest free identifier at or above
    /// relative index `min`
    pub fn alloc_node_min(&mut self, node: IdrNode<T>, min: usize) -> Result<usize, NodeAllocError<T>> {
        self.alloc_node_range(node, min, usize::MAX)
    }

    /// Insert a caller-owned node at the lowest free identifier below
    /// relative index `max`
    pub fn alloc_node_max(&mut self, node: IdrNode<T>, max: usize) -> Result<usize, NodeAllocError<T>> {
        self.alloc_node_range(node, 0, max)
    }

    /// Insert a caller-owned node using the cyclic policy over `[min, max)`
    ///
    /// See `Idr::alloc_cyclic_range()` for the allocation policy.
    pub fn alloc_node_cyclic_range(
        &mut self,
        node: IdrNode<T>,
        min: usize,
        max: usize,
    ) -> Result<usize, NodeAllocError<T>> {
        let IdrNode { index: previous, payload } = node;
        let index = self
            .insert_cyclic(payload, Origin::Caller, min, max)
            .map_err(|(error, payload)| give_back(error, previous, payload))?;
        Ok(self.absolute(index))
    }

    pub fn alloc_node_cyclic(&mut self, node: IdrNode<T>) -> Result<usize, NodeAllocError<T>> {
        self.alloc_node_cyclic_range(node, 0, usize::MAX)
    }

    pub fn alloc_node_cyclic_min(
        &mut self,
        node: IdrNode<T>,
        min: usize,
    ) -> Result<usize, NodeAllocError<T>> {
        self.alloc_node_cyclic_range(node, min, usize::MAX)
    }

    pub fn alloc_node_cyclic_max(
        &mut self,
        node: IdrNode<T>,
        max: usize,
    ) -> Result<usize, NodeAllocError<T>> {
        self.alloc_node_cyclic_range(node, 0, max)
    }

    /// Release an identifier, handing its record back to the caller
    ///
    /// Works for identifiers from either allocation family. Returns `None` if
    /// the identifier is not currently allocated.
    pub fn remove_node(&mut self, id: usize) -> Option<IdrNode<T>> {
        let entry = self.take_entry(id)?;
        trace!("Handed node back from identifier {}", id);
        Some(IdrNode {
            index: Some(entry.index),
            payload: entry.payload,
        })
    }
}

/// Rebuild a node that could not be inserted
fn give_back<T>(error: AllocError, index: Option<usize>, payload: T) -> NodeAllocError<T> {
    NodeAllocError {
        error,
        node: IdrNode { index, payload },
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::Builder;

    #[test]
    fn node_round_trip() {
        let mut idr = Idr::with_base(10);
        let id = idr.alloc_node(IdrNode::new("first")).unwrap();
        assert_eq!(id, 11);
        assert_eq!(idr.find(11), Some(&"first"));

        let node = idr.remove_node(11).unwrap();
        assert_eq!(node.index(), Some(1));
        assert_eq!(node.payload(), &"first");
        assert_eq!(idr.remove_node(11), None);
        assert!(idr.is_empty());

        // A node can be inserted again after it was handed back
        assert_eq!(idr.alloc_node_min(node, 5).unwrap(), 15);
    }

    #[test]
    fn node_given_back_on_exhaustion() {
        let mut idr = Idr::new();
        assert_eq!(idr.alloc_node_max(IdrNode::new(1), 2).unwrap(), 1);

        let err = idr.alloc_node_range(IdrNode::new(2), 0, 2).unwrap_err();
        assert_eq!(err.error, AllocError::Exhausted { min: 0, max: 2 });
        assert_eq!(err.into_node(), IdrNode::new(2));

        let err = idr.alloc_node_cyclic_max(IdrNode::new(3), 2).unwrap_err();
        assert_eq!(err.node.into_payload(), 3);
        assert_eq!(idr.len(), 1);
    }

    #[test]
    fn nodes_ignore_storage_budget() {
        let mut idr = Builder::new().max_entries(1).build();
        assert_eq!(idr.alloc('a'), Ok(1));
        assert_eq!(idr.alloc('b'), Err(AllocError::OutOfMemory));
        assert_eq!(idr.alloc_node('c'.into()).ok(), Some(2));
        assert_eq!(idr.alloc_node_cyclic(IdrNode::new('d')).ok(), Some(3));

        // Caller-owned entries do not free up budget when released...
        assert_eq!(idr.remove(3), Some('d'));
        assert_eq!(idr.alloc('e'), Err(AllocError::OutOfMemory));

        // ...but allocator-owned ones do, whichever family releases them
        assert_eq!(idr.remove_node(1).map(IdrNode::into_payload), Some('a'));
        assert_eq!(idr.alloc('f'), Ok(1));
    }

    #[test]
    fn node_payload_access() {
        let mut node = IdrNode::from(vec![1, 2]);
        node.payload_mut().push(3);
        assert_eq!(node.index(), None);
        assert_eq!(node.into_payload(), vec![1, 2, 3]);
    }
}
