//! Node.

use crate::comparator::SiblingGroup;
use crate::id::NodeId;

/// A node in the forest.
///
/// Nodes are owned by the arena of the forest and refer to each other by
/// [`NodeId`]s, so parent-child links never form ownership cycles.
#[derive(Debug)]
pub(crate) struct Node<K, T> {
    /// Caller-supplied key.
    key: K,
    /// Payload.
    data: T,
    /// Parent node.
    ///
    /// `None` if the node is a root.
    parent: Option<NodeId>,
    /// Children in order.
    children: SiblingGroup<T>,
}

impl<K, T> Node<K, T> {
    /// Creates a new node without links.
    #[inline]
    #[must_use]
    pub(super) fn new(key: K, data: T) -> Self {
        Self {
            key,
            data,
            parent: None,
            children: SiblingGroup::new(),
        }
    }

    /// Returns the key.
    #[inline]
    #[must_use]
    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    /// Returns a reference to the payload.
    #[inline]
    #[must_use]
    pub(crate) fn data(&self) -> &T {
        &self.data
    }

    /// Returns a mutable reference to the payload.
    #[inline]
    #[must_use]
    pub(crate) fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// Returns the node ID of the parent.
    #[inline]
    #[must_use]
    pub(crate) fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Sets the parent.
    ///
    /// It is caller's responsibility to keep the sibling groups consistent.
    #[inline]
    pub(super) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    /// Returns the children group.
    #[inline]
    #[must_use]
    pub(crate) fn children(&self) -> &SiblingGroup<T> {
        &self.children
    }

    /// Returns the mutable children group.
    #[inline]
    #[must_use]
    pub(super) fn children_mut(&mut self) -> &mut SiblingGroup<T> {
        &mut self.children
    }

    /// Consumes the node and returns the key and the payload.
    #[inline]
    #[must_use]
    pub(super) fn into_entry(self) -> (K, T) {
        (self.key, self.data)
    }
}
