//! Forest traversal.

use core::iter;

use crate::forest::Forest;
use crate::id::NodeId;

/// Iterator for depth-first pre-order traversal of the whole forest.
///
/// Values returned by the iterator are pairs of a node ID and the depth.
/// Root nodes are depth 0. Each sibling group is visited in its order.
#[derive(Debug, Clone)]
pub(crate) struct PreOrder<'a, K, T> {
    /// Forest.
    forest: &'a Forest<K, T>,
    /// Nodes to visit, the next one at the top.
    stack: Vec<(NodeId, usize)>,
}

impl<'a, K, T> PreOrder<'a, K, T> {
    /// Creates a new iterator starting from the root group.
    #[must_use]
    pub(super) fn new(forest: &'a Forest<K, T>) -> Self {
        // Push in reverse order for left-to-right traversal.
        let stack = forest
            .roots()
            .members()
            .iter()
            .rev()
            .map(|&id| (id, 0))
            .collect();
        Self { forest, stack }
    }

    /// Creates a new iterator over the subtree of the node, including itself.
    ///
    /// The given node is reported as depth 0.
    #[must_use]
    pub(super) fn with_toplevel(forest: &'a Forest<K, T>, id: NodeId) -> Self {
        Self {
            forest,
            stack: vec![(id, 0)],
        }
    }
}

impl<K, T> Iterator for PreOrder<'_, K, T> {
    type Item = (NodeId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;
        let node = self
            .forest
            .node(id)
            .expect("[consistency] the node being traversed must be alive");
        self.stack.extend(
            node.children()
                .members()
                .iter()
                .rev()
                .map(|&child| (child, depth + 1)),
        );
        Some((id, depth))
    }
}

impl<K, T> iter::FusedIterator for PreOrder<'_, K, T> {}

/// Ancestors iterator.
///
/// Note that this returns the starting node first.
#[derive(Debug, Clone)]
pub(crate) struct Ancestors<'a, K, T> {
    /// Forest.
    forest: &'a Forest<K, T>,
    /// Next node to emit.
    next: Option<NodeId>,
}

impl<'a, K, T> Ancestors<'a, K, T> {
    /// Creates an iterator from the node.
    #[inline]
    #[must_use]
    pub(super) fn with_start(forest: &'a Forest<K, T>, id: NodeId) -> Self {
        Self {
            forest,
            next: Some(id),
        }
    }
}

impl<K, T> Iterator for Ancestors<'_, K, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.next?;
        self.next = self
            .forest
            .node(next)
            .expect("[consistency] the node being traversed must be alive")
            .parent();

        Some(next)
    }
}

impl<K, T> iter::FusedIterator for Ancestors<'_, K, T> {}
