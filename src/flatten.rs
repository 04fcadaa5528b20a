//! Flattened view of the forest.

use slotmap::SecondaryMap;
use tracing::trace;

use crate::forest::Forest;
use crate::id::NodeId;

/// Entry of the flattened view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FlatEntry {
    /// Node.
    pub(crate) id: NodeId,
    /// Number of ancestors.
    pub(crate) depth: usize,
}

/// Depth-first pre-order sequence of all nodes in the forest.
///
/// This is a pure function of the forest, and must be rebuilt after the
/// forest structure changes.
#[derive(Debug, Clone, Default)]
pub(crate) struct FlattenedView {
    /// Entries in order.
    entries: Vec<FlatEntry>,
    /// Position of each node in `entries`.
    positions: SecondaryMap<NodeId, usize>,
}

impl FlattenedView {
    /// Walks the forest and creates the view.
    #[must_use]
    pub(crate) fn build<K, T>(forest: &Forest<K, T>) -> Self {
        let mut entries = Vec::with_capacity(forest.len());
        let mut positions = SecondaryMap::with_capacity(forest.len());
        for (position, (id, depth)) in forest.pre_order().enumerate() {
            entries.push(FlatEntry { id, depth });
            positions.insert(id, position);
        }
        debug_assert_eq!(
            entries.len(),
            forest.len(),
            "[consistency] every node must be reachable from the roots"
        );
        trace!(len = entries.len(), "rebuilt flattened view");

        Self { entries, positions }
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the entry at the given position.
    #[inline]
    #[must_use]
    pub(crate) fn get(&self, index: usize) -> Option<FlatEntry> {
        self.entries.get(index).copied()
    }

    /// Returns the position of the node.
    #[inline]
    #[must_use]
    pub(crate) fn position(&self, id: NodeId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Returns all entries in order.
    #[inline]
    #[must_use]
    pub(crate) fn entries(&self) -> &[FlatEntry] {
        &self.entries
    }
}
