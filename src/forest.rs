//! Forest of keyed nodes with comparator-ordered sibling groups.

#[cfg(feature = "debug-print")]
mod debug_print;
mod node;
pub(crate) mod traverse;

use core::hash::Hash;

use std::collections::HashMap;

use slotmap::SlotMap;
use tracing::trace;

use crate::comparator::{Comparator, SiblingGroup};
use crate::error::{TreeError, TreeResult};
use crate::id::NodeId;

#[cfg(feature = "debug-print")]
pub use self::debug_print::DebugPrint;
pub(crate) use self::node::Node;
use self::traverse::{Ancestors, PreOrder};

/// Forest.
///
/// Owns all nodes, the key to node lookup, and the root group.
///
/// Mutating methods take node IDs resolved in advance by the `resolve_*`
/// methods, so that every fallible check happens before any state changes.
#[derive(Debug)]
pub(crate) struct Forest<K, T> {
    /// Node storage.
    nodes: SlotMap<NodeId, Node<K, T>>,
    /// Key to node lookup.
    by_key: HashMap<K, NodeId>,
    /// Root nodes.
    roots: SiblingGroup<T>,
}

impl<K, T> Forest<K, T> {
    /// Returns the number of nodes.
    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the node.
    #[inline]
    #[must_use]
    pub(crate) fn node(&self, id: NodeId) -> Option<&Node<K, T>> {
        self.nodes.get(id)
    }

    /// Returns the root group.
    #[inline]
    #[must_use]
    pub(crate) fn roots(&self) -> &SiblingGroup<T> {
        &self.roots
    }

    /// Returns the sibling group under the given parent, or the root group.
    ///
    /// # Panics
    ///
    /// Panics if the parent is not alive.
    #[must_use]
    pub(crate) fn group(&self, parent: Option<NodeId>) -> &SiblingGroup<T> {
        match parent {
            Some(parent) => self
                .node(parent)
                .expect("[precondition] the parent must be alive")
                .children(),
            None => &self.roots,
        }
    }

    /// Returns the mutable sibling group under the given parent, or the root group.
    ///
    /// # Panics
    ///
    /// Panics if the parent is not alive.
    #[must_use]
    fn group_mut(&mut self, parent: Option<NodeId>) -> &mut SiblingGroup<T> {
        match parent {
            Some(parent) => self
                .nodes
                .get_mut(parent)
                .expect("[precondition] the parent must be alive")
                .children_mut(),
            None => &mut self.roots,
        }
    }

    /// Returns the payload of the node.
    #[must_use]
    fn data_of(&self, id: NodeId) -> &T {
        self.nodes
            .get(id)
            .expect("[consistency] members of a sibling group must be alive")
            .data()
    }

    /// Returns an iterator of the whole forest in depth-first pre-order.
    #[inline]
    #[must_use]
    pub(crate) fn pre_order(&self) -> PreOrder<'_, K, T> {
        PreOrder::new(self)
    }

    /// Returns an iterator of the node and its ancestors.
    #[inline]
    #[must_use]
    pub(crate) fn ancestors(&self, id: NodeId) -> Ancestors<'_, K, T> {
        Ancestors::with_start(self, id)
    }

    /// Returns the number of ancestors of the node.
    #[must_use]
    pub(crate) fn depth(&self, id: NodeId) -> usize {
        // The iterator yields the node itself first.
        self.ancestors(id).count() - 1
    }

    /// Returns true if `ancestor` is `node` itself or one of its ancestors.
    #[must_use]
    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|id| id == ancestor)
    }

    /// Puts a detached node into the sibling group under `parent`.
    ///
    /// If `comparator` is given, it is bound to the group and the existing
    /// members are re-sorted by it before the node is placed. Passing the
    /// comparator already bound to the group (or its clone) re-sorts nothing.
    fn attach(&mut self, id: NodeId, parent: Option<NodeId>, comparator: Option<Comparator<T>>) {
        let (position, resorted) = {
            let group = self.group(parent);
            let comparator = comparator.as_ref().filter(|cmp| {
                !group
                    .comparator()
                    .map_or(false, |bound| bound.ptr_eq(cmp))
            });
            let resorted = comparator
                .map(|cmp| (cmp.clone(), group.sorted_by(cmp, |member| self.data_of(member))));
            let position = group.position_for(
                self.data_of(id),
                comparator,
                resorted.as_ref().map(|(_, sorted)| sorted.as_slice()),
                |member| self.data_of(member),
            );
            (position, resorted)
        };

        let group = self.group_mut(parent);
        if let Some((cmp, sorted)) = resorted {
            group.rebind(cmp, sorted);
        }
        group.insert_at(position, id);
        self.nodes
            .get_mut(id)
            .expect("[precondition] the node must be alive")
            .set_parent(parent);
        trace!(?id, ?parent, position, "attached node");
    }

    /// Removes the node from its sibling group and makes it parentless.
    ///
    /// The node is not in any group after this, so it is not reachable from
    /// the roots until attached again.
    fn detach(&mut self, id: NodeId) {
        let parent = self
            .node(id)
            .expect("[precondition] the node must be alive")
            .parent();
        let removed = self.group_mut(parent).remove(id);
        debug_assert!(
            removed.is_some(),
            "[consistency] a node must be a member of its parent's group"
        );
        self.nodes
            .get_mut(id)
            .expect("[precondition] the node must be alive")
            .set_parent(None);
    }
}

impl<K: Eq + Hash, T> Forest<K, T> {
    /// Creates a new empty forest with the given capacity.
    #[must_use]
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(capacity),
            by_key: HashMap::with_capacity(capacity),
            roots: SiblingGroup::new(),
        }
    }

    /// Returns the node ID for the key.
    #[inline]
    #[must_use]
    pub(crate) fn id_of(&self, key: &K) -> Option<NodeId> {
        self.by_key.get(key).copied()
    }

    /// Resolves the key of an existing node.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownKey`] if the key is not found.
    pub(crate) fn resolve(&self, key: &K) -> TreeResult<NodeId> {
        self.id_of(key).ok_or(TreeError::UnknownKey)
    }

    /// Resolves an optional parent key.
    fn resolve_parent(&self, parent: Option<&K>) -> TreeResult<Option<NodeId>> {
        parent
            .map(|parent| self.id_of(parent).ok_or(TreeError::UnknownParent))
            .transpose()
    }

    /// Checks that a new node can be added and resolves its parent.
    ///
    /// # Errors
    ///
    /// * [`TreeError::DuplicateKey`] if the key is already in use.
    /// * [`TreeError::CyclicParent`] if the parent key is the key itself.
    /// * [`TreeError::UnknownParent`] if the parent key is not found.
    pub(crate) fn resolve_new(&self, key: &K, parent: Option<&K>) -> TreeResult<Option<NodeId>> {
        if self.by_key.contains_key(key) {
            return Err(TreeError::DuplicateKey);
        }
        if parent == Some(key) {
            return Err(TreeError::CyclicParent);
        }
        self.resolve_parent(parent)
    }

    /// Checks that the node can be moved under the new parent and resolves both.
    ///
    /// # Errors
    ///
    /// * [`TreeError::UnknownKey`] if the key is not found.
    /// * [`TreeError::UnknownParent`] if the parent key is not found.
    /// * [`TreeError::CyclicParent`] if the new parent is the node itself or
    ///   one of its descendants.
    pub(crate) fn resolve_reparent(
        &self,
        key: &K,
        parent: Option<&K>,
    ) -> TreeResult<(NodeId, Option<NodeId>)> {
        let id = self.resolve(key)?;
        let parent = self.resolve_parent(parent)?;
        if let Some(parent) = parent {
            if self.is_ancestor_or_self(id, parent) {
                return Err(TreeError::CyclicParent);
            }
        }
        Ok((id, parent))
    }

    /// Creates a node and puts it into the sibling group under `parent`.
    ///
    /// The key must be unused and the parent must be alive (see
    /// [`resolve_new`][`Self::resolve_new`]).
    pub(crate) fn insert(
        &mut self,
        key: K,
        data: T,
        parent: Option<NodeId>,
        comparator: Option<Comparator<T>>,
    ) -> NodeId
    where
        K: Clone,
    {
        debug_assert!(
            !self.by_key.contains_key(&key),
            "[precondition] the key must not be in use"
        );
        let id = self.nodes.insert(Node::new(key.clone(), data));
        self.by_key.insert(key, id);
        self.attach(id, parent, comparator);
        id
    }

    /// Moves the node with its subtree into the sibling group under `parent`.
    ///
    /// The node is placed by the comparator of the destination group.
    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.detach(id);
        self.attach(id, parent, None);
    }

    /// Removes the node and all of its descendants.
    ///
    /// Returns the keys and the payloads of the removed nodes in pre-order.
    pub(crate) fn remove(&mut self, id: NodeId) -> Vec<(K, T)> {
        self.detach(id);
        let subtree = PreOrder::with_toplevel(self, id)
            .map(|(id, _depth)| id)
            .collect::<Vec<_>>();
        trace!(?id, removed = subtree.len(), "removing subtree");

        subtree
            .into_iter()
            .map(|id| {
                let (key, data) = self
                    .nodes
                    .remove(id)
                    .expect("[consistency] nodes in the subtree must be alive")
                    .into_entry();
                self.by_key.remove(&key);
                (key, data)
            })
            .collect()
    }

    /// Returns a mutable reference to the payload of the node.
    #[inline]
    #[must_use]
    pub(crate) fn data_mut(&mut self, key: &K) -> Option<&mut T> {
        let id = self.id_of(key)?;
        self.nodes.get_mut(id).map(Node::data_mut)
    }
}

impl<K: Eq + Hash, T> Default for Forest<K, T> {
    #[inline]
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
