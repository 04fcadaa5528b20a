//! Node ID.

use slotmap::new_key_type;

new_key_type! {
    /// Node ID.
    ///
    /// Node IDs are slots in the arena of a single [`TreeManager`][`crate::TreeManager`]
    /// and are never exposed to the users: nodes are addressed by the
    /// caller-supplied keys. A removed node's slot may be reused, but the
    /// generation part of the ID makes stale IDs resolve to nothing.
    pub(crate) struct NodeId;
}
