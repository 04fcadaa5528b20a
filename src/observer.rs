//! Observer of structural changes.

use crate::manager::TreeManager;

/// Kind of a structural change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    /// A node appeared in the flattened view.
    Insert,
    /// A node disappeared from the flattened view.
    Delete,
    /// A node changed its place relative to the other nodes.
    Move,
}

/// Structural change of a single node, with positions in the flattened view.
///
/// Old positions (`index`) refer to the flattened view at the beginning of
/// the batch, and new positions (`new_index`) refer to the view at the end of
/// the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    /// The node is inserted.
    Insert {
        /// Position in the new view.
        new_index: usize,
    },
    /// The node is deleted.
    Delete {
        /// Position in the old view.
        index: usize,
    },
    /// The node is moved.
    Move {
        /// Position in the old view.
        index: usize,
        /// Position in the new view.
        new_index: usize,
    },
}

impl Change {
    /// Returns the kind of the change.
    #[must_use]
    pub fn kind(&self) -> ChangeType {
        match self {
            Self::Insert { .. } => ChangeType::Insert,
            Self::Delete { .. } => ChangeType::Delete,
            Self::Move { .. } => ChangeType::Move,
        }
    }

    /// Returns the position in the old view, if the node was there.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match *self {
            Self::Insert { .. } => None,
            Self::Delete { index } | Self::Move { index, .. } => Some(index),
        }
    }

    /// Returns the position in the new view, if the node is there.
    #[must_use]
    pub fn new_index(&self) -> Option<usize> {
        match *self {
            Self::Delete { .. } => None,
            Self::Insert { new_index } | Self::Move { new_index, .. } => Some(new_index),
        }
    }
}

/// Listener for the structural changes of a [`TreeManager`].
///
/// For each outermost batch (explicit, or the implicit one around a single
/// mutation), the observer receives:
///
/// 1. [`will_change_content`][`Self::will_change_content`] once,
/// 2. [`did_change_object`][`Self::did_change_object`] once for each change,
///    all deletions first (descending old index), then all insertions
///    (ascending new index), then all moves (ascending new index), and
/// 3. [`did_change_content`][`Self::did_change_content`] once.
///
/// The callbacks receive the manager by shared reference: they can read the
/// tree, but cannot mutate it. While a callback runs the observer is
/// borrowed, and any mutation attempted through another path fails with
/// [`TreeError::ReentrantMutation`][`crate::TreeError::ReentrantMutation`].
///
/// # Examples
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use flatree::{Change, TreeManager, TreeObserver};
///
/// #[derive(Default)]
/// struct Rows(Vec<String>);
///
/// impl TreeObserver<&'static str, String> for Rows {
///     fn did_change_object(
///         &mut self,
///         _manager: &TreeManager<&'static str, String>,
///         _key: &&'static str,
///         object: &String,
///         change: Change,
///     ) {
///         if let Change::Insert { new_index } = change {
///             self.0.insert(new_index, object.clone());
///         }
///     }
/// }
///
/// let rows = Rc::new(RefCell::new(Rows::default()));
/// let mut manager = TreeManager::new();
/// manager.set_observer(Rc::clone(&rows));
///
/// manager.add_object("fruits".to_owned(), "f")?;
/// manager.add_object_to_parent("apple".to_owned(), "a", &"f")?;
///
/// assert_eq!(rows.borrow().0, ["fruits", "apple"]);
/// # Ok::<_, flatree::TreeError>(())
/// ```
pub trait TreeObserver<K, T> {
    /// Called before the changes of a batch are reported.
    fn will_change_content(&mut self, manager: &TreeManager<K, T>) {
        let _ = manager;
    }

    /// Called for each change of a batch.
    ///
    /// For deletions, `object` is the removed payload, which is dropped after
    /// the batch is reported.
    fn did_change_object(
        &mut self,
        manager: &TreeManager<K, T>,
        key: &K,
        object: &T,
        change: Change,
    );

    /// Called after all the changes of a batch are reported.
    fn did_change_content(&mut self, manager: &TreeManager<K, T>) {
        let _ = manager;
    }
}
