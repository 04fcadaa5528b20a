//! Tree manager.

use core::cell::{OnceCell, RefCell};
use core::fmt;
use core::hash::Hash;
use core::iter;

use std::rc::Rc;

use tracing::{debug, instrument, warn};

use crate::comparator::Comparator;
use crate::diff::{self, ChangeRecorder, FinishedBatch, Recording};
use crate::error::{TreeError, TreeResult};
#[cfg(feature = "debug-print")]
use crate::forest::DebugPrint;
use crate::flatten::{FlatEntry, FlattenedView};
use crate::forest::Forest;
use crate::id::NodeId;
use crate::observer::{Change, TreeObserver};

/// Shared observer handle.
type SharedObserver<K, T> = Rc<RefCell<dyn TreeObserver<K, T>>>;

/// Hierarchical ordered collection with a flattened view.
///
/// Objects are stored under unique keys, optionally nested under a parent
/// key. Each sibling group is kept in the order of the comparator bound to
/// it, or in insertion order if none is bound. The whole hierarchy is
/// addressable as a single depth-first pre-order sequence, the flattened
/// view, so that it can drive a list presentation by index.
///
/// Structural changes are reported to the [observer][`TreeObserver`] as a
/// minimal diff of the flattened view, once per batch. A batch is either the
/// span between the outermost [`begin_updates`][`Self::begin_updates`] and
/// [`end_updates`][`Self::end_updates`] pair, or a single mutation made
/// outside of such a span.
///
/// # Examples
///
/// ```
/// use flatree::{Comparator, TreeManager};
///
/// let mut manager = TreeManager::new();
/// manager.add_object("animals", "a")?;
/// manager.add_object_to_parent_with_comparator("dog", "d", &"a", Comparator::natural())?;
/// manager.add_object_to_parent("cat", "c", &"a")?;
///
/// assert_eq!(manager.count(), 3);
/// assert_eq!(manager.object_at_index(1)?, &"cat");
/// assert_eq!(manager.depth_of_object_at_index(2)?, 1);
/// assert_eq!(manager.depth_of_object_for_key(&"a")?, 0);
/// # Ok::<_, flatree::TreeError>(())
/// ```
pub struct TreeManager<K, T> {
    /// Nodes and their hierarchy.
    forest: Forest<K, T>,
    /// Flattened view, built on demand after structural changes.
    view: OnceCell<FlattenedView>,
    /// Update batch state.
    recorder: ChangeRecorder<K, T, SharedObserver<K, T>>,
    /// Observer.
    observer: Option<SharedObserver<K, T>>,
}

impl<K, T> TreeManager<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    /// Creates a new empty tree manager.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new empty tree manager with space for the given number of nodes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            forest: Forest::with_capacity(capacity),
            view: OnceCell::new(),
            recorder: ChangeRecorder::new(),
            observer: None,
        }
    }

    /// Sets the observer, replacing the previous one.
    ///
    /// The manager shares the observer with the caller. An observer attached
    /// while a batch is open starts receiving notifications from the next
    /// batch. The changes of the open batch go to the observer which was
    /// notified of its beginning.
    pub fn set_observer<O>(&mut self, observer: Rc<RefCell<O>>)
    where
        O: TreeObserver<K, T> + 'static,
    {
        self.observer = Some(observer);
    }

    /// Detaches the observer.
    ///
    /// If a batch is open, the observer notified of its beginning still
    /// receives its changes.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Returns true if an observer is attached.
    #[inline]
    #[must_use]
    pub fn has_observer(&self) -> bool {
        self.observer.is_some()
    }

    /// Adds an object as a root node.
    ///
    /// The object is placed by the comparator of the root group if one is
    /// bound, or appended otherwise.
    ///
    /// # Errors
    ///
    /// * [`TreeError::DuplicateKey`] if the key is already in use.
    /// * [`TreeError::ReentrantMutation`] if the observer is in use.
    pub fn add_object(&mut self, object: T, key: K) -> TreeResult<()> {
        self.add(object, key, None, None)
    }

    /// Adds an object as a root node, binding the comparator to the root group.
    ///
    /// The existing roots are re-sorted by the comparator, and it keeps
    /// ordering the root group afterwards.
    ///
    /// # Errors
    ///
    /// Same as [`add_object`][`Self::add_object`].
    pub fn add_object_with_comparator(
        &mut self,
        object: T,
        key: K,
        comparator: Comparator<T>,
    ) -> TreeResult<()> {
        self.add(object, key, None, Some(comparator))
    }

    /// Adds an object as the child of the parent.
    ///
    /// # Errors
    ///
    /// * [`TreeError::DuplicateKey`] if the key is already in use.
    /// * [`TreeError::CyclicParent`] if the parent key is the key itself.
    /// * [`TreeError::UnknownParent`] if the parent key is not found.
    /// * [`TreeError::ReentrantMutation`] if the observer is in use.
    pub fn add_object_to_parent(&mut self, object: T, key: K, parent: &K) -> TreeResult<()> {
        self.add(object, key, Some(parent), None)
    }

    /// Adds an object as the child of the parent, binding the comparator to
    /// the children of the parent.
    ///
    /// # Errors
    ///
    /// Same as [`add_object_to_parent`][`Self::add_object_to_parent`].
    pub fn add_object_to_parent_with_comparator(
        &mut self,
        object: T,
        key: K,
        parent: &K,
        comparator: Comparator<T>,
    ) -> TreeResult<()> {
        self.add(object, key, Some(parent), Some(comparator))
    }

    /// Adds an object.
    #[instrument(level = "debug", skip(self, object, comparator))]
    fn add(
        &mut self,
        object: T,
        key: K,
        parent: Option<&K>,
        comparator: Option<Comparator<T>>,
    ) -> TreeResult<()> {
        self.ensure_not_reentrant()?;
        let parent = self.forest.resolve_new(&key, parent)?;
        self.mutate(|forest| {
            forest.insert(key, object, parent, comparator);
            None
        });
        Ok(())
    }

    /// Removes the object and all of its descendants.
    ///
    /// # Errors
    ///
    /// * [`TreeError::UnknownKey`] if the key is not found.
    /// * [`TreeError::ReentrantMutation`] if the observer is in use.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_object_for_key(&mut self, key: &K) -> TreeResult<()> {
        self.ensure_not_reentrant()?;
        let id = self.forest.resolve(key)?;
        self.mutate(|forest| Some(forest.remove(id)));
        Ok(())
    }

    /// Moves the object with its descendants under the new parent, or to the
    /// root group if `parent` is `None`.
    ///
    /// The object is placed by the comparator of the destination group.
    ///
    /// # Errors
    ///
    /// * [`TreeError::UnknownKey`] if the key is not found.
    /// * [`TreeError::UnknownParent`] if the parent key is not found.
    /// * [`TreeError::CyclicParent`] if the parent is the object itself or
    ///   one of its descendants.
    /// * [`TreeError::ReentrantMutation`] if the observer is in use.
    #[instrument(level = "debug", skip(self))]
    pub fn set_parent(&mut self, key: &K, parent: Option<&K>) -> TreeResult<()> {
        self.ensure_not_reentrant()?;
        let (id, parent) = self.forest.resolve_reparent(key, parent)?;
        self.mutate(|forest| {
            forest.set_parent(id, parent);
            None
        });
        Ok(())
    }

    /// Returns a reference to the object for the key.
    #[inline]
    #[must_use]
    pub fn object_for_key(&self, key: &K) -> Option<&T> {
        let id = self.forest.id_of(key)?;
        self.forest.node(id).map(|node| node.data())
    }

    /// Returns a mutable reference to the object for the key.
    ///
    /// Modifying the object does not re-sort its sibling group and is not
    /// reported to the observer. To reposition an object after changing the
    /// fields its comparator looks at, remove and add it again in a batch.
    #[inline]
    #[must_use]
    pub fn object_for_key_mut(&mut self, key: &K) -> Option<&mut T> {
        self.forest.data_mut(key)
    }

    /// Returns true if the key is in use.
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.forest.id_of(key).is_some()
    }

    /// Returns the key of the parent, or `None` for a root.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownKey`] if the key is not found.
    pub fn parent_key(&self, key: &K) -> TreeResult<Option<&K>> {
        let id = self.forest.resolve(key)?;
        Ok(self
            .forest
            .node(id)
            .and_then(|node| node.parent())
            .map(|parent| self.key_of(parent)))
    }

    /// Returns the keys of the children in order, or of the roots if
    /// `parent` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownParent`] if the parent key is not found.
    pub fn children_keys(&self, parent: Option<&K>) -> TreeResult<impl Iterator<Item = &K> + '_> {
        let parent = parent
            .map(|parent| self.forest.id_of(parent).ok_or(TreeError::UnknownParent))
            .transpose()?;
        Ok(self
            .forest
            .group(parent)
            .members()
            .iter()
            .map(move |&id| self.key_of(id)))
    }

    /// Returns the number of objects, i.e. the length of the flattened view.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.forest.len()
    }

    /// Returns true if the manager has no objects.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns the object at the position in the flattened view.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::IndexOutOfRange`] if `index` is not less than
    /// [`count`][`Self::count`].
    pub fn object_at_index(&self, index: usize) -> TreeResult<&T> {
        let entry = self.entry(index)?;
        Ok(self.data_of(entry))
    }

    /// Returns the key at the position in the flattened view.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::IndexOutOfRange`] if `index` is not less than
    /// [`count`][`Self::count`].
    pub fn key_at_index(&self, index: usize) -> TreeResult<&K> {
        let entry = self.entry(index)?;
        Ok(self.key_of(entry.id))
    }

    /// Returns the depth of the object at the position in the flattened view.
    ///
    /// Root objects are depth 0.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::IndexOutOfRange`] if `index` is not less than
    /// [`count`][`Self::count`].
    pub fn depth_of_object_at_index(&self, index: usize) -> TreeResult<usize> {
        self.entry(index).map(|entry| entry.depth)
    }

    /// Returns the depth of the object for the key.
    ///
    /// Root objects are depth 0.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownKey`] if the key is not found.
    pub fn depth_of_object_for_key(&self, key: &K) -> TreeResult<usize> {
        let id = self.forest.resolve(key)?;
        Ok(self.forest.depth(id))
    }

    /// Returns the position of the object for the key in the flattened view.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownKey`] if the key is not found.
    pub fn index_of_key(&self, key: &K) -> TreeResult<usize> {
        let id = self.forest.resolve(key)?;
        Ok(self
            .view()
            .position(id)
            .expect("[consistency] every node must be in the flattened view"))
    }

    /// Returns an iterator over the flattened view.
    ///
    /// Items are `(key, object, depth)` tuples in the flattened order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, T> {
        Iter {
            manager: self,
            entries: self.view().entries().iter(),
        }
    }

    /// Returns true if an update batch is open.
    #[inline]
    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.recorder.is_open()
    }

    /// Opens an update batch.
    ///
    /// Batches nest. When the outermost batch opens, the flattened view is
    /// remembered as the baseline and the observer is notified with
    /// [`will_change_content`][`TreeObserver::will_change_content`].
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::ReentrantMutation`] if the observer is in use.
    #[instrument(level = "debug", skip(self))]
    pub fn begin_updates(&mut self) -> TreeResult<()> {
        self.ensure_not_reentrant()?;
        self.open_batch();
        Ok(())
    }

    /// Closes an update batch.
    ///
    /// When the outermost batch closes, the changes between the baseline
    /// and the current flattened view are reported to the observer.
    ///
    /// # Errors
    ///
    /// * [`TreeError::UnbalancedUpdate`] if no batch is open.
    /// * [`TreeError::ReentrantMutation`] if the observer is in use.
    #[instrument(level = "debug", skip(self))]
    pub fn end_updates(&mut self) -> TreeResult<()> {
        self.ensure_not_reentrant()?;
        let finished = self.recorder.end().map_err(|e| {
            warn!("`end_updates` is called without the matching `begin_updates`");
            e
        })?;
        if let Some(batch) = finished {
            self.deliver(batch);
        }
        Ok(())
    }

    /// Returns a printable adapter showing the forest as an indented tree.
    #[cfg(feature = "debug-print")]
    #[inline]
    #[must_use]
    pub fn debug_print(&self) -> DebugPrint<'_, K, T> {
        DebugPrint::new(&self.forest)
    }

    /// Fails if an observer is borrowed, i.e. the call comes from inside an
    /// observer callback or the observer is held by someone.
    ///
    /// Both the attached observer and the one the open batch reports to are
    /// checked.
    fn ensure_not_reentrant(&self) -> TreeResult<()> {
        let in_use = self
            .observer
            .iter()
            .chain(self.recorder.observer())
            .any(|observer| observer.try_borrow_mut().is_err());
        if in_use {
            warn!("mutation is attempted while the observer is in use");
            return Err(TreeError::ReentrantMutation);
        }
        Ok(())
    }

    /// Applies a validated structural mutation.
    ///
    /// Outside of an explicit batch, the mutation forms an implicit batch of
    /// its own. The closure returns the removed entries, if any.
    fn mutate<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Forest<K, T>) -> Option<Vec<(K, T)>>,
    {
        let implicit = !self.recorder.is_open();
        if implicit {
            self.open_batch();
        }

        let removed = f(&mut self.forest);
        self.view.take();
        if let Some(removed) = removed {
            self.recorder.stash(removed);
        }

        if implicit {
            let batch = self
                .recorder
                .end()
                .expect("[consistency] the implicit batch has been opened");
            if let Some(batch) = batch {
                self.deliver(batch);
            }
        }
    }

    /// Opens a batch and notifies the observer if it is the outermost one.
    fn open_batch(&mut self) {
        let observer = self.observer.clone();
        let view = &self.view;
        let forest = &self.forest;
        let recording = self.recorder.begin(|| {
            let observer = observer?;
            let view = view.get_or_init(|| FlattenedView::build(forest));
            let baseline = view
                .entries()
                .iter()
                .map(|entry| Self::key_in(forest, entry.id).clone())
                .collect();
            Some(Recording { baseline, observer })
        });
        if !recording {
            return;
        }
        debug!("update batch opened");
        if let Some(observer) = self.recorder.observer().cloned() {
            observer.borrow_mut().will_change_content(self);
        }
    }

    /// Reports the changes of the finished batch to the observer notified
    /// of its beginning.
    fn deliver(&self, batch: FinishedBatch<K, T, SharedObserver<K, T>>) {
        let Some(Recording { baseline, observer }) = batch.recording else {
            return;
        };
        let old = baseline.iter().collect::<Vec<_>>();
        let new = self
            .view()
            .entries()
            .iter()
            .map(|entry| self.key_of(entry.id))
            .collect::<Vec<_>>();
        let changes = diff::diff(&old, &new);
        debug!(changes = changes.len(), "update batch closed");

        let mut observer = observer.borrow_mut();
        for (key, change) in changes {
            let object = match change {
                Change::Delete { .. } => batch
                    .removed
                    .get(key)
                    .expect("[consistency] payloads of deleted nodes must be stashed"),
                Change::Insert { .. } | Change::Move { .. } => self
                    .object_for_key(key)
                    .expect("[consistency] inserted or moved nodes must be alive"),
            };
            observer.did_change_object(self, key, object, change);
        }
        observer.did_change_content(self);
    }

    /// Returns the flattened view, building it if necessary.
    fn view(&self) -> &FlattenedView {
        self.view.get_or_init(|| FlattenedView::build(&self.forest))
    }

    /// Returns the entry at the position in the flattened view.
    fn entry(&self, index: usize) -> TreeResult<FlatEntry> {
        let view = self.view();
        view.get(index).ok_or(TreeError::IndexOutOfRange {
            index,
            count: view.len(),
        })
    }

    /// Returns the key of the live node.
    fn key_of(&self, id: NodeId) -> &K {
        Self::key_in(&self.forest, id)
    }

    /// Returns the key of the live node in the forest.
    fn key_in(forest: &Forest<K, T>, id: NodeId) -> &K {
        forest
            .node(id)
            .expect("[consistency] the node must be alive")
            .key()
    }

    /// Returns the payload of the flattened view entry.
    fn data_of(&self, entry: FlatEntry) -> &T {
        self.forest
            .node(entry.id)
            .expect("[consistency] nodes in the flattened view must be alive")
            .data()
    }
}

impl<K, T> Default for TreeManager<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, T: fmt::Debug> fmt::Debug for TreeManager<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeManager")
            .field("forest", &self.forest)
            .field("update_depth", &self.recorder.depth())
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl<'a, K, T> IntoIterator for &'a TreeManager<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    type Item = (&'a K, &'a T, usize);
    type IntoIter = Iter<'a, K, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the flattened view of a [`TreeManager`].
///
/// Created by [`TreeManager::iter`].
#[derive(Clone)]
pub struct Iter<'a, K, T> {
    /// Manager.
    manager: &'a TreeManager<K, T>,
    /// Remaining entries.
    entries: core::slice::Iter<'a, FlatEntry>,
}

impl<'a, K, T> Iterator for Iter<'a, K, T>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    type Item = (&'a K, &'a T, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = *self.entries.next()?;
        let manager = self.manager;
        Some((manager.key_of(entry.id), manager.data_of(entry), entry.depth))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, T> ExactSizeIterator for Iter<'_, K, T> where K: Clone + Eq + Hash + fmt::Debug {}

impl<K, T> iter::FusedIterator for Iter<'_, K, T> where K: Clone + Eq + Hash + fmt::Debug {}

impl<K: fmt::Debug, T> fmt::Debug for Iter<'_, K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("remaining", &self.entries.len())
            .finish()
    }
}
