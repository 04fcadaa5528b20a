//! Comparators and comparator-ordered sibling groups.

use core::cmp::Ordering;
use core::fmt;

use std::rc::Rc;

use crate::id::NodeId;

/// Ordering function over two payloads.
///
/// A comparator is bound to a sibling group (the children of one parent, or
/// the root nodes) and keeps the group sorted. Cloning a comparator is cheap
/// and the clones share the same function.
///
/// # Examples
///
/// ```
/// use flatree::Comparator;
///
/// let by_len = Comparator::by_key(|s: &&str| s.len());
/// assert!(by_len.compare(&"ab", &"abc").is_lt());
///
/// let descending = Comparator::<i32>::natural().reversed();
/// assert!(descending.compare(&3, &1).is_lt());
/// ```
pub struct Comparator<T> {
    /// Ordering function.
    f: Rc<dyn Fn(&T, &T) -> Ordering>,
}

impl<T> Comparator<T> {
    /// Creates a comparator from the ordering function.
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + 'static,
    {
        Self { f: Rc::new(f) }
    }

    /// Compares two payloads.
    #[inline]
    #[must_use]
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.f)(a, b)
    }

    /// Returns true if both comparators share the same function.
    ///
    /// Clones of a comparator are equal in this sense. Comparators created
    /// separately are not, even from the same closure.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        // Compare the data addresses only, without the vtables.
        Rc::as_ptr(&self.f).cast::<()>() == Rc::as_ptr(&other.f).cast::<()>()
    }
}

impl<T: 'static> Comparator<T> {
    /// Creates a comparator that orders payloads by the extracted key.
    #[must_use]
    pub fn by_key<F, U>(f: F) -> Self
    where
        F: Fn(&T) -> U + 'static,
        U: Ord,
    {
        Self::new(move |a, b| f(a).cmp(&f(b)))
    }

    /// Returns the comparator with the reversed order.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let f = Rc::clone(&self.f);
        Self::new(move |a, b| f(a, b).reverse())
    }
}

impl<T: Ord + 'static> Comparator<T> {
    /// Creates a comparator using the `Ord` implementation of the payload.
    #[must_use]
    pub fn natural() -> Self {
        Self::new(T::cmp)
    }
}

impl<T> Clone for Comparator<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            f: Rc::clone(&self.f),
        }
    }
}

impl<T> fmt::Debug for Comparator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Comparator(..)")
    }
}

/// Ordered sequence of sibling nodes.
///
/// If the group has a comparator, members are sorted by it and ties are kept
/// in insertion order. Otherwise members are kept in insertion order.
pub(crate) struct SiblingGroup<T> {
    /// Members in order.
    members: Vec<NodeId>,
    /// Comparator bound to the group.
    comparator: Option<Comparator<T>>,
}

impl<T> SiblingGroup<T> {
    /// Creates an empty group without a comparator.
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            members: Vec::new(),
            comparator: None,
        }
    }

    /// Returns the members in order.
    #[inline]
    #[must_use]
    pub(crate) fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// Returns the comparator bound to the group.
    #[inline]
    #[must_use]
    pub(crate) fn comparator(&self) -> Option<&Comparator<T>> {
        self.comparator.as_ref()
    }

    /// Returns the position where a node with the given payload should be
    /// inserted.
    ///
    /// `comparator` overrides the bound comparator if given, and `members`
    /// overrides the current members if given. The latter is used when the
    /// group is being re-sorted in the same operation.
    #[must_use]
    pub(crate) fn position_for<'a, F>(
        &self,
        value: &T,
        comparator: Option<&Comparator<T>>,
        members: Option<&[NodeId]>,
        payload_of: F,
    ) -> usize
    where
        F: Fn(NodeId) -> &'a T,
        T: 'a,
    {
        let members = members.unwrap_or(&self.members);
        match comparator.or(self.comparator.as_ref()) {
            // The first member greater than the value. Equal members stay
            // before the new one.
            Some(cmp) => members
                .partition_point(|&id| cmp.compare(payload_of(id), value) != Ordering::Greater),
            None => members.len(),
        }
    }

    /// Returns the members stably sorted by the given comparator.
    #[must_use]
    pub(crate) fn sorted_by<'a, F>(&self, cmp: &Comparator<T>, payload_of: F) -> Vec<NodeId>
    where
        F: Fn(NodeId) -> &'a T,
        T: 'a,
    {
        let mut sorted = self.members.clone();
        sorted.sort_by(|&a, &b| cmp.compare(payload_of(a), payload_of(b)));
        sorted
    }

    /// Binds the comparator and replaces the members with the ones sorted by it.
    pub(crate) fn rebind(&mut self, cmp: Comparator<T>, sorted: Vec<NodeId>) {
        debug_assert_eq!(
            self.members.len(),
            sorted.len(),
            "[consistency] re-sorting must not change the members"
        );
        self.comparator = Some(cmp);
        self.members = sorted;
    }

    /// Inserts the node at the given position.
    #[inline]
    pub(crate) fn insert_at(&mut self, position: usize, id: NodeId) {
        self.members.insert(position, id);
    }

    /// Removes the node from the group and returns its former position.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<usize> {
        let position = self.members.iter().position(|&member| member == id)?;
        self.members.remove(position);
        Some(position)
    }
}

impl<T> Default for SiblingGroup<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SiblingGroup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiblingGroup")
            .field("members", &self.members)
            .field("sorted", &self.comparator().is_some())
            .finish()
    }
}
