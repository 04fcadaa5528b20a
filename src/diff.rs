//! Update batches and the diff between flattened views.

use core::hash::Hash;

use std::collections::HashMap;

use tracing::trace;

use crate::error::{TreeError, TreeResult};
use crate::observer::Change;

/// State of the update batch.
///
/// A batch is recording only if it was opened with a [`Recording`], i.e. an
/// observer was attached when the outermost batch began.
#[derive(Debug)]
pub(crate) struct ChangeRecorder<K, T, O> {
    /// Number of nested batches currently open.
    depth: usize,
    /// Recording state of the outermost batch.
    recording: Option<Recording<K, O>>,
    /// Payloads removed during the batch, kept for reporting deletions.
    removed: HashMap<K, T>,
}

impl<K, T, O> ChangeRecorder<K, T, O> {
    /// Creates a recorder with no batch open.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            depth: 0,
            recording: None,
            removed: HashMap::new(),
        }
    }

    /// Returns the number of nested batches currently open.
    #[inline]
    #[must_use]
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// Returns true if any batch is open.
    #[inline]
    #[must_use]
    pub(crate) fn is_open(&self) -> bool {
        self.depth > 0
    }

    /// Returns the observer the open batch reports to, if recording.
    #[inline]
    #[must_use]
    pub(crate) fn observer(&self) -> Option<&O> {
        self.recording.as_ref().map(|recording| &recording.observer)
    }

    /// Opens a batch.
    ///
    /// `recording` is called only when the outermost batch is opened. Returns
    /// true if the batch is the outermost one and is recording.
    pub(crate) fn begin<F>(&mut self, recording: F) -> bool
    where
        F: FnOnce() -> Option<Recording<K, O>>,
    {
        self.depth += 1;
        if self.depth != 1 {
            return false;
        }
        self.recording = recording();
        self.recording.is_some()
    }

    /// Closes a batch.
    ///
    /// Returns the finished batch when the outermost batch is closed.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnbalancedUpdate`] if no batch is open.
    pub(crate) fn end(&mut self) -> TreeResult<Option<FinishedBatch<K, T, O>>> {
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or(TreeError::UnbalancedUpdate)?;
        if self.depth != 0 {
            return Ok(None);
        }
        Ok(Some(FinishedBatch {
            recording: self.recording.take(),
            removed: core::mem::take(&mut self.removed),
        }))
    }
}

impl<K: Eq + Hash, T, O> ChangeRecorder<K, T, O> {
    /// Keeps the removed payloads until the batch ends, if recording.
    pub(crate) fn stash<I>(&mut self, removed: I)
    where
        I: IntoIterator<Item = (K, T)>,
    {
        if self.recording.is_some() {
            self.removed.extend(removed);
        }
    }
}

/// What the outermost batch records at its beginning.
#[derive(Debug)]
pub(crate) struct Recording<K, O> {
    /// Keys of the flattened view at the beginning.
    pub(crate) baseline: Vec<K>,
    /// Observer notified of the beginning, and the only one notified of
    /// the changes.
    pub(crate) observer: O,
}

/// Batch closed by the outermost `end`.
#[derive(Debug)]
pub(crate) struct FinishedBatch<K, T, O> {
    /// Recording state, if the batch was recording.
    pub(crate) recording: Option<Recording<K, O>>,
    /// Payloads removed during the batch.
    pub(crate) removed: HashMap<K, T>,
}

/// Computes the changes turning the `old` key sequence into the `new` one.
///
/// Keys must be unique in each sequence. The result is in the delivery
/// order: deletions by descending old index, then insertions by ascending
/// new index, then moves by ascending new index.
///
/// A key present in both sequences is reported as moved only if its order
/// relative to the other surviving keys changed. The surviving keys which
/// stay are a longest subsequence kept in the same relative order, so the
/// number of moves is minimal.
#[must_use]
pub(crate) fn diff<'a, K: Eq + Hash>(old: &[&'a K], new: &[&'a K]) -> Vec<(&'a K, Change)> {
    let old_positions = old
        .iter()
        .enumerate()
        .map(|(index, &key)| (key, index))
        .collect::<HashMap<_, _>>();
    let new_positions = new
        .iter()
        .enumerate()
        .map(|(index, &key)| (key, index))
        .collect::<HashMap<_, _>>();

    let mut changes = Vec::new();
    changes.extend(
        old.iter()
            .enumerate()
            .rev()
            .filter(|(_, key)| !new_positions.contains_key(*key))
            .map(|(index, &key)| (key, Change::Delete { index })),
    );
    changes.extend(
        new.iter()
            .enumerate()
            .filter(|(_, key)| !old_positions.contains_key(*key))
            .map(|(new_index, &key)| (key, Change::Insert { new_index })),
    );

    // Surviving keys in the new order, with their old positions.
    let survivors = new
        .iter()
        .enumerate()
        .filter_map(|(new_index, &key)| {
            old_positions
                .get(key)
                .map(|&index| (key, index, new_index))
        })
        .collect::<Vec<_>>();
    let old_indices = survivors
        .iter()
        .map(|&(_, index, _)| index)
        .collect::<Vec<_>>();
    let stays = longest_increasing_subsequence(&old_indices);
    changes.extend(
        survivors
            .iter()
            .zip(stays)
            .filter(|(_, stays)| !stays)
            .map(|(&(key, index, new_index), _)| (key, Change::Move { index, new_index })),
    );
    trace!(
        old = old.len(),
        new = new.len(),
        changes = changes.len(),
        "computed diff"
    );

    changes
}

/// Returns flags marking one of the longest strictly increasing subsequences.
///
/// Values must be distinct. Runs in `O(n log n)`.
#[must_use]
fn longest_increasing_subsequence(values: &[usize]) -> Vec<bool> {
    // `tails[len]` is the position of the smallest tail value among the
    // increasing subsequences of length `len + 1` found so far.
    let mut tails: Vec<usize> = Vec::new();
    let mut predecessors: Vec<Option<usize>> = Vec::with_capacity(values.len());
    for (position, &value) in values.iter().enumerate() {
        let len = tails.partition_point(|&tail| values[tail] < value);
        predecessors.push(len.checked_sub(1).map(|prev_len| tails[prev_len]));
        if len == tails.len() {
            tails.push(position);
        } else {
            tails[len] = position;
        }
    }

    let mut flags = vec![false; values.len()];
    let mut current = tails.last().copied();
    while let Some(position) = current {
        flags[position] = true;
        current = predecessors[position];
    }
    flags
}
