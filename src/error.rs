//! Errors.

use thiserror::Error;

/// Error returned by the tree manager operations.
///
/// All errors are caller-input errors. An operation that returns an error
/// leaves the manager unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[non_exhaustive]
pub enum TreeError {
    /// Attempt to add an object under a key which is already in use.
    #[error("the key is already in use")]
    DuplicateKey,
    /// The key does not refer to any node.
    #[error("the key is not found")]
    UnknownKey,
    /// The parent key does not refer to any node.
    #[error("the parent key is not found")]
    UnknownParent,
    /// The index is not less than the number of nodes.
    #[error("index {index} is out of range for {count} nodes")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of nodes in the flattened view.
        count: usize,
    },
    /// `end_updates` is called without the matching `begin_updates`.
    #[error("`end_updates` is called without the matching `begin_updates`")]
    UnbalancedUpdate,
    /// Attempt to mutate the tree while the observer is being notified.
    #[error("attempt to mutate the tree while the observer is in use")]
    ReentrantMutation,
    /// Attempt to make a node the ancestor of itself.
    #[error("attempt to make a node the ancestor of itself")]
    CyclicParent,
}

/// Result type for the tree manager operations.
pub type TreeResult<T> = Result<T, TreeError>;
