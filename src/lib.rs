//! Ordered hierarchical collection with a flattened view.
//!
//! [`TreeManager`] stores objects under unique keys as a forest. Each group
//! of siblings is kept sorted by the [`Comparator`] bound to it, and the
//! whole forest is exposed as one depth-first sequence of rows with depths,
//! which is what an indented list presentation consumes.
//!
//! Structural changes are grouped into batches and reported to a
//! [`TreeObserver`] as a minimal set of insertions, deletions, and moves
//! between the flattened view before and after the batch.
//!
//! # Features
//!
//! * `debug-print` (enabled by default): [`TreeManager::debug_print`] for
//!   printing the forest as an indented tree.
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

mod comparator;
mod diff;
mod error;
mod flatten;
mod forest;
mod id;
mod manager;
mod observer;

pub use self::comparator::Comparator;
pub use self::error::{TreeError, TreeResult};
#[cfg(feature = "debug-print")]
pub use self::forest::DebugPrint;
pub use self::manager::{Iter, TreeManager};
pub use self::observer::{Change, ChangeType, TreeObserver};
