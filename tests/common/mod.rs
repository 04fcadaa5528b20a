//! Helpers shared by the integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use flatree::{Change, TreeManager, TreeObserver};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TEST_SETUP: Once = Once::new();

/// Installs the global tracing subscriber once per test binary.
///
/// `RUST_LOG` is honoured, and defaults to `debug`.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_test_writer()
                .with_target(true)
                .with_filter(env_filter),
        );
        if let Err(e) = subscriber.try_init() {
            eprintln!("Error: Failed to set up logging: {}", e);
        }
    });
}

/// Notification received by [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<K, T> {
    /// `will_change_content`.
    Will,
    /// `did_change_object`.
    Object(K, T, Change),
    /// `did_change_content`.
    Did,
}

/// Observer recording every notification.
///
/// Also records the flattened view as seen from the callbacks.
#[derive(Debug)]
pub struct Recorder<K, T> {
    /// Notifications in the order received.
    pub events: Vec<Event<K, T>>,
    /// Number of rows seen by `will_change_content`.
    pub count_before: Vec<usize>,
    /// Number of rows seen by `did_change_content`.
    pub count_after: Vec<usize>,
}

impl<K, T> Default for Recorder<K, T> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            count_before: Vec::new(),
            count_after: Vec::new(),
        }
    }
}

impl<K: Clone, T: Clone> Recorder<K, T> {
    /// Creates a shared recorder.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Returns the recorded changes without the batch boundaries.
    pub fn changes(&self) -> Vec<(K, Change)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Object(key, _, change) => Some((key.clone(), *change)),
                _ => None,
            })
            .collect()
    }

    /// Returns the number of finished batches.
    pub fn batches(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, Event::Did))
            .count()
    }

    /// Forgets the recorded notifications.
    pub fn clear(&mut self) {
        self.events.clear();
        self.count_before.clear();
        self.count_after.clear();
    }
}

impl<K, T> TreeObserver<K, T> for Recorder<K, T>
where
    K: Clone + Eq + std::hash::Hash + std::fmt::Debug,
    T: Clone,
{
    fn will_change_content(&mut self, manager: &TreeManager<K, T>) {
        self.events.push(Event::Will);
        self.count_before.push(manager.count());
    }

    fn did_change_object(
        &mut self,
        _manager: &TreeManager<K, T>,
        key: &K,
        object: &T,
        change: Change,
    ) {
        self.events
            .push(Event::Object(key.clone(), object.clone(), change));
    }

    fn did_change_content(&mut self, manager: &TreeManager<K, T>) {
        self.events.push(Event::Did);
        self.count_after.push(manager.count());
    }
}

/// Returns the keys of the flattened view in order.
pub fn keys<K, T>(manager: &TreeManager<K, T>) -> Vec<K>
where
    K: Clone + Eq + std::hash::Hash + std::fmt::Debug,
{
    manager.iter().map(|(key, _, _)| key.clone()).collect()
}

/// Returns the keys of the flattened view with their depths.
pub fn rows<K, T>(manager: &TreeManager<K, T>) -> Vec<(K, usize)>
where
    K: Clone + Eq + std::hash::Hash + std::fmt::Debug,
{
    manager
        .iter()
        .map(|(key, _, depth)| (key.clone(), depth))
        .collect()
}

/// Applies the recorded changes of one batch to a copy of the old rows.
///
/// Removes deleted and moved rows from the highest old index down, then
/// puts inserted and moved rows from the lowest new index up.
pub fn apply_changes<K: Clone + PartialEq + std::fmt::Debug>(
    old: &[K],
    changes: &[(K, Change)],
) -> Vec<K> {
    let mut removals = changes
        .iter()
        .filter_map(|(_, change)| change.index())
        .collect::<Vec<_>>();
    removals.sort_unstable_by(|a, b| b.cmp(a));
    let mut rows = old.to_vec();
    for index in removals {
        rows.remove(index);
    }

    let mut additions = changes
        .iter()
        .filter_map(|(key, change)| change.new_index().map(|new_index| (new_index, key)))
        .collect::<Vec<_>>();
    additions.sort_unstable_by_key(|&(new_index, _)| new_index);
    for (new_index, key) in additions {
        rows.insert(new_index, key.clone());
    }
    rows
}
