//! Scenario tests of adding, removing, and querying objects.

mod common;

use std::cell::Cell;
use std::rc::Rc;

use flatree::{Change, Comparator, TreeError, TreeManager};
use rstest::rstest;

use self::common::{init_test_setup, keys, rows, Recorder};

/// Creates a manager with the tracing subscriber installed.
fn manager<T>() -> TreeManager<&'static str, T> {
    init_test_setup();
    TreeManager::new()
}

#[test]
fn child_follows_parent() {
    let mut manager = manager();
    manager.add_object("A", "a").expect("fresh key");
    manager
        .add_object_to_parent("B", "b", &"a")
        .expect("parent exists");

    assert_eq!(manager.count(), 2);
    assert_eq!(manager.depth_of_object_for_key(&"b"), Ok(1));
    assert_eq!(manager.object_at_index(0), Ok(&"A"));
    assert_eq!(manager.object_at_index(1), Ok(&"B"));
    assert_eq!(manager.key_at_index(1), Ok(&"b"));
    assert_eq!(manager.depth_of_object_at_index(0), Ok(0));
    assert_eq!(manager.depth_of_object_at_index(1), Ok(1));
}

#[rstest]
#[case::ascending(Comparator::natural(), &["y", "z", "x"])]
#[case::descending(Comparator::<i32>::natural().reversed(), &["x", "z", "y"])]
fn roots_sorted_by_comparator(#[case] cmp: Comparator<i32>, #[case] expected: &[&str]) {
    let mut manager = manager();
    manager
        .add_object_with_comparator(3, "x", cmp.clone())
        .expect("fresh key");
    manager
        .add_object_with_comparator(1, "y", cmp.clone())
        .expect("fresh key");
    manager
        .add_object_with_comparator(2, "z", cmp)
        .expect("fresh key");

    assert_eq!(keys(&manager), expected);
}

#[test]
fn comparator_is_kept_by_the_group() {
    let mut manager = manager();
    manager
        .add_object_with_comparator(3, "x", Comparator::natural())
        .expect("fresh key");
    // Later additions without a comparator are still placed by the bound one.
    manager.add_object(1, "y").expect("fresh key");
    manager.add_object(2, "z").expect("fresh key");

    assert_eq!(keys(&manager), ["y", "z", "x"]);
}

#[test]
fn binding_a_comparator_resorts_the_group() {
    let mut manager = manager();
    manager.add_object(3, "x").expect("fresh key");
    manager.add_object(1, "y").expect("fresh key");
    assert_eq!(keys(&manager), ["x", "y"]);

    manager
        .add_object_with_comparator(2, "z", Comparator::natural())
        .expect("fresh key");
    assert_eq!(keys(&manager), ["y", "z", "x"]);
}

#[test]
fn groups_are_ordered_independently() {
    let mut manager = manager();
    manager.add_object(0, "p").expect("fresh key");
    manager.add_object(0, "q").expect("fresh key");
    let descending = Comparator::<i32>::natural().reversed();
    for (value, key) in [(1, "p1"), (3, "p3"), (2, "p2")] {
        manager
            .add_object_to_parent_with_comparator(value, key, &"p", descending.clone())
            .expect("parent exists");
    }
    for (value, key) in [(1, "q1"), (3, "q3"), (2, "q2")] {
        manager
            .add_object_to_parent(value, key, &"q")
            .expect("parent exists");
    }

    assert_eq!(
        rows(&manager),
        [
            ("p", 0),
            ("p3", 1),
            ("p2", 1),
            ("p1", 1),
            ("q", 0),
            ("q1", 1),
            ("q3", 1),
            ("q2", 1),
        ]
    );
}

#[test]
fn ties_keep_insertion_order() {
    let mut manager = manager();
    let by_len = Comparator::by_key(|s: &&'static str| s.len());
    for word in ["ccc", "a", "bb", "d", "ee", "f"] {
        manager
            .add_object_with_comparator(word, word, by_len.clone())
            .expect("fresh key");
    }

    assert_eq!(keys(&manager), ["a", "d", "f", "bb", "ee", "ccc"]);
}

/// Adding with the comparator already bound to the group places the object
/// by binary search, without re-sorting the group.
#[test]
fn same_comparator_is_not_rebound() {
    init_test_setup();
    let mut manager = TreeManager::<String, u32>::new();
    let comparisons = Rc::new(Cell::new(0_usize));
    let counting = |descending: bool| {
        let comparisons = Rc::clone(&comparisons);
        Comparator::new(move |a: &u32, b: &u32| {
            comparisons.set(comparisons.get() + 1);
            if descending {
                b.cmp(a)
            } else {
                a.cmp(b)
            }
        })
    };
    let cmp = counting(false);
    for i in 0..1000 {
        manager
            .add_object_with_comparator(i * 2, format!("k{i}"), cmp.clone())
            .expect("fresh key");
    }

    comparisons.set(0);
    manager
        .add_object_with_comparator(1001, "middle".to_owned(), cmp.clone())
        .expect("fresh key");
    // Binary search over 1000 members takes about log2(1000) steps.
    assert!(
        comparisons.get() <= 12,
        "{} comparisons for a single insertion",
        comparisons.get()
    );
    assert_eq!(manager.index_of_key(&"middle".to_owned()), Ok(501));

    // A different comparator is bound and re-sorts the group.
    comparisons.set(0);
    manager
        .add_object_with_comparator(0, "zero".to_owned(), counting(true))
        .expect("fresh key");
    assert!(comparisons.get() >= 1000);
    assert_eq!(manager.key_at_index(0).map(String::as_str), Ok("k999"));
    assert_eq!(manager.key_at_index(1001).map(String::as_str), Ok("zero"));
}

#[test]
fn remove_root_with_children() {
    let mut manager = manager();
    manager.add_object("before", "before").expect("fresh key");
    manager.add_object("root", "root").expect("fresh key");
    manager
        .add_object_to_parent("child0", "child0", &"root")
        .expect("parent exists");
    manager
        .add_object_to_parent("child1", "child1", &"root")
        .expect("parent exists");
    manager.add_object("after", "after").expect("fresh key");

    let recorder = Recorder::shared();
    manager.set_observer(recorder.clone());
    manager.remove_object_for_key(&"root").expect("key exists");

    assert_eq!(keys(&manager), ["before", "after"]);
    assert_eq!(manager.count(), 2);
    assert!(!manager.contains_key(&"child0"));
    assert_eq!(
        recorder.borrow().changes(),
        [
            ("child1", Change::Delete { index: 3 }),
            ("child0", Change::Delete { index: 2 }),
            ("root", Change::Delete { index: 1 }),
        ]
    );
}

#[test]
fn deep_depths() {
    let mut manager = manager();
    manager.add_object((), "0").expect("fresh key");
    let mut parent = "0";
    for key in ["1", "2", "3", "4"] {
        manager
            .add_object_to_parent((), key, &parent)
            .expect("parent exists");
        parent = key;
    }

    for (depth, key) in ["0", "1", "2", "3", "4"].iter().enumerate() {
        assert_eq!(manager.depth_of_object_for_key(key), Ok(depth));
        assert_eq!(manager.depth_of_object_at_index(depth), Ok(depth));
        assert_eq!(manager.index_of_key(key), Ok(depth));
    }
}

#[test]
fn relations() {
    let mut manager = manager();
    manager.add_object(1, "a").expect("fresh key");
    manager
        .add_object_to_parent(2, "b", &"a")
        .expect("parent exists");
    manager
        .add_object_to_parent(3, "c", &"a")
        .expect("parent exists");

    assert_eq!(manager.parent_key(&"b"), Ok(Some(&"a")));
    assert_eq!(manager.parent_key(&"a"), Ok(None));
    assert_eq!(manager.parent_key(&"z"), Err(TreeError::UnknownKey));
    assert_eq!(
        manager
            .children_keys(Some(&"a"))
            .expect("parent exists")
            .copied()
            .collect::<Vec<_>>(),
        ["b", "c"]
    );
    assert_eq!(
        manager
            .children_keys(None)
            .expect("the root group always exists")
            .copied()
            .collect::<Vec<_>>(),
        ["a"]
    );
    assert!(matches!(
        manager.children_keys(Some(&"z")),
        Err(TreeError::UnknownParent)
    ));
}

#[test]
fn set_parent_moves_the_subtree() {
    let mut manager = manager();
    manager.add_object(0, "a").expect("fresh key");
    manager
        .add_object_to_parent(7, "a1", &"a")
        .expect("parent exists");
    manager.add_object(0, "b").expect("fresh key");
    manager
        .add_object_to_parent_with_comparator(5, "b5", &"b", Comparator::natural())
        .expect("parent exists");
    manager
        .add_object_to_parent(9, "b9", &"b")
        .expect("parent exists");
    manager
        .add_object_to_parent(2, "a2", &"a1")
        .expect("parent exists");

    // `a1` is placed between `b5` and `b9` by the comparator of `b`.
    manager.set_parent(&"a1", Some(&"b")).expect("valid parent");
    assert_eq!(
        rows(&manager),
        [("a", 0), ("b", 0), ("b5", 1), ("a1", 1), ("a2", 2), ("b9", 1)]
    );

    manager.set_parent(&"a2", None).expect("root group");
    assert_eq!(manager.depth_of_object_for_key(&"a2"), Ok(0));
    assert_eq!(keys(&manager).last(), Some(&"a2"));
}

#[test]
fn object_mutation_in_place() {
    let mut manager = manager();
    manager.add_object(String::from("old"), "k").expect("fresh key");
    if let Some(object) = manager.object_for_key_mut(&"k") {
        object.push_str("-new");
    }
    assert_eq!(
        manager.object_for_key(&"k").map(String::as_str),
        Some("old-new")
    );
    assert_eq!(manager.object_for_key_mut(&"missing"), None);
}

#[test]
fn iteration_follows_the_flattened_view() {
    let mut manager = manager();
    manager.add_object('a', "a").expect("fresh key");
    manager
        .add_object_to_parent('b', "b", &"a")
        .expect("parent exists");
    manager.add_object('c', "c").expect("fresh key");

    let iter = manager.iter();
    assert_eq!(iter.len(), 3);
    assert_eq!(
        iter.collect::<Vec<_>>(),
        [(&"a", &'a', 0), (&"b", &'b', 1), (&"c", &'c', 0)]
    );
    assert_eq!((&manager).into_iter().count(), 3);
}

#[test]
fn empty_manager() {
    let manager = manager::<()>();
    assert!(manager.is_empty());
    assert_eq!(manager.count(), 0);
    assert_eq!(manager.iter().next(), None);
    assert!(!manager.is_updating());
}

#[test]
fn with_capacity_starts_empty() {
    init_test_setup();
    let mut manager = TreeManager::<u32, u32>::with_capacity(16);
    assert!(manager.is_empty());
    manager.add_object(1, 1).expect("fresh key");
    assert_eq!(manager.count(), 1);
}

#[cfg(feature = "debug-print")]
#[test]
fn debug_print() {
    let mut manager = manager();
    manager.add_object("root", "r").expect("fresh key");
    manager
        .add_object_to_parent("child0", "c0", &"r")
        .expect("parent exists");
    manager
        .add_object_to_parent("grandchild", "g", &"c0")
        .expect("parent exists");
    manager
        .add_object_to_parent("child1", "c1", &"r")
        .expect("parent exists");
    manager.add_object("other", "o").expect("fresh key");

    let expected = "\
root
|-- child0
|   `-- grandchild
`-- child1
other";
    assert_eq!(manager.debug_print().to_string(), expected);

    let expected_debug = "\
\"r\": \"root\"
|-- \"c0\": \"child0\"
|   `-- \"g\": \"grandchild\"
`-- \"c1\": \"child1\"
\"o\": \"other\"";
    assert_eq!(format!("{:?}", manager.debug_print()), expected_debug);
}
