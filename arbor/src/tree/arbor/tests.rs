use super::*;

use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::tree::compare::{Descending, LessThan, NaturalOrder};

fn new_tree(order: usize, rebalance: Rebalance) -> Arbor<usize, NaturalOrder> {
    let config = ArborConfig::default()
        .with_order(order)
        .with_rebalance(rebalance);
    Arbor::try_with_config(config, NaturalOrder).expect("creates tree")
}

fn stored_keys<T: ArborKey + Ord, C: Comparator<T>>(tree: &Arbor<T, C>) -> Vec<T> {
    let mut keys: Vec<T> = tree.keys(Direction::Ascending).cloned().collect();
    keys.sort();
    keys
}

fn assert_sorted_everywhere<T: ArborKey, C: Comparator<T>>(tree: &Arbor<T, C>) {
    tree.traverse_nodes(Direction::Ascending, |id, node| {
        assert!(node.is_sorted(tree.comparator()), "node {id} is unsorted");
        ControlFlow::Continue(())
    });
}

#[test]
fn it_creates_tree() {
    let tree = Arbor::<String, NaturalOrder>::try_new(5, NaturalOrder).expect("creates tree");
    assert_eq!(tree.order(), 5);
    assert_eq!(tree.rebalance(), Rebalance::Simplified);
    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.height(), 1);
    assert!(tree.is_empty());
}

#[test]
fn it_rejects_a_tiny_order() {
    for order in [0, 1] {
        let err = Arbor::<usize, NaturalOrder>::try_new(order, NaturalOrder)
            .expect_err("order is too small");
        assert_eq!(
            err.downcast_ref::<ArborError>(),
            Some(&ArborError::OrderTooSmall(order))
        );
    }
    assert!(Arbor::<usize, NaturalOrder>::try_new(2, NaturalOrder).is_ok());
}

#[test]
fn it_searches_empty_tree() {
    let tree = new_tree(4, Rebalance::Simplified);
    assert!(!tree.contains(&7));
    assert_eq!(tree.find(&7), None);
}

#[test]
fn it_splits_on_the_fifth_insertion_at_order_four() {
    let mut tree = new_tree(4, Rebalance::Simplified);
    for i in 1..=4 {
        tree.insert(i);
    }
    assert_eq!(tree.node_count(), 1);

    let root = tree.insert(5);
    assert_eq!(root, tree.root());
    let root_node = tree.node(root).expect("live root");
    assert_eq!(root_node.children().len(), 2);
    assert_eq!(root_node.keys(), &[3]);
    // The promoted median is still held by a leaf
    let found = tree.find(&3).expect("finds the median");
    assert_eq!(tree.node(found).expect("live leaf").keys(), &[3, 4, 5]);
    tree.verify_fanout().expect("fan-out holds");
}

#[test]
fn it_finds_present_and_misses_absent_values() {
    let mut tree = new_tree(4, Rebalance::Simplified);
    for i in [10, 20, 30] {
        tree.insert(i);
    }
    assert_eq!(tree.find(&20), Some(tree.root()));
    assert!(tree.contains(&20));
    assert!(!tree.contains(&99));
}

#[test]
fn it_leaves_the_tree_alone_when_removing_an_absent_value() {
    for rebalance in [Rebalance::Simplified, Rebalance::Merge] {
        let mut tree = new_tree(4, rebalance);
        for i in 0..40 {
            tree.insert(i * 2);
        }
        let root = tree.root();
        let before = stored_keys(&tree);
        let nodes_before = tree.node_count();
        assert_eq!(tree.remove(&41), root);
        assert_eq!(stored_keys(&tree), before);
        assert_eq!(tree.node_count(), nodes_before);
    }
}

#[test_log::test]
fn it_removes_a_leaf_value_after_splits() {
    for rebalance in [Rebalance::Simplified, Rebalance::Merge] {
        let mut tree = new_tree(4, rebalance);
        for i in 1..=7 {
            tree.insert(i);
        }
        assert!(tree.height() > 1);
        tree.remove(&6);
        assert!(!tree.contains(&6));
        for i in [1, 2, 3, 4, 5, 7] {
            assert!(tree.contains(&i), "{rebalance}: lost {i}");
        }
        tree.verify().expect("valid tree");
    }
}

#[test_log::test]
fn it_inserts_into_empty_tree_usize() {
    let mut tree = new_tree(7, Rebalance::Simplified);
    for i in 0..4_000 {
        tree.insert(i);
    }
    for i in 0..4_000 {
        assert!(tree.contains(&i));
    }
    tree.verify_fanout().expect("fan-out holds");
    assert_eq!(tree.count(), 4_000);
    tree.info();
}

#[test_log::test]
fn it_inserts_into_empty_tree_reverse_usize() {
    let mut tree = new_tree(5, Rebalance::Simplified);
    for i in (0..400).rev() {
        tree.insert(i);
    }
    for i in 0..400 {
        assert!(tree.contains(&i));
    }
    assert_eq!(
        tree.keys(Direction::Ascending).copied().collect::<Vec<usize>>(),
        (0..400).collect::<Vec<usize>>()
    );
    tree.verify_fanout().expect("fan-out holds");
    tree.info();
}

#[test_log::test]
fn it_inserts_into_empty_tree_random_usize() {
    let mut tree = new_tree(8, Rebalance::Simplified);
    let mut input = vec![];
    for _i in 0..400 {
        let i = rand::thread_rng().gen_range(0..100_000);
        tree.insert(i);
        input.push(i);
    }
    for i in &input {
        assert!(tree.contains(i));
    }
    input.sort();
    input.dedup();
    assert_eq!(stored_keys(&tree), input);
    tree.verify_fanout().expect("fan-out holds");
    tree.info();
}

#[test]
fn it_inserts_into_empty_tree_string() {
    let mut tree = Arbor::try_new(30, NaturalOrder).expect("creates tree");
    for i in (0..400).rev() {
        tree.insert(format!("something_{i}"));
    }
    assert!(tree.contains(&"something_0".to_string()));
    assert!(tree.contains(&"something_13".to_string()));
    assert!(tree.contains(&"something_319".to_string()));
    assert!(!tree.contains(&"something_400".to_string()));
    tree.verify_fanout().expect("fan-out holds");
}

#[test]
fn it_is_idempotent_on_reinsertion() {
    let mut once = new_tree(3, Rebalance::Simplified);
    let mut twice = new_tree(3, Rebalance::Simplified);
    for i in 0..100 {
        once.insert(i);
        twice.insert(i);
        twice.insert(i);
    }
    for i in (0..100).step_by(7) {
        twice.insert(i);
    }
    assert_eq!(stored_keys(&once), stored_keys(&twice));
    assert_eq!(twice.count(), 100);
}

#[test]
fn it_orders_by_the_supplied_comparator() {
    let mut tree = Arbor::try_new(3, Descending).expect("creates tree");
    for i in 0..50usize {
        tree.insert(i);
    }
    assert_eq!(
        tree.keys(Direction::Ascending).copied().collect::<Vec<usize>>(),
        (0..50).rev().collect::<Vec<usize>>()
    );
    tree.verify_fanout().expect("fan-out holds");

    let case_blind = LessThan(|a: &String, b: &String| a.to_lowercase() < b.to_lowercase());
    let mut tree = Arbor::try_new(4, case_blind).expect("creates tree");
    tree.insert("Apple".to_string());
    tree.insert("APPLE".to_string());
    tree.insert("banana".to_string());
    assert_eq!(tree.count(), 2);
    assert!(tree.contains(&"apple".to_string()));
}

#[test]
fn it_clears_the_tree() {
    let mut tree = new_tree(3, Rebalance::Simplified);
    for i in 0..200 {
        tree.insert(i);
    }
    let old_root = tree.root();
    let root = tree.clear();
    assert_ne!(root, old_root);
    assert!(tree.node(old_root).is_none());
    for i in 0..200 {
        assert!(!tree.contains(&i));
    }
    assert_eq!(tree.node_count(), 1);
    tree.insert(1);
    assert!(tree.contains(&1));
}

#[test]
fn it_reports_statistics() {
    let mut tree = new_tree(4, Rebalance::Simplified);
    for i in 1..=7 {
        tree.insert(i);
    }
    assert_eq!(tree.count(), 7);
    assert_eq!(tree.node_count(), 4);
    assert_eq!(tree.height(), 2);
    // 7 keys over 3 leaves of capacity 4
    assert!((tree.utilization() - 7.0 / 12.0).abs() < f64::EPSILON);
}

#[test]
fn it_writes_a_depth_indented_dump() {
    let mut tree = new_tree(4, Rebalance::Simplified);
    for i in 1..=7 {
        tree.insert(i);
    }
    let mut out = vec![];
    tree.write_node(&mut out, tree.root(), true, 0)
        .expect("writes nodes");
    let dump = String::from_utf8(out).expect("utf8");
    assert_eq!(dump, "3 5 \n..1 2 \n..3 4 \n..5 6 7 \n");

    let mut out = vec![];
    tree.write_node(&mut out, tree.root(), false, 2)
        .expect("writes node");
    assert_eq!(String::from_utf8(out).expect("utf8"), "....3 5 \n");
}

#[test]
fn it_refuses_to_dump_a_stale_node() {
    let mut tree = new_tree(4, Rebalance::Simplified);
    let stale = tree.root();
    for i in 1..=5 {
        tree.insert(i);
    }
    let err = tree
        .write_node(&mut std::io::sink(), stale, true, 0)
        .expect_err("stale handle");
    assert_eq!(
        err.downcast_ref::<ArborError>(),
        Some(&ArborError::UnknownNode(stale))
    );
}

#[test]
fn it_detects_a_broken_tree() {
    let mut tree = new_tree(4, Rebalance::Simplified);
    for i in 1..=7 {
        tree.insert(i);
    }
    tree.verify().expect("valid tree");

    let mut unsorted = tree.clone();
    let leaf = unsorted.find(&1).expect("finds 1");
    unsorted.nodes.get_mut(leaf).keys_mut().reverse();
    let err = unsorted.verify().expect_err("unsorted");
    assert_eq!(
        err.downcast_ref::<ArborError>(),
        Some(&ArborError::UnsortedKeys(leaf))
    );

    let mut orphaned = tree.clone();
    let leaf = orphaned.find(&7).expect("finds 7");
    orphaned.nodes.get_mut(leaf).set_parent(None);
    let err = orphaned.verify().expect_err("lost parent");
    assert!(matches!(
        err.downcast_ref::<ArborError>(),
        Some(ArborError::LostParent { recorded: None, .. })
    ));

    let mut overfull = tree.clone();
    let leaf = overfull.find(&7).expect("finds 7");
    overfull.nodes.get_mut(leaf).keys_mut().extend([8, 9]);
    let err = overfull.verify().expect_err("overfull");
    assert!(matches!(
        err.downcast_ref::<ArborError>(),
        Some(ArborError::Overfull { len: 5, order: 4, .. })
    ));
}

#[test_log::test]
fn it_deletes_from_populated_tree_example_usize() {
    let mut tree = new_tree(3, Rebalance::Simplified);
    let input = vec![5, 15, 20, 25, 30, 35, 40, 45, 55];
    for i in &input {
        tree.insert(*i);
    }
    for (idx, i) in input.iter().enumerate() {
        tree.remove(i);
        assert!(!tree.contains(i));
        for rest in &input[idx + 1..] {
            assert!(tree.contains(rest), "lost {rest} after removing {i}");
        }
        assert_sorted_everywhere(&tree);
        tree.verify().expect("valid tree");
    }
    assert!(tree.is_empty());
}

#[test_log::test]
fn it_deletes_random_usize_simplified() {
    let mut tree = new_tree(4, Rebalance::Simplified);
    let mut input: Vec<usize> = (0..500).collect();
    input.shuffle(&mut rand::thread_rng());
    for i in &input {
        tree.insert(*i);
    }
    input.shuffle(&mut rand::thread_rng());
    let (gone, kept) = input.split_at(250);
    for i in gone {
        tree.remove(i);
        assert!(!tree.contains(i));
    }
    for i in kept {
        assert!(tree.contains(i), "lost {i}");
    }
    let mut kept = kept.to_vec();
    kept.sort();
    assert_eq!(stored_keys(&tree), kept);
    tree.verify().expect("valid tree");
    tree.info();
}

#[test_log::test]
fn it_deletes_random_usize_merge() {
    let mut tree = new_tree(5, Rebalance::Merge);
    let mut input: Vec<usize> = (0..2_000).collect();
    input.shuffle(&mut rand::thread_rng());
    for i in &input {
        tree.insert(*i);
    }
    input.shuffle(&mut rand::thread_rng());
    for (idx, i) in input.iter().enumerate() {
        tree.remove(i);
        if idx % 97 == 0 {
            tree.verify_fanout().expect("fan-out holds");
        }
    }
    assert!(tree.is_empty());
    assert_eq!(tree.height(), 1);
    tree.verify_fanout().expect("fan-out holds");
}

#[test]
fn it_keeps_merge_trees_ordered_under_mixed_workloads() {
    let mut tree = new_tree(3, Rebalance::Merge);
    let mut model = std::collections::BTreeSet::new();
    let mut rng = rand::thread_rng();
    for _ in 0..3_000 {
        let key = rng.gen_range(0..300);
        if rng.gen_bool(0.6) {
            tree.insert(key);
            model.insert(key);
        } else {
            tree.remove(&key);
            model.remove(&key);
        }
    }
    assert_eq!(
        tree.keys(Direction::Ascending).copied().collect::<Vec<usize>>(),
        model.iter().copied().collect::<Vec<usize>>()
    );
    tree.verify_fanout().expect("fan-out holds");
}

#[test_log::test]
fn it_keeps_simplified_membership_exact_under_mixed_workloads() {
    let mut rng = rand::thread_rng();
    for order in 2..8 {
        let mut tree = new_tree(order, Rebalance::Simplified);
        let mut model = std::collections::BTreeSet::new();
        for _ in 0..1_000 {
            let key = rng.gen_range(0..60);
            if rng.gen_bool(0.5) {
                tree.insert(key);
                model.insert(key);
            } else {
                tree.remove(&key);
                model.remove(&key);
            }
            assert_eq!(tree.contains(&key), model.contains(&key));
        }
        for key in 0..60 {
            assert_eq!(tree.contains(&key), model.contains(&key), "key {key}");
        }
        // No key is held by two leaves
        assert_eq!(tree.count(), model.len());
        assert_eq!(
            stored_keys(&tree),
            model.iter().copied().collect::<Vec<usize>>()
        );
        tree.verify().expect("valid tree");
    }
}

proptest! {
    #[test]
    fn insertion_keeps_every_invariant(
        order in 2usize..9,
        input in prop::collection::vec(0u32..1_000, 0..300),
    ) {
        let mut tree = Arbor::try_new(order, NaturalOrder).expect("creates tree");
        for i in &input {
            let root = tree.insert(*i);
            prop_assert_eq!(root, tree.root());
            tree.traverse_nodes(Direction::Ascending, |_, node| {
                assert!(node.len() <= order);
                ControlFlow::Continue(())
            });
        }
        prop_assert!(tree.verify_fanout().is_ok());
        for i in &input {
            prop_assert!(tree.contains(i));
        }
        let mut expected = input.clone();
        expected.sort();
        expected.dedup();
        prop_assert_eq!(tree.keys(Direction::Ascending).copied().collect::<Vec<u32>>(), expected);
    }

    #[test]
    fn removal_keeps_membership_exact(
        order in 2usize..7,
        merge in any::<bool>(),
        input in prop::collection::btree_set(0u32..500, 1..120),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..60),
    ) {
        let rebalance = if merge { Rebalance::Merge } else { Rebalance::Simplified };
        let config = ArborConfig::default().with_order(order).with_rebalance(rebalance);
        let mut tree = Arbor::try_with_config(config, NaturalOrder).expect("creates tree");
        let input: Vec<u32> = input.into_iter().collect();
        for i in &input {
            tree.insert(*i);
        }
        let mut model: std::collections::BTreeSet<u32> = input.iter().copied().collect();
        for pick in picks {
            let victim = *pick.get(&input);
            tree.remove(&victim);
            model.remove(&victim);
            prop_assert!(!tree.contains(&victim));
        }
        prop_assert!(tree.verify().is_ok());
        for i in &input {
            prop_assert_eq!(tree.contains(i), model.contains(i));
        }
        if merge {
            prop_assert!(tree.verify_fanout().is_ok());
        }
    }

    #[test]
    fn mixed_workloads_keep_membership_exact(
        order in 2usize..7,
        merge in any::<bool>(),
        ops in prop::collection::vec((any::<bool>(), 0u32..60), 1..400),
    ) {
        let rebalance = if merge { Rebalance::Merge } else { Rebalance::Simplified };
        let config = ArborConfig::default().with_order(order).with_rebalance(rebalance);
        let mut tree = Arbor::try_with_config(config, NaturalOrder).expect("creates tree");
        let mut model = std::collections::BTreeSet::new();
        for (insert, key) in ops {
            if insert {
                tree.insert(key);
                model.insert(key);
            } else {
                tree.remove(&key);
                model.remove(&key);
            }
        }
        for key in 0u32..60 {
            prop_assert_eq!(tree.contains(&key), model.contains(&key));
        }
        prop_assert_eq!(tree.count(), model.len());
        prop_assert!(tree.verify().is_ok());
    }
}
