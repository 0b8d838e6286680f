//! # Btree End-to-End Scenarios
//!
//! Inserts through the public API and checks the resulting shape with node
//! snapshots.

use stucktree::btree::{self, Btree, NodeKind, NodeSnapshot};
use stucktree::tape::{Halt, TapeFault};

fn tree(node_count: usize) -> Btree {
    Btree::builder()
        .node_count(node_count)
        .stuck_capacity(4)
        .bits_per_key(8)
        .bits_per_data(8)
        .suppress_halt_messages(true)
        .build()
        .unwrap()
}

fn halt_message(err: eyre::Report) -> String {
    err.downcast_ref::<Halt>().unwrap().message.clone()
}

/// Walks the tree and checks key ordering and child bounds.
fn check_shape(tree: &Btree) {
    fn walk(tree: &Btree, node: &NodeSnapshot, low: Option<u64>, high: Option<u64>) {
        let keys = node.keys();
        assert!(!node.is_free, "node {} reachable but free", node.index);
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "node {} unsorted", node.index);
        for &key in &keys {
            assert!(low.map_or(true, |low| key > low), "node {} below bound", node.index);
            assert!(high.map_or(true, |high| key <= high), "node {} above bound", node.index);
        }
        if node.kind == NodeKind::Branch {
            assert!(!keys.is_empty(), "branch {} without keys", node.index);
            let children = node.children();
            assert_eq!(children.len(), keys.len() + 1);
            let mut lower = low;
            for (slot, &child) in children.iter().enumerate() {
                let upper = keys.get(slot).copied().or(high);
                walk(tree, &tree.node(child).unwrap(), lower, upper);
                lower = upper;
            }
        }
    }
    walk(tree, &tree.node(0).unwrap(), None, None);
}

#[test]
fn btree_root_leaf_fills_then_splits_into_two_leaves() {
    let mut tree = tree(16);

    for key in [10u64, 20, 30] {
        tree.put(key, key + 1).unwrap();
    }
    let root = tree.node(0).unwrap();
    assert_eq!(root.kind, NodeKind::Leaf);
    assert_eq!(root.entries, vec![(10, 11), (20, 21), (30, 31)]);

    tree.put(40, 41).unwrap();
    let root = tree.node(0).unwrap();
    assert_eq!(root.kind, NodeKind::Branch);
    assert_eq!(root.entries.len(), 1);

    let children = root.children();
    let left = tree.node(children[0]).unwrap();
    let right = tree.node(children[1]).unwrap();
    assert!(left.is_leaf() && right.is_leaf());
    assert_eq!(left.keys(), vec![10, 20]);
    assert_eq!(right.keys(), vec![30, 40]);
    assert_eq!(tree.free_chain().unwrap().len(), 13);
    check_shape(&tree);
}

#[test]
fn btree_thirty_two_ascending_keys_stay_findable() {
    let mut tree = tree(64);

    for key in 1..=32u64 {
        tree.put(key, key + 1).unwrap();
        check_shape(&tree);
    }

    for key in 1..=32u64 {
        let found = tree.find(key).unwrap();
        assert!(found.found, "key {} lost", key);
        assert_eq!(found.data, key + 1);
    }
    assert!(!tree.find(0).unwrap().found);
    assert!(!tree.find(33).unwrap().found);
    assert_eq!(tree.len().unwrap(), 32);

    let live = tree.live_nodes().unwrap().len();
    assert_eq!(live + tree.free_chain().unwrap().len(), 64);
}

#[test]
fn btree_descending_and_interleaved_keys_stay_findable() {
    let mut tree = tree(128);
    let keys: Vec<u64> = (1..=30u64).rev().chain((31..=60).map(|k| (k * 37) % 60 + 100)).collect();

    for &key in &keys {
        tree.put(key, key / 2).unwrap();
    }
    check_shape(&tree);

    for &key in &keys {
        assert_eq!(tree.get(key).unwrap(), Some(key / 2));
    }
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    sorted.dedup();
    let stored: Vec<u64> = tree.entries().unwrap().into_iter().map(|(k, _)| k).collect();
    assert_eq!(stored, sorted);
}

#[test]
fn btree_key_above_every_branch_key_follows_the_top_child() {
    let mut tree = tree(64);
    for key in (10..=200u64).step_by(10) {
        tree.put(key, 1).unwrap();
    }

    let mut node = tree.node(0).unwrap();
    assert_eq!(node.kind, NodeKind::Branch);
    while let Some(top) = node.top {
        node = tree.node(top).unwrap();
    }

    let found = tree.find(255).unwrap();
    assert!(!found.found);
    assert_eq!(found.node, node.index);

    tree.put(255, 7).unwrap();
    assert_eq!(tree.get(255).unwrap(), Some(7));
    assert_eq!(tree.entries().unwrap().last(), Some(&(255, 7)));
}

#[test]
fn btree_put_updates_existing_keys_without_growing() {
    let mut tree = tree(16);
    for key in [5u64, 15, 25, 35, 45] {
        tree.put(key, 0).unwrap();
    }
    let shape = tree.live_nodes().unwrap();

    for key in [5u64, 15, 25, 35, 45] {
        tree.put(key, key).unwrap();
    }

    assert_eq!(tree.live_nodes().unwrap().len(), shape.len());
    assert_eq!(
        tree.entries().unwrap(),
        vec![(5, 5), (15, 15), (25, 25), (35, 35), (45, 45)]
    );
}

#[test]
fn btree_out_of_memory_halts_and_leaves_the_tree_intact() {
    let mut tree = tree(2);

    for key in [1u64, 2, 3, 4] {
        tree.put(key, key).unwrap();
    }
    let root = tree.node(0).unwrap();
    assert!(root.is_leaf());
    assert_eq!(root.keys(), vec![1, 2, 3, 4]);

    let err = tree.put(5, 5).unwrap_err();
    assert_eq!(halt_message(err), btree::OUT_OF_MEMORY);
    assert_eq!(tree.node(0).unwrap(), root);
    assert_eq!(tree.get(5).unwrap(), None);

    tree.put(3, 9).unwrap();
    assert_eq!(tree.get(3).unwrap(), Some(9));
}

#[test]
fn btree_rejects_values_wider_than_their_fields() {
    let mut tree = tree(16);

    assert_eq!(halt_message(tree.put(256, 0).unwrap_err()), btree::KEY_TOO_WIDE);
    assert_eq!(halt_message(tree.put(0, 256).unwrap_err()), btree::DATA_TOO_WIDE);
    assert!(tree.is_empty().unwrap());
}

#[test]
fn btree_step_budget_exhaustion_is_a_fault_not_a_halt() {
    let mut tree = Btree::builder()
        .node_count(16)
        .max_steps(10)
        .build()
        .unwrap();

    let err = tree.put(1, 1).unwrap_err();

    assert!(err.downcast_ref::<Halt>().is_none());
    assert!(matches!(
        err.downcast_ref::<TapeFault>(),
        Some(TapeFault::StepBudgetExhausted { max_steps: 10, .. })
    ));
}

#[test]
fn btree_large_pool_builds_under_the_default_step_budget() {
    let mut tree = Btree::builder()
        .node_count(100_000)
        .bits_per_data(20)
        .build()
        .unwrap();

    assert_eq!(tree.free_chain().unwrap().len(), 99_999);
    for key in [7, 3, 11, 5] {
        tree.put(key, key * 2).unwrap();
    }
    assert_eq!(tree.get(11).unwrap(), Some(22));
}
