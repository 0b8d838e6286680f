//! # Split and Merge Primitives
//!
//! The tree below is built one primitive at a time in a 16-slot pool with
//! stuck capacity 4. Slot numbers follow from the free chain handing out
//! 1, 2, 3, ... in order.
//!
//! ```text
//! put 10..40          root [25]            children 1 [10,20]  2 [30,40]
//! put 50,60           2 [30,40,50,60]
//! split_leaf_at_top   root [25,45]         3 [30,40]  2 [50,60]
//! put 5,15            1 [5,10,15,20]
//! split_leaf_not_top  root [12,25,45]      4 [5,10]  1 [15,20]
//! split_root_branch   root [25]            5 [12 | 1]  6 [45 | 2]
//! ```

use stucktree::btree::{self, Btree, NodeKind};
use stucktree::tape::Halt;

fn tree() -> Btree {
    Btree::builder()
        .node_count(16)
        .stuck_capacity(4)
        .suppress_halt_messages(true)
        .build()
        .unwrap()
}

fn halt_message(err: eyre::Report) -> String {
    err.downcast_ref::<Halt>().unwrap().message.clone()
}

fn put_all(tree: &mut Btree, keys: &[u64]) {
    for &key in keys {
        tree.put(key, key + 1).unwrap();
    }
}

fn keys(tree: &Btree) -> Vec<u64> {
    tree.entries().unwrap().into_iter().map(|(k, _)| k).collect()
}

/// Root branch `[25,45]` over leaves 1, 3 and top 2 `[50,60]`.
fn two_key_root() -> Btree {
    let mut tree = tree();
    put_all(&mut tree, &[10, 20, 30, 40, 50, 60]);
    tree.split_leaf_at_top(0).unwrap();
    tree
}

/// Root `[25]` over branches 5 and 6.
fn three_levels() -> Btree {
    let mut tree = two_key_root();
    put_all(&mut tree, &[5, 15]);
    tree.split_leaf_not_top(0, 0).unwrap();
    tree.split_root_branch().unwrap();
    tree
}

/// Root `[25,65]` over branches 5, 9 and top 6.
fn wide_three_levels() -> Btree {
    let mut tree = three_levels();
    put_all(&mut tree, &[70, 80]);
    tree.split_leaf_at_top(6).unwrap();
    put_all(&mut tree, &[90, 100]);
    tree.split_leaf_at_top(6).unwrap();
    tree.split_branch_at_top(0).unwrap();
    tree
}

#[test]
fn split_leaf_at_top_appends_the_lower_half() {
    let tree = two_key_root();

    let root = tree.node(0).unwrap();
    assert_eq!(root.entries, vec![(25, 1), (45, 3)]);
    assert_eq!(root.top, Some(2));
    assert_eq!(tree.node(3).unwrap().keys(), vec![30, 40]);
    assert_eq!(tree.node(2).unwrap().keys(), vec![50, 60]);
    assert_eq!(keys(&tree), vec![10, 20, 30, 40, 50, 60]);
}

#[test]
fn split_leaf_not_top_inserts_before_the_child() {
    let mut tree = two_key_root();
    put_all(&mut tree, &[5, 15]);

    tree.split_leaf_not_top(0, 0).unwrap();

    let root = tree.node(0).unwrap();
    assert_eq!(root.entries, vec![(12, 4), (25, 1), (45, 3)]);
    assert_eq!(root.top, Some(2));
    assert_eq!(tree.node(4).unwrap().keys(), vec![5, 10]);
    assert_eq!(tree.node(1).unwrap().keys(), vec![15, 20]);
    assert_eq!(tree.get(12).unwrap(), None);
    assert_eq!(tree.get(15).unwrap(), Some(16));
}

#[test]
fn split_refuses_children_that_are_not_full() {
    let mut tree = two_key_root();
    let before = tree.live_nodes().unwrap();

    assert_eq!(
        halt_message(tree.split_leaf_not_top(0, 0).unwrap_err()),
        btree::NOT_FULL
    );
    assert_eq!(
        halt_message(tree.split_branch_not_top(0, 0).unwrap_err()),
        btree::CHILD_NOT_BRANCH
    );
    assert_eq!(
        halt_message(tree.split_leaf_at_top(1).unwrap_err()),
        btree::PARENT_NOT_BRANCH
    );
    assert_eq!(
        halt_message(tree.split_root_leaf().unwrap_err()),
        btree::ROOT_NOT_LEAF
    );
    assert_eq!(tree.live_nodes().unwrap(), before);
}

#[test]
fn split_refuses_a_full_parent() {
    let mut tree = two_key_root();
    put_all(&mut tree, &[5, 15]);
    tree.split_leaf_not_top(0, 0).unwrap();
    put_all(&mut tree, &[31, 32]);
    let before = tree.live_nodes().unwrap();

    assert_eq!(
        halt_message(tree.split_leaf_not_top(0, 2).unwrap_err()),
        btree::PARENT_FULL
    );
    assert_eq!(tree.live_nodes().unwrap(), before);
}

#[test]
fn split_root_branch_promotes_the_median() {
    let tree = three_levels();

    let root = tree.node(0).unwrap();
    assert_eq!(root.kind, NodeKind::Branch);
    assert_eq!(root.entries, vec![(25, 5)]);
    assert_eq!(root.top, Some(6));

    let left = tree.node(5).unwrap();
    assert_eq!(left.kind, NodeKind::Branch);
    assert_eq!(left.entries, vec![(12, 4)]);
    assert_eq!(left.top, Some(1));

    let right = tree.node(6).unwrap();
    assert_eq!(right.entries, vec![(45, 3)]);
    assert_eq!(right.top, Some(2));

    assert_eq!(keys(&tree), vec![5, 10, 15, 20, 30, 40, 50, 60]);
}

#[test]
fn split_branch_at_top_moves_the_lower_half_out() {
    let tree = wide_three_levels();

    let root = tree.node(0).unwrap();
    assert_eq!(root.entries, vec![(25, 5), (65, 9)]);
    assert_eq!(root.top, Some(6));

    let lower = tree.node(9).unwrap();
    assert_eq!(lower.entries, vec![(45, 3)]);
    assert_eq!(lower.top, Some(7));

    let upper = tree.node(6).unwrap();
    assert_eq!(upper.entries, vec![(85, 8)]);
    assert_eq!(upper.top, Some(2));

    assert_eq!(
        keys(&tree),
        vec![5, 10, 15, 20, 30, 40, 50, 60, 70, 80, 90, 100]
    );
}

#[test]
fn merge_leaves_into_root_collapses_the_tree() {
    let mut tree = tree();
    put_all(&mut tree, &[10, 20, 30, 40]);

    tree.merge_leaves_into_root().unwrap();

    let root = tree.node(0).unwrap();
    assert!(root.is_leaf());
    assert_eq!(root.keys(), vec![10, 20, 30, 40]);
    assert_eq!(tree.free_chain().unwrap()[..3], [2, 1, 3]);
    assert_eq!(tree.live_nodes().unwrap().len(), 1);

    tree.put(50, 51).unwrap();
    assert_eq!(keys(&tree), vec![10, 20, 30, 40, 50]);
}

#[test]
fn merge_leaves_not_top_drops_the_separator() {
    let mut tree = two_key_root();
    put_all(&mut tree, &[5, 15]);
    tree.split_leaf_not_top(0, 0).unwrap();

    tree.merge_leaves_not_top(0, 0).unwrap();

    let root = tree.node(0).unwrap();
    assert_eq!(root.entries, vec![(25, 4), (45, 3)]);
    assert_eq!(root.top, Some(2));
    assert_eq!(tree.node(4).unwrap().keys(), vec![5, 10, 15, 20]);
    assert!(tree.node(1).unwrap().is_free);
    assert_eq!(tree.get(20).unwrap(), Some(21));
}

#[test]
fn merge_leaves_at_top_makes_the_merged_node_the_top() {
    let mut tree = two_key_root();

    tree.merge_leaves_at_top(0).unwrap();

    let root = tree.node(0).unwrap();
    assert_eq!(root.entries, vec![(25, 1)]);
    assert_eq!(root.top, Some(3));
    assert_eq!(tree.node(3).unwrap().keys(), vec![30, 40, 50, 60]);
    assert!(tree.node(2).unwrap().is_free);
    assert_eq!(tree.get(60).unwrap(), Some(61));
}

#[test]
fn merge_refuses_a_parent_with_one_key() {
    let mut tree = tree();
    put_all(&mut tree, &[10, 20, 30, 40]);
    let before = tree.live_nodes().unwrap();

    assert_eq!(
        halt_message(tree.merge_leaves_at_top(0).unwrap_err()),
        btree::PARENT_NEEDS_TWO
    );
    assert_eq!(tree.live_nodes().unwrap(), before);
}

#[test]
fn merge_refuses_nodes_that_would_not_fit() {
    let mut tree = two_key_root();
    put_all(&mut tree, &[5, 15, 31]);
    let before = tree.live_nodes().unwrap();

    assert_eq!(
        halt_message(tree.merge_leaves_not_top(0, 0).unwrap_err()),
        btree::WOULD_NOT_FIT
    );
    assert_eq!(
        halt_message(tree.merge_leaves_not_top(0, 1).unwrap_err()),
        btree::NO_KEYED_RIGHT
    );
    assert_eq!(tree.live_nodes().unwrap(), before);
}

#[test]
fn merge_into_root_refuses_a_freed_child_before_touching_the_root() {
    let mut tree = tree();
    put_all(&mut tree, &[10, 20, 30, 40]);
    tree.free(2).unwrap();
    let root = tree.node(0).unwrap();
    let left = tree.node(1).unwrap();
    let chain = tree.free_chain().unwrap();

    assert_eq!(
        halt_message(tree.merge_leaves_into_root().unwrap_err()),
        btree::ALREADY_FREE
    );
    assert_eq!(tree.node(0).unwrap(), root);
    assert_eq!(tree.node(1).unwrap(), left);
    assert!(!tree.node(1).unwrap().is_free);
    assert_eq!(tree.free_chain().unwrap(), chain);
}

#[test]
fn merge_at_top_refuses_a_freed_top_child_before_saving_the_left() {
    let mut tree = two_key_root();
    tree.free(2).unwrap();
    let root = tree.node(0).unwrap();
    let left = tree.node(3).unwrap();

    assert_eq!(
        halt_message(tree.merge_leaves_at_top(0).unwrap_err()),
        btree::ALREADY_FREE
    );
    assert_eq!(tree.node(0).unwrap(), root);
    assert_eq!(tree.node(3).unwrap(), left);
    assert_eq!(left.keys(), vec![30, 40]);
}

#[test]
fn merge_branches_into_root_restores_the_wide_root() {
    let mut tree = three_levels();

    tree.merge_branches_into_root().unwrap();

    let root = tree.node(0).unwrap();
    assert_eq!(root.kind, NodeKind::Branch);
    assert_eq!(root.entries, vec![(12, 4), (25, 1), (45, 3)]);
    assert_eq!(root.top, Some(2));
    assert!(tree.node(5).unwrap().is_free);
    assert!(tree.node(6).unwrap().is_free);
    assert_eq!(keys(&tree), vec![5, 10, 15, 20, 30, 40, 50, 60]);
}

#[test]
fn merge_branches_at_top_folds_the_top_branch() {
    let mut tree = wide_three_levels();

    tree.merge_branches_at_top(0).unwrap();

    let root = tree.node(0).unwrap();
    assert_eq!(root.entries, vec![(25, 5)]);
    assert_eq!(root.top, Some(9));

    let merged = tree.node(9).unwrap();
    assert_eq!(merged.entries, vec![(45, 3), (65, 7), (85, 8)]);
    assert_eq!(merged.top, Some(2));
    assert!(tree.node(6).unwrap().is_free);
    assert_eq!(tree.get(100).unwrap(), Some(101));
}

#[test]
fn merge_branches_not_top_rewires_the_parent() {
    let mut tree = wide_three_levels();

    tree.merge_branches_not_top(0, 0).unwrap();

    let root = tree.node(0).unwrap();
    assert_eq!(root.entries, vec![(65, 5)]);
    assert_eq!(root.top, Some(6));

    let merged = tree.node(5).unwrap();
    assert_eq!(merged.entries, vec![(12, 4), (25, 1), (45, 3)]);
    assert_eq!(merged.top, Some(7));
    assert!(tree.node(9).unwrap().is_free);
    assert_eq!(
        keys(&tree),
        vec![5, 10, 15, 20, 30, 40, 50, 60, 70, 80, 90, 100]
    );
}

#[test]
fn merge_branches_refuses_leaf_children() {
    let mut tree = two_key_root();

    assert_eq!(
        halt_message(tree.merge_branches_not_top(0, 0).unwrap_err()),
        btree::CHILD_NOT_BRANCH
    );
    assert_eq!(
        halt_message(tree.merge_branches_into_root().unwrap_err()),
        btree::ROOT_NEEDS_ONE_KEY
    );
}
