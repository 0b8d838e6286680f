//! # Node Merges
//!
//! Merges undo splits. Nothing in the tree triggers them; callers invoke
//! them directly.
//!
//! Merging two leaves concatenates their entries. Merging two branches also
//! brings down the separator between them, paired with the left branch's
//! top child:
//!
//! ```text
//! left:   k0 c0 | top c1        separator s       right:  k2 c2 | top t
//! merged: k0 c0 | s c1 | k2 c2 | top t
//! ```
//!
//! - into the root: the root's only key and both its children collapse into
//!   the root, both children are freed
//! - keyed siblings: the children at `index` and `index + 1` merge into the
//!   left one; the parent loses the key at `index`
//! - top siblings: the last keyed child and the top child merge; the merged
//!   node becomes the new top
//!
//! Sibling merges need a parent with at least two keys, so a parent never
//! drops to a bare top pointer. Both children must be distinct live nodes;
//! that is checked with the other preconditions, before anything is saved.

use super::machine::Machine;
use super::split::{CHILD_NOT_BRANCH, CHILD_NOT_LEAF, PARENT_NOT_BRANCH, ROOT_NOT_BRANCH};
use super::{ChildPosition, NodeKind};
use crate::config::ROOT_NODE;
use crate::layout::FieldId;
use crate::tape::{CompareOp, Program};

pub const ROOT_NEEDS_ONE_KEY: &str = "Root must have exactly one key";
pub const PARENT_NEEDS_TWO: &str = "Parent must have at least two entries";
pub const NO_KEYED_RIGHT: &str = "Index must have a keyed right sibling";
pub const WOULD_NOT_FIT: &str = "Merged node would not fit";
pub const SAME_CHILD: &str = "Cannot merge a node with itself";

impl Machine {
    /// Builds the merge of `left_node` and `right_node` in the `left` stuck.
    /// The `separator` register must hold the key between them.
    fn record_merge_pair(&self, p: &mut Program, kind: NodeKind) {
        let regs = &self.regs;
        let (left, right) = (&self.left, &self.right);
        let message = kind.pick(CHILD_NOT_LEAF, CHILD_NOT_BRANCH);

        // children are saved over and freed later, so check them up front
        p.compare(regs.flag, CompareOp::Eq, regs.left_node, regs.right_node);
        p.halt_if(regs.flag, SAME_CHILD);
        self.require_freeable(p, regs.left_node);
        self.require_freeable(p, regs.right_node);
        self.require_kind(p, regs.left_node, kind, message);
        self.require_kind(p, regs.right_node, kind, message);
        self.load(p, left, regs.left_node);
        self.load(p, right, regs.right_node);

        p.add(regs.total, left.count(), right.count());
        if kind == NodeKind::Branch {
            p.inc(regs.total);
        }
        p.compare(regs.flag, CompareOp::Le, regs.total, self.full_size(kind));
        p.halt_unless(regs.flag, WOULD_NOT_FIT);

        match kind {
            NodeKind::Leaf => left.concatenate(p, right),
            NodeKind::Branch => {
                left.element_past_last(p);
                p.move_from(left.keys(), &[regs.separator]);
                left.push(p);
                left.concatenate(p, right);
                right.element_past_last(p);
                p.move_from(left.data(), &[right.data()]);
                left.set_past_last_element(p);
            }
        }
    }

    /// Folds the root's two children of `kind` back into the root.
    pub fn record_merge_into_root(&self, p: &mut Program, kind: NodeKind) {
        let regs = &self.regs;
        let node = &self.node;

        self.require_kind(p, ROOT_NODE, NodeKind::Branch, ROOT_NOT_BRANCH);
        p.read(self.pool.size, ROOT_NODE);
        p.compare(regs.flag, CompareOp::Eq, self.pool.size, 1u64);
        p.halt_unless(regs.flag, ROOT_NEEDS_ONE_KEY);

        self.load(p, node, ROOT_NODE);
        node.element_at(p, 0u64);
        p.move_from(regs.separator, &[node.keys()]);
        p.move_from(regs.left_node, &[node.data()]);
        node.element_past_last(p);
        p.move_from(regs.right_node, &[node.data()]);

        self.record_merge_pair(p, kind);
        self.save(p, &self.left, ROOT_NODE);
        p.write_at(self.pool.is_leaf, kind.is_leaf(), ROOT_NODE);
        self.free(p, regs.left_node);
        self.free(p, regs.right_node);
        p.trace(kind.pick("merge leaves into root", "merge branches into root"), None);
    }

    /// Merges two adjacent children of `kind` under the branch
    /// `parent_index`. `position` names the left one of the pair.
    pub fn record_merge_siblings(
        &self,
        p: &mut Program,
        kind: NodeKind,
        parent_index: FieldId,
        position: ChildPosition,
    ) {
        let regs = &self.regs;
        let parent = &self.parent;

        self.require_kind(p, parent_index, NodeKind::Branch, PARENT_NOT_BRANCH);
        p.read(self.pool.size, parent_index);
        p.compare(regs.flag, CompareOp::Ge, self.pool.size, 2u64);
        p.halt_unless(regs.flag, PARENT_NEEDS_TWO);

        self.load(p, parent, parent_index);
        match position {
            ChildPosition::Keyed(index) => {
                p.add(regs.total, index, 1u64);
                p.compare(regs.flag, CompareOp::Lt, regs.total, parent.count());
                p.halt_unless(regs.flag, NO_KEYED_RIGHT);
                parent.element_at(p, index);
                p.move_from(regs.separator, &[parent.keys()]);
                p.move_from(regs.left_node, &[parent.data()]);
                parent.element_at(p, regs.total);
                p.move_from(regs.right_node, &[parent.data()]);
            }
            ChildPosition::Top => {
                parent.last_element(p);
                p.move_from(regs.separator, &[parent.keys()]);
                p.move_from(regs.left_node, &[parent.data()]);
                parent.element_past_last(p);
                p.move_from(regs.right_node, &[parent.data()]);
            }
        }

        self.record_merge_pair(p, kind);
        self.save(p, &self.left, regs.left_node);

        match position {
            ChildPosition::Keyed(index) => {
                // count the top child so it shifts down with the keyed slots
                p.inc(parent.count());
                parent.remove_element_at(p, index);
                p.dec(parent.count());
                parent.element_at(p, index);
                p.move_from(parent.data(), &[regs.left_node]);
                parent.set_element_at(p, index);
            }
            ChildPosition::Top => {
                parent.pop(p);
                p.move_from(parent.data(), &[regs.left_node]);
                parent.set_past_last_element(p);
            }
        }
        self.save(p, parent, parent_index);
        self.free(p, regs.right_node);
        p.trace(kind.pick("merge leaves", "merge branches"), Some(regs.separator));
    }
}
