//! # Node Splits
//!
//! A full leaf holds `capacity` keys and splits at `capacity / 2`. Its
//! separator is synthetic: the floor average of the last key of the lower
//! half and the first key of the upper half, so every lower key is `<=` it
//! and every upper key is `>` it.
//!
//! A full branch holds `capacity - 1` keys plus its top child. It splits
//! around the median `m = (capacity - 1) / 2`, which is promoted:
//!
//! ```text
//! before:  k0 c0 | k1 c1 | k2 c2 | top t          (capacity 4, m = 1)
//! left:    k0 c0 | top c1
//! right:   k2 c2 | top t
//! parent:  ... k1 -> left ...
//! ```
//!
//! The split variants differ only in where the new separator goes:
//!
//! - root: both halves move to new nodes and the root becomes a branch with
//!   one key
//! - keyed child: the lower half moves to a new node, inserted into the
//!   parent just before the child
//! - top child: the lower half moves to a new node appended to the parent;
//!   the child stays the top
//!
//! Every precondition is checked before the first mutation.

use super::machine::Machine;
use super::{ChildPosition, NodeKind};
use crate::config::ROOT_NODE;
use crate::layout::FieldId;
use crate::tape::{CompareOp, Program};

pub const ROOT_NOT_LEAF: &str = "Root is not a leaf";
pub const ROOT_NOT_BRANCH: &str = "Root is not a branch";
pub const CHILD_NOT_LEAF: &str = "Child is not a leaf";
pub const CHILD_NOT_BRANCH: &str = "Child is not a branch";
pub const PARENT_NOT_BRANCH: &str = "Parent is not a branch";
pub const PARENT_FULL: &str = "Parent is full";
pub const NOT_FULL: &str = "Node to split is not full";

impl Machine {
    /// Splits the staged `node` into `left` and `right` and sets the
    /// `separator` register.
    fn record_halves(&self, p: &mut Program, kind: NodeKind) {
        let (node, left, right) = (&self.node, &self.left, &self.right);
        let regs = &self.regs;
        match kind {
            NodeKind::Leaf => {
                node.split_into_two(p, left, right, self.capacity() / 2);
                left.last_element(p);
                right.first_element(p);
                p.add(regs.sum, left.keys(), right.keys());
                p.shr(regs.separator, regs.sum, 1);
            }
            NodeKind::Branch => {
                let median = (self.capacity() - 1) / 2;
                p.inc(node.count());
                node.split_into_two(p, left, right, median + 1);
                p.dec(node.count());
                left.pop(p);
                p.move_from(regs.separator, &[left.keys()]);
                left.set_past_last_element(p);
                p.dec(right.count());
            }
        }
    }

    /// Splits the full root of `kind` into two new children.
    pub fn record_split_root(&self, p: &mut Program, kind: NodeKind) {
        let regs = &self.regs;
        let (node, left, right) = (&self.node, &self.left, &self.right);

        self.require_kind(p, ROOT_NODE, kind, kind.pick(ROOT_NOT_LEAF, ROOT_NOT_BRANCH));
        self.require_full(p, ROOT_NODE, kind, NOT_FULL);
        self.require_free(p, 2);

        self.load(p, node, ROOT_NODE);
        self.record_halves(p, kind);
        self.allocate_kind(p, kind, regs.left_node);
        self.save(p, left, regs.left_node);
        self.allocate_kind(p, kind, regs.right_node);
        self.save(p, right, regs.right_node);

        node.clear(p);
        p.move_from(node.keys(), &[regs.separator]);
        p.move_from(node.data(), &[regs.left_node]);
        node.push(p);
        p.move_from(node.data(), &[regs.right_node]);
        node.set_past_last_element(p);
        self.save(p, node, ROOT_NODE);
        p.write_at(self.pool.is_leaf, 0u64, ROOT_NODE);
        p.trace(kind.pick("split root leaf", "split root branch"), Some(regs.separator));
    }

    /// Splits the full child of `kind` found at `position` under the branch
    /// `parent_index`.
    pub fn record_split_child(
        &self,
        p: &mut Program,
        kind: NodeKind,
        parent_index: FieldId,
        position: ChildPosition,
    ) {
        let regs = &self.regs;
        let (node, left, right, parent) = (&self.node, &self.left, &self.right, &self.parent);

        self.require_kind(p, parent_index, NodeKind::Branch, PARENT_NOT_BRANCH);
        p.read(self.pool.size, parent_index);
        p.compare(
            regs.flag,
            CompareOp::Lt,
            self.pool.size,
            self.full_size(NodeKind::Branch),
        );
        p.halt_unless(regs.flag, PARENT_FULL);

        self.load(p, parent, parent_index);
        match position {
            ChildPosition::Keyed(index) => parent.element_at(p, index),
            ChildPosition::Top => parent.element_past_last(p),
        }
        p.move_from(regs.child, &[parent.data()]);
        self.require_kind(p, regs.child, kind, kind.pick(CHILD_NOT_LEAF, CHILD_NOT_BRANCH));
        self.require_full(p, regs.child, kind, NOT_FULL);
        self.require_free(p, 1);

        self.load(p, node, regs.child);
        self.record_halves(p, kind);
        self.allocate_kind(p, kind, regs.new_node);
        self.save(p, left, regs.new_node);
        self.save(p, right, regs.child);

        p.move_from(parent.keys(), &[regs.separator]);
        p.move_from(parent.data(), &[regs.new_node]);
        match position {
            ChildPosition::Keyed(index) => {
                // count the top child so it shifts up with the keyed slots
                p.inc(parent.count());
                parent.insert_element_at(p, index);
                p.dec(parent.count());
            }
            ChildPosition::Top => {
                parent.push(p);
                p.move_from(parent.data(), &[regs.child]);
                parent.set_past_last_element(p);
            }
        }
        self.save(p, parent, parent_index);
        p.trace(kind.pick("split leaf", "split branch"), Some(regs.separator));
    }
}
