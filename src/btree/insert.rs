//! # Insertion
//!
//! `put` is recorded as one program with three retry points:
//!
//! ```text
//! start:
//!   direct attempt        update in place, or insert into a leaf with room
//!     ok -> split the root if it is now a full leaf, done
//!   root is a full leaf   split it, goto start
//!   root is a full branch split it, goto start
//!   descend:
//!     resolve child of parent
//!     child full?         split it into parent, re-resolve
//!     child is a leaf?    insert, done
//!     parent = child
//! ```
//!
//! Splitting on the way down means no split ever has to propagate upwards:
//! every parent reached has room for one more separator.

use super::machine::Machine;
use super::{ChildPosition, NodeKind};
use crate::config::{FREE_CHAIN_END, ROOT_NODE};
use crate::layout::FieldId;
use crate::tape::{CompareOp, Program};

impl Machine {
    /// Inserts the `key`/`datum` registers into the leaf `leaf`, which must
    /// be staged in `node`, must not hold the key and must have room.
    fn record_leaf_insert(&self, p: &mut Program, leaf: FieldId) {
        let regs = &self.regs;
        let node = &self.node;
        p.move_from(node.keys(), &[regs.key]);
        p.move_from(node.data(), &[regs.datum]);
        node.search_le(p, regs.matched, regs.position);
        p.if_then_else(
            regs.matched,
            |p| node.insert_element_at(p, regs.position),
            |p| node.push(p),
        );
        self.save(p, node, leaf);
    }

    /// Updates the key if present or inserts it into its leaf if that leaf
    /// has room. Sets `inserted` on success.
    pub fn record_direct_insert(&self, p: &mut Program) {
        let regs = &self.regs;
        let node = &self.node;
        p.block(|p, done| {
            // find leaves the leaf staged in `node`
            self.record_find(p);
            p.if_then(regs.found, |p| {
                p.move_from(node.keys(), &[regs.key]);
                p.move_from(node.data(), &[regs.datum]);
                node.set_element_at(p, regs.stuck_index);
                self.save(p, node, regs.node_index);
                p.one(regs.inserted);
                p.goto(done.end);
            });

            node.is_full(p, regs.full);
            p.if_then_else(
                regs.full,
                |p| p.zero(regs.inserted),
                |p| {
                    self.record_leaf_insert(p, regs.node_index);
                    p.one(regs.inserted);
                },
            );
        });
    }

    /// Splits the root if it is a leaf that has just become full. With fewer
    /// than two free slots the root stays full and the next put that needs
    /// room halts instead.
    fn record_split_full_root_leaf(&self, p: &mut Program) {
        let (pool, regs) = (&self.pool, &self.regs);
        let is_leaf = self.read_is_leaf(p, ROOT_NODE);
        p.if_then(is_leaf, |p| {
            p.read(pool.size, ROOT_NODE);
            p.compare(
                regs.full,
                CompareOp::Ge,
                pool.size,
                self.full_size(NodeKind::Leaf),
            );
            p.if_then(regs.full, |p| {
                p.compare(regs.flag, CompareOp::Ne, pool.free_start, FREE_CHAIN_END);
                p.if_then(regs.flag, |p| {
                    p.read(pool.free_next, pool.free_start);
                    p.compare(regs.flag, CompareOp::Ne, pool.free_next, FREE_CHAIN_END);
                    p.if_then(regs.flag, |p| self.record_split_root(p, NodeKind::Leaf));
                });
            });
        });
    }

    /// Records `put(key, datum)` from the `key` and `datum` registers.
    pub fn record_put(&self, p: &mut Program) {
        let regs = &self.regs;
        let pool = &self.pool;
        let parent = &self.parent;

        p.block(|p, put| {
            self.record_direct_insert(p);
            p.if_then(regs.inserted, |p| {
                self.record_split_full_root_leaf(p);
                p.goto(put.end);
            });

            let is_leaf = self.read_is_leaf(p, ROOT_NODE);
            p.if_then(is_leaf, |p| {
                self.record_split_root(p, NodeKind::Leaf);
                p.goto(put.start);
            });
            p.read(pool.size, ROOT_NODE);
            p.compare(
                regs.full,
                CompareOp::Ge,
                pool.size,
                self.full_size(NodeKind::Branch),
            );
            p.if_then(regs.full, |p| {
                self.record_split_root(p, NodeKind::Branch);
                p.goto(put.start);
            });

            p.write(regs.parent_index, ROOT_NODE);
            p.block(|p, descend| {
                self.load(p, parent, regs.parent_index);
                self.record_resolve_child(p, parent, regs.key);

                p.read(pool.size, regs.child);
                let is_leaf = self.read_is_leaf(p, regs.child);
                p.if_then_else(
                    is_leaf,
                    |p| {
                        p.compare(
                            regs.full,
                            CompareOp::Ge,
                            pool.size,
                            self.full_size(NodeKind::Leaf),
                        )
                    },
                    |p| {
                        p.compare(
                            regs.full,
                            CompareOp::Ge,
                            pool.size,
                            self.full_size(NodeKind::Branch),
                        )
                    },
                );
                p.if_then(regs.full, |p| {
                    p.if_then_else(
                        is_leaf,
                        |p| self.record_split_child_at(p, NodeKind::Leaf),
                        |p| self.record_split_child_at(p, NodeKind::Branch),
                    );
                    p.goto(descend.start);
                });

                p.if_then(is_leaf, |p| {
                    self.load(p, &self.node, regs.child);
                    self.record_leaf_insert(p, regs.child);
                    p.goto(put.end);
                });
                p.move_from(regs.parent_index, &[regs.child]);
                p.goto(descend.start);
            });
        });
    }

    /// Splits the child resolved under `parentIndex`, choosing the keyed or
    /// top variant from `atTop`.
    fn record_split_child_at(&self, p: &mut Program, kind: NodeKind) {
        let regs = &self.regs;
        p.if_then_else(
            regs.at_top,
            |p| self.record_split_child(p, kind, regs.parent_index, ChildPosition::Top),
            |p| {
                self.record_split_child(
                    p,
                    kind,
                    regs.parent_index,
                    ChildPosition::Keyed(regs.position),
                )
            },
        );
    }
}
