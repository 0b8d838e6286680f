//! Descent from the root to the leaf responsible for a key.
//!
//! At a branch the child is the one under the first key not less than the
//! search key. When every key is smaller the top child in slot `size` is
//! taken; `atTop` records which case applied so that splits know how to
//! thread a new separator into the parent.

use super::machine::Machine;
use crate::config::ROOT_NODE;
use crate::layout::FieldId;
use crate::stuck::Stuck;
use crate::tape::Program;

impl Machine {
    /// Resolves the child of the branch staged in `branch` that covers
    /// `key`. Sets `child`, `position` and `atTop`.
    pub fn record_resolve_child(&self, p: &mut Program, branch: &Stuck, key: FieldId) {
        let regs = &self.regs;
        p.move_from(branch.keys(), &[key]);
        branch.search_le(p, regs.matched, regs.position);
        p.if_then_else(
            regs.matched,
            |p| {
                branch.element_at(p, regs.position);
                p.zero(regs.at_top);
            },
            |p| {
                branch.element_past_last(p);
                p.one(regs.at_top);
            },
        );
        p.move_from(regs.child, &[branch.data()]);
    }

    /// Records a lookup of `key`. Sets `found`, `result`, `nodeIndex` and
    /// `stuckIndex`; `nodeIndex` is the leaf that does or would hold the key.
    pub fn record_find(&self, p: &mut Program) {
        let regs = &self.regs;
        let node = &self.node;
        p.write(regs.node_index, ROOT_NODE);
        p.zero(regs.found);
        p.block(|p, descend| {
            self.load(p, node, regs.node_index);
            let is_leaf = self.read_is_leaf(p, regs.node_index);
            p.if_then_else(
                is_leaf,
                |p| {
                    p.move_from(node.keys(), &[regs.key]);
                    node.search_eq(p, regs.found, regs.stuck_index);
                    p.if_then(regs.found, |p| {
                        node.element_at(p, regs.stuck_index);
                        p.move_from(regs.result, &[node.data()]);
                    });
                },
                |p| {
                    self.record_resolve_child(p, node, regs.key);
                    p.move_from(regs.node_index, &[regs.child]);
                    p.goto(descend.start);
                },
            );
        });
    }
}
