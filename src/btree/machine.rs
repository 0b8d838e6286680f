//! The recording side of the tree: the node pool layout, the staging stucks
//! and the scalar registers every tree operation works through.
//!
//! ```text
//! pool                                   staging stucks
//! freeStart var                          node    the node being worked on
//! nodes     array node_count             left    lower half of a split
//!   isLeaf   bit                         right   upper half of a split
//!   isFree   bit                         parent  the branch above `node`
//!   freeNext var
//!   size     var
//!   slots    array capacity
//!     keys   var bits_per_key
//!     data   var bits_per_data
//! ```

use eyre::Result;

use super::NodeKind;
use crate::config::{bits_for, FREE_CHAIN_END, ROOT_NODE};
use crate::layout::{FieldId, FieldStore, Layout};
use crate::stuck::Stuck;
use crate::tape::Program;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub node_count: usize,
    pub capacity: usize,
    pub bits_per_key: u32,
    pub bits_per_data: u32,
}

#[derive(Debug)]
pub(crate) struct Pool {
    pub free_start: FieldId,
    pub is_leaf: FieldId,
    pub is_free: FieldId,
    pub free_next: FieldId,
    pub size: FieldId,
    pub keys: FieldId,
    pub data: FieldId,
}

/// Scalar registers shared by every tree operation.
#[derive(Debug)]
pub(crate) struct Registers {
    pub key: FieldId,
    pub datum: FieldId,
    pub found: FieldId,
    pub result: FieldId,
    pub node_index: FieldId,
    pub stuck_index: FieldId,
    pub parent_index: FieldId,
    pub position: FieldId,
    pub child: FieldId,
    pub new_node: FieldId,
    pub left_node: FieldId,
    pub right_node: FieldId,
    pub matched: FieldId,
    pub at_top: FieldId,
    pub inserted: FieldId,
    pub full: FieldId,
    pub flag: FieldId,
    pub total: FieldId,
    pub sum: FieldId,
    pub separator: FieldId,
}

#[derive(Debug)]
pub(crate) struct Machine {
    pub geometry: Geometry,
    pub pool: Pool,
    pub regs: Registers,
    pub node: Stuck,
    pub left: Stuck,
    pub right: Stuck,
    pub parent: Stuck,
}

impl Machine {
    pub fn new(store: &mut FieldStore, geometry: Geometry) -> Result<Self> {
        let Geometry {
            node_count,
            capacity,
            bits_per_key,
            bits_per_data,
        } = geometry;
        let node_bits = bits_for(node_count as u64);
        let slot_bits = bits_for(capacity as u64);

        let pool = Layout::build(store, |s| {
            s.var("freeStart", node_bits);
            s.array("nodes", node_count, |s| {
                s.bit("isLeaf");
                s.bit("isFree");
                s.var("freeNext", node_bits);
                s.var("size", slot_bits);
                s.array("slots", capacity, |s| {
                    s.var("keys", bits_per_key);
                    s.var("data", bits_per_data);
                });
            });
        })?;

        let regs = Layout::build(store, |s| {
            s.var("key", bits_per_key);
            s.var("datum", bits_per_data);
            s.bit("found");
            s.var("result", bits_per_data);
            s.var("nodeIndex", node_bits);
            s.var("stuckIndex", slot_bits);
            s.var("parentIndex", node_bits);
            s.var("position", slot_bits);
            s.var("child", node_bits);
            s.var("newNode", node_bits);
            s.var("leftNode", node_bits);
            s.var("rightNode", node_bits);
            s.bit("matched");
            s.bit("atTop");
            s.bit("inserted");
            s.bit("full");
            s.bit("flag");
            s.var("total", bits_for(2 * capacity as u64 + 1));
            s.var("sum", bits_per_key + 1);
            s.var("separator", bits_per_key);
        })?;

        Ok(Self {
            geometry,
            pool: Pool {
                free_start: pool.locate("freeStart")?,
                is_leaf: pool.locate("isLeaf")?,
                is_free: pool.locate("isFree")?,
                free_next: pool.locate("freeNext")?,
                size: pool.locate("size")?,
                keys: pool.locate("keys")?,
                data: pool.locate("data")?,
            },
            regs: Registers {
                key: regs.locate("key")?,
                datum: regs.locate("datum")?,
                found: regs.locate("found")?,
                result: regs.locate("result")?,
                node_index: regs.locate("nodeIndex")?,
                stuck_index: regs.locate("stuckIndex")?,
                parent_index: regs.locate("parentIndex")?,
                position: regs.locate("position")?,
                child: regs.locate("child")?,
                new_node: regs.locate("newNode")?,
                left_node: regs.locate("leftNode")?,
                right_node: regs.locate("rightNode")?,
                matched: regs.locate("matched")?,
                at_top: regs.locate("atTop")?,
                inserted: regs.locate("inserted")?,
                full: regs.locate("full")?,
                flag: regs.locate("flag")?,
                total: regs.locate("total")?,
                sum: regs.locate("sum")?,
                separator: regs.locate("separator")?,
            },
            node: Stuck::new(store, "node", capacity, bits_per_key, bits_per_data)?,
            left: Stuck::new(store, "left", capacity, bits_per_key, bits_per_data)?,
            right: Stuck::new(store, "right", capacity, bits_per_key, bits_per_data)?,
            parent: Stuck::new(store, "parent", capacity, bits_per_key, bits_per_data)?,
        })
    }

    pub fn capacity(&self) -> usize {
        self.geometry.capacity
    }

    /// Keys a node of `kind` holds when it must be split before descending.
    pub fn full_size(&self, kind: NodeKind) -> usize {
        match kind {
            NodeKind::Leaf => self.capacity(),
            NodeKind::Branch => self.capacity() - 1,
        }
    }

    /// Records the one-time setup: every slot but the root on the free
    /// chain, the root an empty leaf.
    pub fn record_setup(&self, p: &mut Program) {
        let n = self.geometry.node_count;
        let head = if n > 1 { 1 } else { FREE_CHAIN_END as usize };
        p.write(self.pool.free_start, head);

        for node in 1..n {
            let next = if node + 1 < n {
                node + 1
            } else {
                FREE_CHAIN_END as usize
            };
            p.write_at(self.pool.free_next, next, node);
            p.write_at(self.pool.is_free, 1u64, node);
            p.write_at(self.pool.is_leaf, 0u64, node);
            p.write_at(self.pool.size, 0u64, node);
        }

        let root = ROOT_NODE as usize;
        p.write_at(self.pool.free_next, FREE_CHAIN_END, root);
        p.write_at(self.pool.is_free, 0u64, root);
        p.write_at(self.pool.is_leaf, 1u64, root);
        p.write_at(self.pool.size, 0u64, root);
    }
}
