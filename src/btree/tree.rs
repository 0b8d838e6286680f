//! # Btree Public API
//!
//! [`Btree`] owns the field store and the program. Each public operation
//! clears the program back to its origin (just past the one-time setup),
//! writes its arguments into registers, records the operation and runs it:
//!
//! ```text
//! clear -> write args -> record -> run -> Completed | Halted -> Ok | Err(Halt)
//! ```
//!
//! Inspection methods (`node`, `free_chain`, `entries`, ...) read the store
//! directly and never touch the program.

use eyre::{bail, Result};
use tracing::debug;

use super::builder::BtreeBuilder;
use super::machine::{Geometry, Machine};
use super::{ChildPosition, NodeKind};
use crate::config::{FREE_CHAIN_END, ROOT_NODE};
use crate::layout::FieldStore;
use crate::tape::{Halt, Limits, Program};

pub const KEY_TOO_WIDE: &str = "Key does not fit in bits per key";
pub const DATA_TOO_WIDE: &str = "Data does not fit in bits per data";
pub const NODE_OUT_OF_RANGE: &str = "Node index is beyond the node pool";
pub const SLOT_OUT_OF_RANGE: &str = "Slot index is beyond the stuck capacity";

/// Result of [`Btree::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindResult {
    pub found: bool,
    pub data: u64,
    /// Leaf that holds, or would hold, the key.
    pub node: usize,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub index: usize,
    pub kind: NodeKind,
    pub is_free: bool,
    pub free_next: usize,
    pub entries: Vec<(u64, u64)>,
    /// Top child of a branch.
    pub top: Option<usize>,
}

impl NodeSnapshot {
    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    pub fn keys(&self) -> Vec<u64> {
        self.entries.iter().map(|&(key, _)| key).collect()
    }

    /// Children of a branch in key order, top last.
    pub fn children(&self) -> Vec<usize> {
        match self.kind {
            NodeKind::Leaf => Vec::new(),
            NodeKind::Branch => self
                .entries
                .iter()
                .map(|&(_, child)| child as usize)
                .chain(self.top)
                .collect(),
        }
    }
}

#[derive(Debug)]
pub struct Btree {
    store: FieldStore,
    program: Program,
    machine: Machine,
}

impl Btree {
    pub fn builder() -> BtreeBuilder {
        BtreeBuilder::new()
    }

    pub fn new() -> Result<Self> {
        BtreeBuilder::new().build()
    }

    pub(crate) fn with_geometry(
        geometry: Geometry,
        limits: Limits,
        suppress_halt_messages: bool,
    ) -> Result<Self> {
        let mut store = FieldStore::new();
        let machine = Machine::new(&mut store, geometry)?;
        let mut program = Program::new(limits);
        program.set_suppress_halt_messages(suppress_halt_messages);

        // setup is straight-line, one step per instruction, and grows with
        // the pool; only the operations that follow run under `limits`
        machine.record_setup(&mut program);
        program.set_limits(Limits {
            max_steps: limits.max_steps.max(program.len() as u64),
        });
        program.run(&mut store)?.into_result()?;
        program.set_limits(limits);
        let setup = program.checkpoint();
        program.continue_from(setup);

        debug!(
            target: "stucktree::btree",
            node_count = geometry.node_count,
            capacity = geometry.capacity,
            fields = store.len(),
            "btree created"
        );

        Ok(Self {
            store,
            program,
            machine,
        })
    }

    pub fn geometry(&self) -> Geometry {
        self.machine.geometry
    }

    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    fn execute(
        &mut self,
        operation: &'static str,
        record: impl FnOnce(&Machine, &mut Program),
    ) -> Result<u64> {
        self.program.clear();
        record(&self.machine, &mut self.program);
        let outcome = self.program.run(&mut self.store)?;
        debug!(
            target: "stucktree::btree",
            operation,
            steps = outcome.steps(),
            halted = outcome.is_halted(),
            "operation finished"
        );
        outcome.into_result()
    }

    fn check_width(value: u64, bits: u32, message: &str) -> Result<()> {
        if bits < 64 && value >> bits != 0 {
            bail!(Halt::new(message));
        }
        Ok(())
    }

    fn check_node(&self, node: usize) -> Result<()> {
        if node >= self.machine.geometry.node_count {
            bail!(Halt::new(NODE_OUT_OF_RANGE));
        }
        Ok(())
    }

    fn check_slot(&self, index: usize) -> Result<()> {
        if index >= self.machine.geometry.capacity {
            bail!(Halt::new(SLOT_OUT_OF_RANGE));
        }
        Ok(())
    }

    // ========================================================================
    // Keyed access
    // ========================================================================

    /// Inserts `key`, or replaces its data if already present.
    pub fn put(&mut self, key: u64, data: u64) -> Result<()> {
        let geometry = self.machine.geometry;
        Self::check_width(key, geometry.bits_per_key, KEY_TOO_WIDE)?;
        Self::check_width(data, geometry.bits_per_data, DATA_TOO_WIDE)?;

        self.execute("put", |m, p| {
            p.write(m.regs.key, key);
            p.write(m.regs.datum, data);
            m.record_put(p);
        })?;
        Ok(())
    }

    pub fn find(&mut self, key: u64) -> Result<FindResult> {
        Self::check_width(key, self.machine.geometry.bits_per_key, KEY_TOO_WIDE)?;

        self.execute("find", |m, p| {
            p.write(m.regs.key, key);
            m.record_find(p);
        })?;

        let regs = &self.machine.regs;
        Ok(FindResult {
            found: self.store.value(regs.found) != 0,
            data: self.store.value(regs.result),
            node: self.store.value(regs.node_index) as usize,
            index: self.store.value(regs.stuck_index) as usize,
        })
    }

    pub fn get(&mut self, key: u64) -> Result<Option<u64>> {
        let found = self.find(key)?;
        Ok(found.found.then_some(found.data))
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    pub fn allocate(&mut self) -> Result<usize> {
        self.execute("allocate", |m, p| m.allocate(p, m.regs.new_node))?;
        Ok(self.store.value(self.machine.regs.new_node) as usize)
    }

    pub fn allocate_leaf(&mut self) -> Result<usize> {
        self.allocate_kind(NodeKind::Leaf)
    }

    pub fn allocate_branch(&mut self) -> Result<usize> {
        self.allocate_kind(NodeKind::Branch)
    }

    fn allocate_kind(&mut self, kind: NodeKind) -> Result<usize> {
        self.execute("allocate", |m, p| {
            m.allocate_kind(p, kind, m.regs.new_node)
        })?;
        Ok(self.store.value(self.machine.regs.new_node) as usize)
    }

    pub fn free(&mut self, node: usize) -> Result<()> {
        self.check_node(node)?;
        self.execute("free", |m, p| {
            p.write(m.regs.new_node, node);
            m.free(p, m.regs.new_node);
        })?;
        Ok(())
    }

    // ========================================================================
    // Splits
    // ========================================================================

    pub fn split_root_leaf(&mut self) -> Result<()> {
        self.execute("split_root_leaf", |m, p| {
            m.record_split_root(p, NodeKind::Leaf)
        })?;
        Ok(())
    }

    pub fn split_root_branch(&mut self) -> Result<()> {
        self.execute("split_root_branch", |m, p| {
            m.record_split_root(p, NodeKind::Branch)
        })?;
        Ok(())
    }

    pub fn split_leaf_not_top(&mut self, parent: usize, index: usize) -> Result<()> {
        self.split_child("split_leaf_not_top", NodeKind::Leaf, parent, Some(index))
    }

    pub fn split_leaf_at_top(&mut self, parent: usize) -> Result<()> {
        self.split_child("split_leaf_at_top", NodeKind::Leaf, parent, None)
    }

    pub fn split_branch_not_top(&mut self, parent: usize, index: usize) -> Result<()> {
        self.split_child("split_branch_not_top", NodeKind::Branch, parent, Some(index))
    }

    pub fn split_branch_at_top(&mut self, parent: usize) -> Result<()> {
        self.split_child("split_branch_at_top", NodeKind::Branch, parent, None)
    }

    fn split_child(
        &mut self,
        operation: &'static str,
        kind: NodeKind,
        parent: usize,
        index: Option<usize>,
    ) -> Result<()> {
        self.check_node(parent)?;
        if let Some(index) = index {
            self.check_slot(index)?;
        }
        self.execute(operation, |m, p| {
            p.write(m.regs.parent_index, parent);
            let position = match index {
                Some(index) => {
                    p.write(m.regs.position, index);
                    ChildPosition::Keyed(m.regs.position)
                }
                None => ChildPosition::Top,
            };
            m.record_split_child(p, kind, m.regs.parent_index, position);
        })?;
        Ok(())
    }

    // ========================================================================
    // Merges
    // ========================================================================

    pub fn merge_leaves_into_root(&mut self) -> Result<()> {
        self.execute("merge_leaves_into_root", |m, p| {
            m.record_merge_into_root(p, NodeKind::Leaf)
        })?;
        Ok(())
    }

    pub fn merge_branches_into_root(&mut self) -> Result<()> {
        self.execute("merge_branches_into_root", |m, p| {
            m.record_merge_into_root(p, NodeKind::Branch)
        })?;
        Ok(())
    }

    pub fn merge_leaves_not_top(&mut self, parent: usize, index: usize) -> Result<()> {
        self.merge_siblings("merge_leaves_not_top", NodeKind::Leaf, parent, Some(index))
    }

    pub fn merge_leaves_at_top(&mut self, parent: usize) -> Result<()> {
        self.merge_siblings("merge_leaves_at_top", NodeKind::Leaf, parent, None)
    }

    pub fn merge_branches_not_top(&mut self, parent: usize, index: usize) -> Result<()> {
        self.merge_siblings("merge_branches_not_top", NodeKind::Branch, parent, Some(index))
    }

    pub fn merge_branches_at_top(&mut self, parent: usize) -> Result<()> {
        self.merge_siblings("merge_branches_at_top", NodeKind::Branch, parent, None)
    }

    fn merge_siblings(
        &mut self,
        operation: &'static str,
        kind: NodeKind,
        parent: usize,
        index: Option<usize>,
    ) -> Result<()> {
        self.check_node(parent)?;
        if let Some(index) = index {
            self.check_slot(index)?;
        }
        self.execute(operation, |m, p| {
            p.write(m.regs.parent_index, parent);
            let position = match index {
                Some(index) => {
                    p.write(m.regs.position, index);
                    ChildPosition::Keyed(m.regs.position)
                }
                None => ChildPosition::Top,
            };
            m.record_merge_siblings(p, kind, m.regs.parent_index, position);
        })?;
        Ok(())
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn node(&self, index: usize) -> Result<NodeSnapshot> {
        self.check_node(index)?;
        let pool = &self.machine.pool;
        let capacity = self.machine.geometry.capacity;
        let peek = |field, slot: &[usize]| self.store.peek(field, slot);

        let kind = if peek(pool.is_leaf, &[index])? != 0 {
            NodeKind::Leaf
        } else {
            NodeKind::Branch
        };
        let size = (peek(pool.size, &[index])? as usize).min(capacity);
        let mut entries = Vec::with_capacity(size);
        for slot in 0..size {
            entries.push((
                peek(pool.keys, &[index, slot])?,
                peek(pool.data, &[index, slot])?,
            ));
        }
        let top = match kind {
            NodeKind::Branch if size < capacity => {
                Some(peek(pool.data, &[index, size])? as usize)
            }
            _ => None,
        };

        Ok(NodeSnapshot {
            index,
            kind,
            is_free: peek(pool.is_free, &[index])? != 0,
            free_next: peek(pool.free_next, &[index])? as usize,
            entries,
            top,
        })
    }

    /// Slots on the free chain, head first.
    pub fn free_chain(&self) -> Result<Vec<usize>> {
        let pool = &self.machine.pool;
        let limit = self.machine.geometry.node_count;
        let mut chain = Vec::new();
        let mut next = self.store.value(pool.free_start);
        while next != FREE_CHAIN_END {
            if chain.len() >= limit {
                bail!("free chain does not terminate within {} nodes", limit);
            }
            chain.push(next as usize);
            next = self.store.peek(pool.free_next, &[next as usize])?;
        }
        Ok(chain)
    }

    /// Every slot not marked free, root included.
    pub fn live_nodes(&self) -> Result<Vec<NodeSnapshot>> {
        let mut live = Vec::new();
        for index in 0..self.machine.geometry.node_count {
            let node = self.node(index)?;
            if !node.is_free {
                live.push(node);
            }
        }
        Ok(live)
    }

    /// Leaf entries in key order, walking from the root.
    pub fn entries(&self) -> Result<Vec<(u64, u64)>> {
        let mut entries = Vec::new();
        self.collect(ROOT_NODE as usize, 0, &mut entries)?;
        Ok(entries)
    }

    fn collect(&self, index: usize, depth: usize, out: &mut Vec<(u64, u64)>) -> Result<()> {
        if depth > self.machine.geometry.node_count {
            bail!("tree deeper than the node pool at node {}", index);
        }
        let node = self.node(index)?;
        match node.kind {
            NodeKind::Leaf => out.extend_from_slice(&node.entries),
            NodeKind::Branch => {
                for child in node.children() {
                    self.collect(child, depth + 1, out)?;
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
