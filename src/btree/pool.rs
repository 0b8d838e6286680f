//! # Node Pool: Allocation and Staging
//!
//! Slots are handed out from a free chain threaded through `freeNext`:
//!
//! ```text
//! freeStart -> 3 -> 5 -> 6 -> 0 (end)
//! ```
//!
//! `allocate` pops the head, `free` pushes onto it. Slot 0 is the root and is
//! never on the chain, so `0` doubles as the terminator.
//!
//! Node contents are never edited in place. A node is copied into a staging
//! stuck with [`Machine::load`], edited there, and written back with
//! [`Machine::save`]. Copies cover every slot up to capacity so that a
//! branch's top child in slot `size` travels with it.

use super::machine::Machine;
use super::NodeKind;
use crate::config::{FREE_CHAIN_END, ROOT_NODE};
use crate::layout::FieldId;
use crate::stuck::Stuck;
use crate::tape::{CompareOp, Operand, Program};

pub const OUT_OF_MEMORY: &str = "Out of memory";
pub const CANNOT_FREE_ROOT: &str = "Cannot free the root";
pub const ALREADY_FREE: &str = "Cannot free a node that is already free";

impl Machine {
    pub fn load(&self, p: &mut Program, stuck: &Stuck, node: impl Into<Operand>) {
        let node = node.into();
        for slot in 0..self.capacity() {
            p.read(self.pool.keys, (node, slot));
            p.move_from(stuck.keys(), &[self.pool.keys]);
            p.store(stuck.keys(), slot);
            p.read(self.pool.data, (node, slot));
            p.move_from(stuck.data(), &[self.pool.data]);
            p.store(stuck.data(), slot);
        }
        p.read(self.pool.size, node);
        p.move_from(stuck.count(), &[self.pool.size]);
    }

    pub fn save(&self, p: &mut Program, stuck: &Stuck, node: impl Into<Operand>) {
        let node = node.into();
        for slot in 0..self.capacity() {
            p.read(stuck.keys(), slot);
            p.move_from(self.pool.keys, &[stuck.keys()]);
            p.store(self.pool.keys, (node, slot));
            p.read(stuck.data(), slot);
            p.move_from(self.pool.data, &[stuck.data()]);
            p.store(self.pool.data, (node, slot));
        }
        p.move_from(self.pool.size, &[stuck.count()]);
        p.store(self.pool.size, node);
    }

    /// Halts unless the free chain holds at least `needed` slots (1 or 2).
    pub fn require_free(&self, p: &mut Program, needed: usize) {
        let flag = self.regs.flag;
        p.compare(flag, CompareOp::Eq, self.pool.free_start, FREE_CHAIN_END);
        p.halt_if(flag, OUT_OF_MEMORY);
        if needed > 1 {
            p.read(self.pool.free_next, self.pool.free_start);
            p.compare(flag, CompareOp::Eq, self.pool.free_next, FREE_CHAIN_END);
            p.halt_if(flag, OUT_OF_MEMORY);
        }
    }

    /// Pops the head of the free chain into `out`.
    pub fn allocate(&self, p: &mut Program, out: FieldId) {
        self.require_free(p, 1);
        p.move_from(out, &[self.pool.free_start]);
        p.read(self.pool.free_next, out);
        p.move_from(self.pool.free_start, &[self.pool.free_next]);
        p.write_at(self.pool.is_free, 0u64, out);
        p.write_at(self.pool.free_next, FREE_CHAIN_END, out);
        p.trace("allocate", Some(out));
    }

    pub fn allocate_kind(&self, p: &mut Program, kind: NodeKind, out: FieldId) {
        self.allocate(p, out);
        p.write_at(self.pool.is_leaf, kind.is_leaf(), out);
    }

    /// Halts unless `node` could go back on the free chain: not the root
    /// and not already free.
    pub fn require_freeable(&self, p: &mut Program, node: FieldId) {
        let flag = self.regs.flag;
        p.compare(flag, CompareOp::Eq, node, ROOT_NODE);
        p.halt_if(flag, CANNOT_FREE_ROOT);
        p.read(self.pool.is_free, node);
        p.halt_if(self.pool.is_free, ALREADY_FREE);
    }

    /// Pushes `node` back onto the free chain.
    pub fn free(&self, p: &mut Program, node: FieldId) {
        self.require_freeable(p, node);
        p.write_at(self.pool.free_next, self.pool.free_start, node);
        p.move_from(self.pool.free_start, &[node]);
        p.write_at(self.pool.is_free, 1u64, node);
        p.write_at(self.pool.size, 0u64, node);
        p.trace("free", Some(node));
    }

    /// Loads the leaf bit of `node` into the current value of `isLeaf`.
    pub fn read_is_leaf(&self, p: &mut Program, node: impl Into<Operand>) -> FieldId {
        p.read(self.pool.is_leaf, node.into());
        self.pool.is_leaf
    }

    /// Halts with `message` unless `node` is of `kind`.
    pub fn require_kind(
        &self,
        p: &mut Program,
        node: impl Into<Operand>,
        kind: NodeKind,
        message: &str,
    ) {
        let is_leaf = self.read_is_leaf(p, node);
        match kind {
            NodeKind::Leaf => p.halt_unless(is_leaf, message),
            NodeKind::Branch => p.halt_if(is_leaf, message),
        }
    }

    /// Halts with `message` unless `node` holds exactly the keys of a full
    /// node of `kind`.
    pub fn require_full(
        &self,
        p: &mut Program,
        node: impl Into<Operand>,
        kind: NodeKind,
        message: &str,
    ) {
        p.read(self.pool.size, node.into());
        p.compare(self.regs.flag, CompareOp::Ge, self.pool.size, self.full_size(kind));
        p.halt_unless(self.regs.flag, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::btree::machine::Geometry;
    use crate::layout::FieldStore;

    fn setup(node_count: usize) -> (FieldStore, Program, Machine) {
        let mut store = FieldStore::new();
        let machine = Machine::new(
            &mut store,
            Geometry {
                node_count,
                capacity: 4,
                bits_per_key: 8,
                bits_per_data: 8,
            },
        )
        .unwrap();
        let mut p = Program::default();
        p.set_suppress_halt_messages(true);
        machine.record_setup(&mut p);
        p.run(&mut store).unwrap();
        let origin = p.checkpoint();
        p.continue_from(origin);
        (store, p, machine)
    }

    fn chain(store: &FieldStore, machine: &Machine) -> Vec<u64> {
        let mut nodes = Vec::new();
        let mut next = store.value(machine.pool.free_start);
        while next != FREE_CHAIN_END {
            nodes.push(next);
            next = store
                .peek(machine.pool.free_next, &[next as usize])
                .unwrap();
        }
        nodes
    }

    #[test]
    fn setup_threads_every_slot_but_the_root() {
        let (store, _, machine) = setup(6);

        assert_eq!(chain(&store, &machine), vec![1, 2, 3, 4, 5]);
        assert_eq!(store.peek(machine.pool.is_leaf, &[0]).unwrap(), 1);
        assert_eq!(store.peek(machine.pool.is_free, &[0]).unwrap(), 0);
    }

    #[test]
    fn allocate_pops_the_head() {
        let (mut store, mut p, machine) = setup(4);
        let out = machine.regs.new_node;

        machine.allocate_kind(&mut p, NodeKind::Leaf, out);
        p.run(&mut store).unwrap().into_result().unwrap();

        assert_eq!(store.value(out), 1);
        assert_eq!(chain(&store, &machine), vec![2, 3]);
        assert_eq!(store.peek(machine.pool.is_free, &[1]).unwrap(), 0);
        assert_eq!(store.peek(machine.pool.is_leaf, &[1]).unwrap(), 1);
        assert_eq!(store.peek(machine.pool.free_next, &[1]).unwrap(), 0);
    }

    #[test]
    fn allocate_on_empty_chain_halts() {
        let (mut store, mut p, machine) = setup(2);
        let out = machine.regs.new_node;

        machine.allocate(&mut p, out);
        machine.allocate(&mut p, out);
        let outcome = p.run(&mut store).unwrap();

        assert_eq!(outcome.halt_message(), Some(OUT_OF_MEMORY));
        assert!(chain(&store, &machine).is_empty());
    }

    #[test]
    fn free_pushes_onto_the_head() {
        let (mut store, mut p, machine) = setup(4);
        let out = machine.regs.new_node;

        machine.allocate(&mut p, out);
        machine.free(&mut p, out);
        p.run(&mut store).unwrap().into_result().unwrap();

        assert_eq!(chain(&store, &machine), vec![1, 2, 3]);
        assert_eq!(store.peek(machine.pool.is_free, &[1]).unwrap(), 1);
    }

    #[test]
    fn free_root_halts() {
        let (mut store, mut p, machine) = setup(4);
        let node = machine.regs.new_node;

        p.zero(node);
        machine.free(&mut p, node);

        assert_eq!(
            p.run(&mut store).unwrap().halt_message(),
            Some(CANNOT_FREE_ROOT)
        );
    }

    #[test]
    fn double_free_halts() {
        let (mut store, mut p, machine) = setup(4);
        let node = machine.regs.new_node;

        p.write(node, 2u64);
        machine.free(&mut p, node);

        assert_eq!(
            p.run(&mut store).unwrap().halt_message(),
            Some(ALREADY_FREE)
        );
        assert_eq!(chain(&store, &machine), vec![1, 2, 3]);
    }

    #[test]
    fn save_then_load_moves_all_slots() {
        let (mut store, mut p, machine) = setup(4);
        let node = &machine.node;

        for key in [3u64, 5, 7] {
            p.write(node.keys(), key);
            p.write(node.data(), key * 2);
            node.push(&mut p);
        }
        p.write(node.data(), 9u64);
        node.set_past_last_element(&mut p);
        machine.save(&mut p, node, 2usize);
        machine.load(&mut p, &machine.left, 2usize);
        p.run(&mut store).unwrap().into_result().unwrap();

        assert_eq!(
            machine.left.entries_in(&store).unwrap(),
            vec![(3, 6), (5, 10), (7, 14)]
        );
        assert_eq!(machine.left.past_last_in(&store).unwrap().map(|e| e.1), Some(9));
        assert_eq!(store.peek(machine.pool.size, &[2]).unwrap(), 3);
    }
}
