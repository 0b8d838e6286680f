//! # Stuck: a Bounded Sorted Key/Value Vector
//!
//! A stuck is a fixed-capacity array of key/data pairs plus a `count`, laid
//! out as fields in the shared [`FieldStore`]. Every operation *records*
//! instructions onto a [`Program`]; nothing happens until the program runs.
//!
//! ## Layout
//!
//! ```text
//! count     var  bits_for(capacity)
//! slots     array capacity
//!   keys    var  bits_per_key
//!   data    var  bits_per_data
//! keyStash  var  bits_per_key        scratch, survives slot reads
//! dataStash var  bits_per_data
//! i, j      var  bits_for(2 * capacity)
//! limit     var  bits_for(2 * capacity)
//! flag      bit
//! ```
//!
//! ## The Pair Register
//!
//! The current values of `keys` and `data` act as a register. Inputs to
//! `push`, `unshift`, `set_element_at` and `insert_element_at` are taken from
//! it; `pop`, `shift`, `element_at` and `remove_element_at` leave their result
//! in it. Reading a slot always clobbers the register, so operations that
//! scan slots stash the register first.
//!
//! ## Invariants
//!
//! - `keys[0..count)` is strictly ascending when only the ordered operations
//!   are used
//! - slots at and beyond `count` are stale, except that a branch node keeps
//!   its top child in slot `count`
//! - every operation validates before it mutates: a halt leaves the stuck
//!   exactly as it was
//!
//! A stuck has no persistent identity. The tree copies a node's slots into a
//! staging stuck, operates on it, and copies it back.

mod ops;
mod search;
mod split;

pub use ops::{
    ELEMENT_BEYOND_END, EMPTY, INSERT_BEYOND_END, INSERT_FULL, NO_ROOM_PAST_LAST, POP_EMPTY,
    PUSH_FULL, REMOVE_BEYOND_END, REMOVE_EMPTY, SET_BEYOND_END, SET_FULL, SHIFT_EMPTY,
    UNSHIFT_FULL,
};
pub use split::{CUT_BEYOND_END, LEFT_TOO_SMALL, NO_ROOM, RIGHT_TOO_SMALL};

use eyre::{ensure, Result};

use crate::config::{bits_for, MAX_FIELD_WIDTH, MIN_STUCK_CAPACITY};
use crate::layout::{FieldId, FieldStore, Layout};
use crate::tape::{CompareOp, Index, Operand, Program};

#[derive(Debug)]
pub struct Stuck {
    name: String,
    capacity: usize,
    bits_per_key: u32,
    bits_per_data: u32,
    count: FieldId,
    keys: FieldId,
    data: FieldId,
    key_stash: FieldId,
    data_stash: FieldId,
    i: FieldId,
    j: FieldId,
    limit: FieldId,
    flag: FieldId,
}

impl Stuck {
    pub fn new(
        store: &mut FieldStore,
        name: &str,
        capacity: usize,
        bits_per_key: u32,
        bits_per_data: u32,
    ) -> Result<Self> {
        ensure!(
            capacity >= MIN_STUCK_CAPACITY && capacity % 2 == 0,
            "stuck {} capacity {} must be even and at least {}",
            name,
            capacity,
            MIN_STUCK_CAPACITY
        );
        ensure!(
            (1..=MAX_FIELD_WIDTH).contains(&bits_per_key)
                && (1..=MAX_FIELD_WIDTH).contains(&bits_per_data),
            "stuck {} key and data widths must be in 1..={}",
            name,
            MAX_FIELD_WIDTH
        );

        let count_bits = bits_for(capacity as u64);
        let index_bits = bits_for(2 * capacity as u64);
        let layout = Layout::build(store, |s| {
            s.var("count", count_bits);
            s.array("slots", capacity, |s| {
                s.var("keys", bits_per_key);
                s.var("data", bits_per_data);
            });
            s.var("keyStash", bits_per_key);
            s.var("dataStash", bits_per_data);
            s.var("i", index_bits);
            s.var("j", index_bits);
            s.var("limit", index_bits);
            s.bit("flag");
        })?;

        Ok(Self {
            name: name.to_string(),
            capacity,
            bits_per_key,
            bits_per_data,
            count: layout.locate("count")?,
            keys: layout.locate("keys")?,
            data: layout.locate("data")?,
            key_stash: layout.locate("keyStash")?,
            data_stash: layout.locate("dataStash")?,
            i: layout.locate("i")?,
            j: layout.locate("j")?,
            limit: layout.locate("limit")?,
            flag: layout.locate("flag")?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn bits_per_key(&self) -> u32 {
        self.bits_per_key
    }

    pub fn bits_per_data(&self) -> u32 {
        self.bits_per_data
    }

    pub fn count(&self) -> FieldId {
        self.count
    }

    /// Key half of the pair register.
    pub fn keys(&self) -> FieldId {
        self.keys
    }

    /// Data half of the pair register.
    pub fn data(&self) -> FieldId {
        self.data
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    pub fn count_in(&self, store: &FieldStore) -> usize {
        store.value(self.count) as usize
    }

    /// Live `(key, data)` pairs, read straight from storage.
    pub fn entries_in(&self, store: &FieldStore) -> Result<Vec<(u64, u64)>> {
        let count = self.count_in(store).min(self.capacity);
        let mut entries = Vec::with_capacity(count);
        for slot in 0..count {
            entries.push((
                store.peek(self.keys, &[slot])?,
                store.peek(self.data, &[slot])?,
            ));
        }
        Ok(entries)
    }

    /// The pair in slot `count`, where a branch keeps its top child.
    pub fn past_last_in(&self, store: &FieldStore) -> Result<Option<(u64, u64)>> {
        let count = self.count_in(store);
        if count >= self.capacity {
            return Ok(None);
        }
        Ok(Some((
            store.peek(self.keys, &[count])?,
            store.peek(self.data, &[count])?,
        )))
    }

    pub fn register_in(&self, store: &FieldStore) -> (u64, u64) {
        (store.value(self.keys), store.value(self.data))
    }

    // ========================================================================
    // Recording helpers
    // ========================================================================

    /// Records `for counter in from..to { body }`. The body may clobber
    /// `flag` but not `counter`.
    fn for_ascending(
        &self,
        p: &mut Program,
        counter: FieldId,
        from: impl Into<Operand>,
        to: impl Into<Operand>,
        body: impl FnOnce(&mut Program),
    ) {
        let to = to.into();
        p.write(counter, from);
        p.block(|p, block| {
            p.compare(self.flag, CompareOp::Ge, counter, to);
            p.goto_if_not_zero(block.end, self.flag);
            body(p);
            p.inc(counter);
            p.goto(block.start);
        });
    }

    /// Records `counter = from; while counter > to { body; counter -= 1 }`.
    fn for_descending(
        &self,
        p: &mut Program,
        counter: FieldId,
        from: impl Into<Operand>,
        to: impl Into<Operand>,
        body: impl FnOnce(&mut Program),
    ) {
        let to = to.into();
        p.write(counter, from);
        p.block(|p, block| {
            p.compare(self.flag, CompareOp::Le, counter, to);
            p.goto_if_not_zero(block.end, self.flag);
            body(p);
            p.dec(counter);
            p.goto(block.start);
        });
    }

    /// Copies slot `from` into slot `to`. Clobbers the register.
    fn copy_slot(&self, p: &mut Program, from: impl Into<Index>, to: impl Into<Index>) {
        let from = from.into();
        let to = to.into();
        p.read(self.keys, from.clone());
        p.store(self.keys, to.clone());
        p.read(self.data, from);
        p.store(self.data, to);
    }

    fn stash_register(&self, p: &mut Program) {
        p.move_from(self.key_stash, &[self.keys]);
        p.move_from(self.data_stash, &[self.data]);
    }

    fn restore_register(&self, p: &mut Program) {
        p.move_from(self.keys, &[self.key_stash]);
        p.move_from(self.data, &[self.data_stash]);
    }

    /// Halts with `message` unless `a op b` holds.
    fn require(
        &self,
        p: &mut Program,
        op: CompareOp,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
        message: &str,
    ) {
        p.compare(self.flag, op, a, b);
        p.halt_unless(self.flag, message);
    }

    fn require_not_full(&self, p: &mut Program, message: &str) {
        self.require(p, CompareOp::Lt, self.count, self.capacity, message);
    }

    fn require_not_empty(&self, p: &mut Program, message: &str) {
        self.require(p, CompareOp::Gt, self.count, 0u64, message);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn fixture(capacity: usize) -> (FieldStore, Program, Stuck) {
        let mut store = FieldStore::new();
        let stuck = Stuck::new(&mut store, "s", capacity, 8, 8).unwrap();
        let mut program = Program::default();
        program.set_suppress_halt_messages(true);
        (store, program, stuck)
    }

    #[test]
    fn stuck_new_rejects_odd_capacity() {
        let mut store = FieldStore::new();
        assert!(Stuck::new(&mut store, "s", 5, 8, 8).is_err());
        assert!(Stuck::new(&mut store, "s", 2, 8, 8).is_err());
    }

    #[test]
    fn stuck_new_starts_empty() {
        let (store, _, stuck) = fixture(4);

        assert_eq!(stuck.count_in(&store), 0);
        assert!(stuck.entries_in(&store).unwrap().is_empty());
        assert_eq!(stuck.capacity(), 4);
    }

    #[test]
    fn stuck_instances_share_a_store() {
        let mut store = FieldStore::new();
        let a = Stuck::new(&mut store, "a", 4, 8, 8).unwrap();
        let b = Stuck::new(&mut store, "b", 4, 8, 8).unwrap();

        assert_ne!(a.keys(), b.keys());
        assert_ne!(a.count(), b.count());
    }
}
