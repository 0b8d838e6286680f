//! Stack and random-access operations.
//!
//! ```text
//! push / pop              end of the vector
//! unshift / shift         start of the vector
//! element_at, set_element_at, insert_element_at, remove_element_at
//! first_element, last_element
//! set_past_last_element / element_past_last   slot `count`, the branch top
//! ```

use super::Stuck;
use crate::layout::FieldId;
use crate::tape::{CompareOp, Operand, Program};

pub const PUSH_FULL: &str = "Cannot push to a full stuck";
pub const POP_EMPTY: &str = "Cannot pop from an empty stuck";
pub const UNSHIFT_FULL: &str = "Cannot unshift into a full stuck";
pub const SHIFT_EMPTY: &str = "Cannot shift from an empty stuck";
pub const ELEMENT_BEYOND_END: &str = "Index is beyond the end of the stuck";
pub const SET_BEYOND_END: &str = "Cannot set an element beyond the end of the stuck";
pub const SET_FULL: &str = "Cannot extend a full stuck";
pub const INSERT_FULL: &str = "Cannot insert into a full stuck";
pub const INSERT_BEYOND_END: &str = "Cannot insert beyond the end of the stuck";
pub const REMOVE_EMPTY: &str = "Cannot remove from an empty stuck";
pub const REMOVE_BEYOND_END: &str = "Cannot remove beyond the end of the stuck";
pub const EMPTY: &str = "Stuck is empty";
pub const NO_ROOM_PAST_LAST: &str = "No room past the last element of a full stuck";

impl Stuck {
    pub fn clear(&self, p: &mut Program) {
        p.zero(self.count);
    }

    pub fn is_full(&self, p: &mut Program, flag: FieldId) {
        p.compare(flag, CompareOp::Ge, self.count, self.capacity);
    }

    pub fn is_empty(&self, p: &mut Program, flag: FieldId) {
        p.compare(flag, CompareOp::Eq, self.count, 0u64);
    }

    pub fn push(&self, p: &mut Program) {
        self.require_not_full(p, PUSH_FULL);
        p.store(self.keys, self.count);
        p.store(self.data, self.count);
        p.inc(self.count);
    }

    pub fn pop(&self, p: &mut Program) {
        self.require_not_empty(p, POP_EMPTY);
        p.dec(self.count);
        p.read(self.keys, self.count);
        p.read(self.data, self.count);
    }

    pub fn unshift(&self, p: &mut Program) {
        self.require_not_full(p, UNSHIFT_FULL);
        self.open_gap(p, 0u64);
    }

    pub fn shift(&self, p: &mut Program) {
        self.require_not_empty(p, SHIFT_EMPTY);
        self.close_gap(p, 0u64);
    }

    pub fn element_at(&self, p: &mut Program, at: impl Into<Operand>) {
        let at = at.into();
        self.require(p, CompareOp::Lt, at, self.count, ELEMENT_BEYOND_END);
        p.read(self.keys, at);
        p.read(self.data, at);
    }

    /// Overwrites slot `at` with the register. `at == count` appends.
    pub fn set_element_at(&self, p: &mut Program, at: impl Into<Operand>) {
        let at = at.into();
        self.require(p, CompareOp::Le, at, self.count, SET_BEYOND_END);
        self.require(p, CompareOp::Lt, at, self.capacity, SET_FULL);
        p.store(self.keys, at);
        p.store(self.data, at);
        p.compare(self.flag, CompareOp::Eq, at, self.count);
        p.if_then(self.flag, |p| p.inc(self.count));
    }

    pub fn insert_element_at(&self, p: &mut Program, at: impl Into<Operand>) {
        let at = at.into();
        self.require_not_full(p, INSERT_FULL);
        self.require(p, CompareOp::Le, at, self.count, INSERT_BEYOND_END);
        self.open_gap(p, at);
    }

    /// Removes slot `at`, leaving the removed pair in the register.
    pub fn remove_element_at(&self, p: &mut Program, at: impl Into<Operand>) {
        let at = at.into();
        self.require_not_empty(p, REMOVE_EMPTY);
        self.require(p, CompareOp::Lt, at, self.count, REMOVE_BEYOND_END);
        self.close_gap(p, at);
    }

    pub fn first_element(&self, p: &mut Program) {
        self.require_not_empty(p, EMPTY);
        p.read(self.keys, 0u64);
        p.read(self.data, 0u64);
    }

    pub fn last_element(&self, p: &mut Program) {
        self.require_not_empty(p, EMPTY);
        p.sub(self.j, self.count, 1u64);
        p.read(self.keys, self.j);
        p.read(self.data, self.j);
    }

    /// Writes the register into slot `count` without counting it.
    pub fn set_past_last_element(&self, p: &mut Program) {
        self.require_not_full(p, NO_ROOM_PAST_LAST);
        p.store(self.keys, self.count);
        p.store(self.data, self.count);
    }

    pub fn element_past_last(&self, p: &mut Program) {
        self.require_not_full(p, NO_ROOM_PAST_LAST);
        p.read(self.keys, self.count);
        p.read(self.data, self.count);
    }

    /// Shifts slots `[at, count)` up by one and writes the register at `at`.
    /// Callers check capacity and bounds first.
    fn open_gap(&self, p: &mut Program, at: impl Into<Operand>) {
        let at = at.into();
        self.stash_register(p);
        p.add(self.limit, at, 0u64);
        self.for_descending(p, self.i, self.count, self.limit, |p| {
            p.sub(self.j, self.i, 1u64);
            self.copy_slot(p, self.j, self.i);
        });
        p.write_at(self.keys, self.key_stash, self.limit);
        p.write_at(self.data, self.data_stash, self.limit);
        p.inc(self.count);
    }

    /// Removes slot `at` by shifting `(at, count)` down by one. The removed
    /// pair is left in the register.
    fn close_gap(&self, p: &mut Program, at: impl Into<Operand>) {
        let at = at.into();
        p.add(self.limit, at, 0u64);
        p.read(self.keys, self.limit);
        p.read(self.data, self.limit);
        self.stash_register(p);
        p.add(self.limit, self.limit, 1u64);
        self.for_ascending(p, self.i, self.limit, self.count, |p| {
            p.sub(self.j, self.i, 1u64);
            self.copy_slot(p, self.i, self.j);
        });
        p.dec(self.count);
        self.restore_register(p);
    }
}
