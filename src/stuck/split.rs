//! Splitting one stuck into others and concatenating two.
//!
//! ```text
//! split_into_two(cut):     [ 0 .. cut ) -> left    [ cut .. count ) -> right
//! split_into_three(cut):   [ 0 .. cut ) -> left    slot cut -> parent@at
//!                                                  ( cut .. count ) -> right
//! ```
//!
//! The source stuck is left untouched by either split.

use super::Stuck;
use crate::tape::{CompareOp, Operand, Program};

pub const CUT_BEYOND_END: &str = "Split point is beyond the end of the stuck";
pub const LEFT_TOO_SMALL: &str = "Left stuck is too small for the split";
pub const RIGHT_TOO_SMALL: &str = "Right stuck is too small for the split";
pub const NO_ROOM: &str = "No room to concatenate stucks";

impl Stuck {
    pub fn split_into_two(&self, p: &mut Program, left: &Stuck, right: &Stuck, cut: impl Into<Operand>) {
        let cut = cut.into();
        self.require(p, CompareOp::Lt, cut, self.count, CUT_BEYOND_END);
        self.require(p, CompareOp::Le, cut, left.capacity, LEFT_TOO_SMALL);
        p.sub(self.limit, self.count, cut);
        self.require(p, CompareOp::Le, self.limit, right.capacity, RIGHT_TOO_SMALL);

        self.copy_range_into(p, left, 0u64, cut);
        self.copy_range_into(p, right, cut, self.count);
    }

    /// Splits around slot `cut`, which is inserted into `parent` at `at`.
    pub fn split_into_three(
        &self,
        p: &mut Program,
        left: &Stuck,
        right: &Stuck,
        cut: impl Into<Operand>,
        parent: &Stuck,
        at: impl Into<Operand>,
    ) {
        let cut = cut.into();
        let at = at.into();
        self.require(p, CompareOp::Lt, cut, self.count, CUT_BEYOND_END);
        self.require(p, CompareOp::Le, cut, left.capacity, LEFT_TOO_SMALL);
        p.sub(self.limit, self.count, cut);
        p.dec(self.limit);
        self.require(p, CompareOp::Le, self.limit, right.capacity, RIGHT_TOO_SMALL);
        parent.require_not_full(p, super::ops::INSERT_FULL);
        parent.require(p, CompareOp::Le, at, parent.count, super::ops::INSERT_BEYOND_END);

        self.copy_range_into(p, left, 0u64, cut);
        p.add(self.limit, cut, 1u64);
        self.copy_range_into(p, right, self.limit, self.count);

        p.read(self.keys, cut);
        p.read(self.data, cut);
        p.move_from(parent.keys, &[self.keys]);
        p.move_from(parent.data, &[self.data]);
        parent.insert_element_at(p, at);
    }

    /// Appends every entry of `other` after this stuck's entries.
    pub fn concatenate(&self, p: &mut Program, other: &Stuck) {
        p.add(self.limit, self.count, other.count);
        self.require(p, CompareOp::Le, self.limit, self.capacity, NO_ROOM);

        other.for_ascending(p, other.i, 0u64, other.count, |p| {
            p.read(other.keys, other.i);
            p.move_from(self.keys, &[other.keys]);
            p.read(other.data, other.i);
            p.move_from(self.data, &[other.data]);
            p.add(self.j, self.count, other.i);
            p.store(self.keys, self.j);
            p.store(self.data, self.j);
        });
        p.move_from(self.count, &[self.limit]);
    }

    /// Replaces `target`'s entries with this stuck's slots `[from, to)`.
    fn copy_range_into(
        &self,
        p: &mut Program,
        target: &Stuck,
        from: impl Into<Operand>,
        to: impl Into<Operand>,
    ) {
        let from = from.into();
        self.for_ascending(p, self.i, from, to, |p| {
            p.sub(target.j, self.i, from);
            p.read(self.keys, self.i);
            p.move_from(target.keys, &[self.keys]);
            p.store(target.keys, target.j);
            p.read(self.data, self.i);
            p.move_from(target.data, &[self.data]);
            p.store(target.data, target.j);
        });
        p.sub(target.count, self.i, from);
    }
}
