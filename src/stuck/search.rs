//! Linear key searches.
//!
//! Both searches compare slot keys against the key in the register and
//! leave the register as they found it.

use super::Stuck;
use crate::layout::FieldId;
use crate::tape::{CompareOp, Program};

impl Stuck {
    /// Sets `found` and `index` to the slot holding exactly the register key.
    /// `found` is zero when no slot matches.
    pub fn search_eq(&self, p: &mut Program, found: FieldId, index: FieldId) {
        self.search(p, CompareOp::Eq, found, index);
    }

    /// Sets `found` and `index` to the first slot whose key is at least the
    /// register key. When every key is smaller, `found` is zero and `index`
    /// is `count`.
    pub fn search_le(&self, p: &mut Program, found: FieldId, index: FieldId) {
        self.search(p, CompareOp::Ge, found, index);
    }

    fn search(&self, p: &mut Program, op: CompareOp, found: FieldId, index: FieldId) {
        self.stash_register(p);
        p.zero(found);
        p.move_from(index, &[self.count]);
        p.block(|p, done| {
            self.for_ascending(p, self.i, 0u64, self.count, |p| {
                p.read(self.keys, self.i);
                p.compare(self.flag, op, self.keys, self.key_stash);
                p.if_then(self.flag, |p| {
                    p.one(found);
                    p.move_from(index, &[self.i]);
                    p.goto(done.end);
                });
            });
        });
        self.restore_register(p);
    }
}
