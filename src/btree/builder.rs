//! # Btree Builder
//!
//! `BtreeBuilder` configures the geometry of a tree before it is built.
//! Every setting has a default from [`crate::config`]:
//!
//! | Option                 | Default | Constraint                              |
//! |------------------------|---------|-----------------------------------------|
//! | node_count             | 16      | at least 1                              |
//! | stuck_capacity         | 4       | even, at least 4                        |
//! | bits_per_key           | 8       | 1..=63                                  |
//! | bits_per_data          | 8       | <= 64, and `> log2(node_count)`         |
//! | max_steps              | 250000  | instruction budget per operation        |
//! | suppress_halt_messages | false   | skip the `warn!` on every halt          |
//!
//! ```ignore
//! let tree = Btree::builder()
//!     .node_count(64)
//!     .stuck_capacity(4)
//!     .build()?;
//! ```
//!
//! A constraint violation is reported as a [`Halt`] error, the same channel
//! the tree uses for every refused operation.

use eyre::{bail, Result};

use super::machine::Geometry;
use super::tree::Btree;
use crate::config::{
    bits_for, DEFAULT_BITS_PER_DATA, DEFAULT_BITS_PER_KEY, DEFAULT_MAX_STEPS,
    DEFAULT_NODE_COUNT, DEFAULT_STUCK_CAPACITY, MAX_FIELD_WIDTH, MAX_KEY_BITS,
    MIN_STUCK_CAPACITY,
};
use crate::tape::{Halt, Limits};

pub const BAD_CAPACITY: &str = "Stuck capacity must be even and at least 4";
pub const BAD_NODE_COUNT: &str = "A tree needs at least one node";
pub const BAD_KEY_BITS: &str = "Bits per key must be between 1 and 63";
pub const DATA_BITS_TOO_SMALL: &str = "Bits per data too small for tree of this size";
pub const DATA_BITS_TOO_LARGE: &str = "Bits per data must be at most 64";

#[derive(Debug, Clone)]
pub struct BtreeBuilder {
    node_count: usize,
    stuck_capacity: usize,
    bits_per_key: u32,
    bits_per_data: u32,
    max_steps: u64,
    suppress_halt_messages: bool,
}

impl Default for BtreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BtreeBuilder {
    pub fn new() -> Self {
        Self {
            node_count: DEFAULT_NODE_COUNT,
            stuck_capacity: DEFAULT_STUCK_CAPACITY,
            bits_per_key: DEFAULT_BITS_PER_KEY,
            bits_per_data: DEFAULT_BITS_PER_DATA,
            max_steps: DEFAULT_MAX_STEPS,
            suppress_halt_messages: false,
        }
    }

    pub fn node_count(mut self, node_count: usize) -> Self {
        self.node_count = node_count;
        self
    }

    pub fn stuck_capacity(mut self, capacity: usize) -> Self {
        self.stuck_capacity = capacity;
        self
    }

    pub fn bits_per_key(mut self, bits: u32) -> Self {
        self.bits_per_key = bits;
        self
    }

    pub fn bits_per_data(mut self, bits: u32) -> Self {
        self.bits_per_data = bits;
        self
    }

    pub fn max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn suppress_halt_messages(mut self, suppress: bool) -> Self {
        self.suppress_halt_messages = suppress;
        self
    }

    fn validate(&self) -> Result<Geometry> {
        if self.stuck_capacity < MIN_STUCK_CAPACITY || self.stuck_capacity % 2 != 0 {
            bail!(Halt::new(BAD_CAPACITY));
        }
        if self.node_count == 0 {
            bail!(Halt::new(BAD_NODE_COUNT));
        }
        if !(1..=MAX_KEY_BITS).contains(&self.bits_per_key) {
            bail!(Halt::new(BAD_KEY_BITS));
        }
        if self.bits_per_data > MAX_FIELD_WIDTH {
            bail!(Halt::new(DATA_BITS_TOO_LARGE));
        }
        if self.bits_per_data < bits_for(self.node_count as u64) {
            bail!(Halt::new(DATA_BITS_TOO_SMALL));
        }

        Ok(Geometry {
            node_count: self.node_count,
            capacity: self.stuck_capacity,
            bits_per_key: self.bits_per_key,
            bits_per_data: self.bits_per_data,
        })
    }

    pub fn build(self) -> Result<Btree> {
        let geometry = self.validate()?;
        Btree::with_geometry(
            geometry,
            Limits {
                max_steps: self.max_steps,
            },
            self.suppress_halt_messages,
        )
    }
}
