//! # B-Tree over a Fixed Node Pool
//!
//! This module implements a B-tree whose nodes live in a fixed pool of
//! bounded slots. There are no pointers and no allocation after
//! construction: nodes are integer indices into the pool, and every change
//! is recorded as tape instructions over named fields.
//!
//! ## Architecture Overview
//!
//! ```text
//! +------------------+     records      +------------------+
//! | Btree (tree.rs)  | ---------------> | Program (tape)   |
//! |  put / find      |                  +------------------+
//! |  splits / merges |                           | runs against
//! |  inspection      |                           v
//! +------------------+                  +------------------+
//!          |                            | FieldStore       |
//!          | owns                       |  pool fields     |
//!          v                            |  stuck fields    |
//! +------------------+                  |  registers       |
//! | Machine          | ---- fields ---> +------------------+
//! |  pool, stucks    |
//! |  registers       |
//! +------------------+
//! ```
//!
//! ## Node Types
//!
//! - **Leaf**: `size` key/data pairs, sorted by key
//! - **Branch**: `size` key/child pairs plus a key-less top child in slot
//!   `size`. The child under key `k` holds keys `<= k`; the top child holds
//!   keys greater than every stored key.
//!
//! A leaf is full at `capacity` keys, a branch at `capacity - 1`, leaving
//! its last slot for the top child.
//!
//! ## Navigation Semantics
//!
//! For a search key K at a branch:
//! - the first slot whose key is `>= K` gives the child
//! - if no such slot exists, the top child
//!
//! ## Module Organization
//!
//! - `machine`: pool layout, staging stucks, registers, setup
//! - `pool`: free chain allocation, node staging
//! - `find`: descent
//! - `insert`: put with split-on-descent
//! - `split`, `merge`: structural primitives
//! - `builder`, `tree`: the public API

mod builder;
mod find;
mod insert;
mod machine;
mod merge;
mod pool;
mod split;
mod tree;

pub use builder::{
    BtreeBuilder, BAD_CAPACITY, BAD_KEY_BITS, BAD_NODE_COUNT, DATA_BITS_TOO_LARGE,
    DATA_BITS_TOO_SMALL,
};
pub use machine::Geometry;
pub use merge::{
    NO_KEYED_RIGHT, PARENT_NEEDS_TWO, ROOT_NEEDS_ONE_KEY, SAME_CHILD, WOULD_NOT_FIT,
};
pub use pool::{ALREADY_FREE, CANNOT_FREE_ROOT, OUT_OF_MEMORY};
pub use split::{
    CHILD_NOT_BRANCH, CHILD_NOT_LEAF, NOT_FULL, PARENT_FULL, PARENT_NOT_BRANCH, ROOT_NOT_BRANCH,
    ROOT_NOT_LEAF,
};
pub use tree::{
    Btree, FindResult, NodeSnapshot, DATA_TOO_WIDE, KEY_TOO_WIDE, NODE_OUT_OF_RANGE,
    SLOT_OUT_OF_RANGE,
};

use crate::layout::FieldId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Leaf,
    Branch,
}

impl NodeKind {
    pub fn is_leaf(self) -> bool {
        self == NodeKind::Leaf
    }

    pub(crate) fn pick<T>(self, leaf: T, branch: T) -> T {
        match self {
            NodeKind::Leaf => leaf,
            NodeKind::Branch => branch,
        }
    }
}

/// Where a child sits in its parent branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChildPosition {
    /// Under the key at the index held in this field.
    Keyed(FieldId),
    Top,
}
