//! # stucktree - A B-Tree over Fixed Bit-Field Memory
//!
//! stucktree is a key/value B-tree whose nodes live in a fixed pool of
//! bounded slots instead of on a heap. Every mutation is expressed as a short
//! sequence of single-writer operations on named, fixed-width bit fields, so
//! the whole structure could later be mapped onto fixed hardware memory.
//!
//! ## Quick Start
//!
//! ```ignore
//! use stucktree::Btree;
//!
//! let mut tree = Btree::builder()
//!     .node_count(64)
//!     .stuck_capacity(4)
//!     .build()?;
//!
//! tree.put(10, 11)?;
//! assert_eq!(tree.get(10)?, Some(11));
//! ```
//!
//! ## Architecture
//!
//! stucktree is layered, each layer recording instructions for the one below:
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Btree (pool, find, put, splits)   │
//! ├─────────────────────────────────────┤
//! │   Stuck (bounded sorted key/data)   │
//! ├─────────────────────────────────────┤
//! │   Program (instruction tape, run)   │
//! ├─────────────────────────────────────┤
//! │   FieldStore + Layout (bit fields)  │
//! └─────────────────────────────────────┘
//! ```
//!
//! Control flows down, data flows up: the tree records a program, the
//! program runs against the field store, and the tree reads the resulting
//! field values back.
//!
//! ## Failure Model
//!
//! Refused operations (full stuck, out of memory, wrong node kind) halt the
//! program before it mutates anything and surface as a [`tape::Halt`] error.
//! Broken programs (runaway loops, bad indices) surface as a
//! [`tape::TapeFault`]. Both travel inside `eyre::Report` and can be
//! recovered with `downcast_ref`.
//!
//! ## Module Overview
//!
//! - [`config`]: numeric defaults and limits
//! - [`layout`]: field store, field kinds, layout builder
//! - [`tape`]: instructions, labels, the interpreter
//! - [`stuck`]: bounded sorted vector built from tape instructions
//! - [`btree`]: node pool, allocator, find, put, split, merge

pub mod btree;
pub mod config;
pub mod layout;
pub mod stuck;
pub mod tape;

pub use btree::{Btree, BtreeBuilder, FindResult, Geometry, NodeKind, NodeSnapshot};
pub use layout::{FieldId, FieldStore, Layout};
pub use stuck::Stuck;
pub use tape::{Halt, Limits, Outcome, Program, TapeFault};
