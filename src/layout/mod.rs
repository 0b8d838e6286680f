//! # Memory Layout Engine
//!
//! This module describes the bit-addressable memory the tree lives in. Memory
//! is a set of named, fixed-width fields, some of them replicated across the
//! dimensions of the arrays that enclose them.
//!
//! ## Architecture Overview
//!
//! ```text
//! +-----------------------------+
//! | Layout (name -> FieldId)    |  one per component: pool, stuck, scratch
//! +-----------------------------+
//!               |
//!               v
//! +-----------------------------+
//! | FieldStore (arena)          |  every field of every layout
//! |  [Field 0] value, cells[]   |
//! |  [Field 1] value            |
//! |  ...                        |
//! +-----------------------------+
//! ```
//!
//! Fields are mutated only by instructions executed from a tape (see
//! [`crate::tape`]). The accessors here that read storage directly are for
//! inspection and tests.
//!
//! ## Field Kinds
//!
//! - **array**: grouping only, contributes a dimension to nested fields
//! - **var**: an integer of 1..=64 bits
//! - **bit**: a var of width 1
//!
//! A var or bit nested in arrays owns `product(enclosing repetitions)` cells.

mod field;
mod schema;

pub use field::{Field, FieldId, FieldKind, FieldStore};
pub use schema::{scalars, Layout, LayoutBuilder};
