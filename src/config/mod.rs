//! # Configuration
//!
//! Numeric defaults and hard limits for fields, the tape and the tree. The
//! builder in [`crate::btree`] starts from these values; the interdependent
//! ones are checked at compile time in [`constants`].

pub mod constants;
pub use constants::*;
