//! # Instruction Tape
//!
//! The tape is the only way fields are mutated. Components record
//! instructions onto a shared [`Program`] and then run it against the
//! [`crate::layout::FieldStore`]; nothing in the stuck or tree layers writes
//! a field directly.
//!
//! ## Error Channels
//!
//! - [`Outcome::Halted`]: recorded logic refused the operation. The message
//!   is the run's result code.
//! - [`TapeFault`]: the recorded program is broken (step budget exhausted,
//!   bad index, unresolved label). Returned as an error.
//!
//! Higher layers turn a halted outcome into a [`Halt`] error with
//! [`Outcome::into_result`].

mod error;
mod instruction;
mod program;

pub use error::{Halt, TapeFault};
pub use instruction::{CompareOp, Index, Instruction, Label, Operand};
pub use program::{Block, Checkpoint, Limits, Outcome, Program};

impl Outcome {
    /// Converts a halted outcome into a [`Halt`] error.
    pub fn into_result(self) -> eyre::Result<u64> {
        match self {
            Outcome::Completed { steps } => Ok(steps),
            Outcome::Halted { message, .. } => Err(Halt { message }.into()),
        }
    }
}
