//! Errors surfaced by a tape run.
//!
//! A [`Halt`] is the expected way for recorded logic to refuse an operation:
//! it fires before any mutating instruction of the failing step, so the
//! structure is left as it was. A [`TapeFault`] means the recorded program
//! itself is wrong (a runaway loop, an index outside a dimension, a jump to a
//! label that was never placed) and is never retried.
//!
//! Both are carried inside `eyre::Report` and can be recovered with
//! `downcast_ref`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halt {
    pub message: String,
}

impl Halt {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Halt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "halted: {}", self.message)
    }
}

impl std::error::Error for Halt {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapeFault {
    StepBudgetExhausted { max_steps: u64, pc: usize },
    IndexOutOfRange { field: String, index: u64, limit: usize },
    IndexArity { field: String, expected: usize, actual: usize },
    NotStorage { field: String },
    UnresolvedLabel { label: u32 },
    NotAValue { field: String },
}

impl std::fmt::Display for TapeFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TapeFault::StepBudgetExhausted { max_steps, pc } => write!(
                f,
                "step budget of {} exhausted at instruction {}",
                max_steps, pc
            ),
            TapeFault::IndexOutOfRange {
                field,
                index,
                limit,
            } => write!(
                f,
                "index {} out of range for field {} (limit {})",
                index, field, limit
            ),
            TapeFault::IndexArity {
                field,
                expected,
                actual,
            } => write!(
                f,
                "field {} takes {} indices but {} were given",
                field, expected, actual
            ),
            TapeFault::NotStorage { field } => {
                write!(f, "field {} has no backing storage", field)
            }
            TapeFault::UnresolvedLabel { label } => {
                write!(f, "jump to label {} which was never placed", label)
            }
            TapeFault::NotAValue { field } => {
                write!(f, "array field {} holds no value", field)
            }
        }
    }
}

impl std::error::Error for TapeFault {}
