//! # Instructions
//!
//! The instruction set of the tape. Every instruction targets at most one
//! field, which keeps each step a single-writer operation.
//!
//! ```text
//! Read     target <- storage[index]
//! Write    target <- source            (then storage[index] <- target)
//! Move     target <- sum(sources)      (0 sources: zero, 1: copy)
//! Add/Sub  target <- a +/- b           (wrapping within width)
//! Shr      target <- a >> bits
//! Inc/Dec  target <- target +/- 1      (wrapping within width)
//! Compare  target <- (a op b) as 0/1
//! Goto / GotoIfZero / GotoIfNotZero
//! Halt     stop, record message
//! Trace    emit an event, no mutation
//! ```

use smallvec::SmallVec;

use crate::layout::FieldId;

/// Jump target. Resolved to a code offset when placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub(crate) u32);

impl Label {
    pub fn id(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Field(FieldId),
    Const(u64),
}

impl From<FieldId> for Operand {
    fn from(field: FieldId) -> Self {
        Operand::Field(field)
    }
}

impl From<u64> for Operand {
    fn from(value: u64) -> Self {
        Operand::Const(value)
    }
}

impl From<usize> for Operand {
    fn from(value: usize) -> Self {
        Operand::Const(value as u64)
    }
}

impl From<bool> for Operand {
    fn from(value: bool) -> Self {
        Operand::Const(value as u64)
    }
}

/// Index values for a storage access, outermost dimension first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index(pub(crate) SmallVec<[Operand; 3]>);

impl Index {
    pub fn operands(&self) -> &[Operand] {
        &self.0
    }
}

impl From<Operand> for Index {
    fn from(operand: Operand) -> Self {
        Index(smallvec::smallvec![operand])
    }
}

impl From<FieldId> for Index {
    fn from(field: FieldId) -> Self {
        Operand::from(field).into()
    }
}

impl From<usize> for Index {
    fn from(value: usize) -> Self {
        Operand::from(value).into()
    }
}

impl From<u64> for Index {
    fn from(value: u64) -> Self {
        Operand::from(value).into()
    }
}

impl<A: Into<Operand>, B: Into<Operand>> From<(A, B)> for Index {
    fn from((a, b): (A, B)) -> Self {
        Index(smallvec::smallvec![a.into(), b.into()])
    }
}

impl<A: Into<Operand>, B: Into<Operand>, C: Into<Operand>> From<(A, B, C)> for Index {
    fn from((a, b, c): (A, B, C)) -> Self {
        Index(smallvec::smallvec![a.into(), b.into(), c.into()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn apply(self, a: u64, b: u64) -> bool {
        match self {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Read {
        target: FieldId,
        index: Index,
    },
    Write {
        target: FieldId,
        source: Operand,
        index: Option<Index>,
    },
    Move {
        target: FieldId,
        sources: SmallVec<[FieldId; 4]>,
    },
    Add {
        target: FieldId,
        a: Operand,
        b: Operand,
    },
    Sub {
        target: FieldId,
        a: Operand,
        b: Operand,
    },
    Shr {
        target: FieldId,
        a: Operand,
        bits: u32,
    },
    Inc(FieldId),
    Dec(FieldId),
    Compare {
        target: FieldId,
        op: CompareOp,
        a: Operand,
        b: Operand,
    },
    Goto(Label),
    GotoIfZero {
        label: Label,
        field: FieldId,
    },
    GotoIfNotZero {
        label: Label,
        field: FieldId,
    },
    Halt(String),
    Trace {
        event: &'static str,
        field: Option<FieldId>,
    },
}

impl Instruction {
    pub fn jump_target(&self) -> Option<Label> {
        match self {
            Instruction::Goto(label)
            | Instruction::GotoIfZero { label, .. }
            | Instruction::GotoIfNotZero { label, .. } => Some(*label),
            _ => None,
        }
    }
}
