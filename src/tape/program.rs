//! # Program Recording and Execution
//!
//! A [`Program`] is an append-only list of instructions plus a label table.
//! Recording and execution are separate phases: components record the code
//! for an operation, then [`Program::run`] walks it with a single program
//! counter against a [`FieldStore`].
//!
//! ## Origin and Checkpoints
//!
//! ```text
//!  code: [ setup ........ | operation ......... ]
//!                         ^ origin
//! ```
//!
//! `run` starts at the origin. `clear` truncates the code back to the origin
//! so the next operation can be recorded in its place. One-time setup code is
//! recorded first, run once, and then made permanent by moving the origin
//! past it with [`Program::continue_from`]. Field values survive all of this:
//! the store is never reset by the program.
//!
//! ## Termination
//!
//! A run ends when the counter passes the last instruction, when a `Halt`
//! fires (the message becomes the result code and the counter jumps to the
//! end), or when the step budget runs out. The last case is a
//! [`TapeFault::StepBudgetExhausted`] error, never an [`Outcome`].
//!
//! ## Structured Control Flow
//!
//! `if_then_else` and `block` are sugar over labels and jumps:
//!
//! ```text
//! if_then_else(c, T, E):        block(B):
//!     GotoIfZero else, c            start:
//!     T                               B   (may Goto start / Goto end)
//!     Goto end                      end:
//!   else:
//!     E
//!   end:
//! ```

use eyre::{bail, Result};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use super::error::TapeFault;
use super::instruction::{CompareOp, Index, Instruction, Label, Operand};
use crate::config::DEFAULT_MAX_STEPS;
use crate::layout::{FieldId, FieldStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_steps: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed { steps: u64 },
    Halted { message: String, steps: u64 },
}

impl Outcome {
    pub fn steps(&self) -> u64 {
        match self {
            Outcome::Completed { steps } | Outcome::Halted { steps, .. } => *steps,
        }
    }

    pub fn halt_message(&self) -> Option<&str> {
        match self {
            Outcome::Completed { .. } => None,
            Outcome::Halted { message, .. } => Some(message),
        }
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, Outcome::Halted { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checkpoint {
    code: usize,
    labels: usize,
}

/// Start and end labels of a [`Program::block`].
#[derive(Debug, Clone, Copy)]
pub struct Block {
    pub start: Label,
    pub end: Label,
}

#[derive(Debug, Default)]
pub struct Program {
    code: Vec<Instruction>,
    labels: Vec<Option<usize>>,
    origin: Checkpoint,
    limits: Limits,
    suppress_halt_messages: bool,
    rc: Option<String>,
    /// First label placed that this program never handed out.
    misplaced: Option<u32>,
}

enum Flow {
    Next,
    Jump(Label),
    Halt(String),
}

impl Program {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    pub fn set_suppress_halt_messages(&mut self, suppress: bool) {
        self.suppress_halt_messages = suppress;
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.code
    }

    /// Result code of the last run: the halt message, if one fired.
    pub fn rc(&self) -> Option<&str> {
        self.rc.as_deref()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            code: self.code.len(),
            labels: self.labels.len(),
        }
    }

    /// Discards everything recorded after `checkpoint` and makes it the new
    /// origin.
    pub fn continue_from(&mut self, checkpoint: Checkpoint) {
        self.code.truncate(checkpoint.code);
        self.labels.truncate(checkpoint.labels);
        self.origin = checkpoint;
        self.misplaced = None;
    }

    /// Truncates recorded code back to the origin.
    pub fn clear(&mut self) {
        self.code.truncate(self.origin.code);
        self.labels.truncate(self.origin.labels);
        self.rc = None;
        self.misplaced = None;
    }

    fn push(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }

    // ========================================================================
    // Field instructions
    // ========================================================================

    pub fn read(&mut self, target: FieldId, index: impl Into<Index>) {
        self.push(Instruction::Read {
            target,
            index: index.into(),
        });
    }

    pub fn write(&mut self, target: FieldId, source: impl Into<Operand>) {
        self.push(Instruction::Write {
            target,
            source: source.into(),
            index: None,
        });
    }

    pub fn write_at(&mut self, target: FieldId, source: impl Into<Operand>, index: impl Into<Index>) {
        self.push(Instruction::Write {
            target,
            source: source.into(),
            index: Some(index.into()),
        });
    }

    /// Persists the field's current value into storage at `index`.
    pub fn store(&mut self, target: FieldId, index: impl Into<Index>) {
        self.write_at(target, target, index);
    }

    pub fn zero(&mut self, target: FieldId) {
        self.write(target, 0u64);
    }

    pub fn one(&mut self, target: FieldId) {
        self.write(target, 1u64);
    }

    pub fn move_from(&mut self, target: FieldId, sources: &[FieldId]) {
        self.push(Instruction::Move {
            target,
            sources: SmallVec::from_slice(sources),
        });
    }

    pub fn add(&mut self, target: FieldId, a: impl Into<Operand>, b: impl Into<Operand>) {
        self.push(Instruction::Add {
            target,
            a: a.into(),
            b: b.into(),
        });
    }

    pub fn sub(&mut self, target: FieldId, a: impl Into<Operand>, b: impl Into<Operand>) {
        self.push(Instruction::Sub {
            target,
            a: a.into(),
            b: b.into(),
        });
    }

    pub fn shr(&mut self, target: FieldId, a: impl Into<Operand>, bits: u32) {
        self.push(Instruction::Shr {
            target,
            a: a.into(),
            bits,
        });
    }

    pub fn inc(&mut self, target: FieldId) {
        self.push(Instruction::Inc(target));
    }

    pub fn dec(&mut self, target: FieldId) {
        self.push(Instruction::Dec(target));
    }

    pub fn compare(
        &mut self,
        target: FieldId,
        op: CompareOp,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) {
        self.push(Instruction::Compare {
            target,
            op,
            a: a.into(),
            b: b.into(),
        });
    }

    pub fn trace(&mut self, event: &'static str, field: Option<FieldId>) {
        self.push(Instruction::Trace { event, field });
    }

    // ========================================================================
    // Control flow
    // ========================================================================

    pub fn label(&mut self) -> Label {
        let label = Label(self.labels.len() as u32);
        self.labels.push(None);
        label
    }

    /// Binds `label` to the next instruction to be recorded. A label this
    /// program never handed out makes the next run fault.
    pub fn place(&mut self, label: Label) {
        match self.labels.get_mut(label.0 as usize) {
            Some(slot) => *slot = Some(self.code.len()),
            None => {
                self.misplaced.get_or_insert(label.0);
            }
        }
    }

    pub fn goto(&mut self, label: Label) {
        self.push(Instruction::Goto(label));
    }

    pub fn goto_if_zero(&mut self, label: Label, field: FieldId) {
        self.push(Instruction::GotoIfZero { label, field });
    }

    pub fn goto_if_not_zero(&mut self, label: Label, field: FieldId) {
        self.push(Instruction::GotoIfNotZero { label, field });
    }

    pub fn halt(&mut self, message: impl Into<String>) {
        self.push(Instruction::Halt(message.into()));
    }

    /// Halts when `condition` is non-zero.
    pub fn halt_if(&mut self, condition: FieldId, message: impl Into<String>) {
        let skip = self.label();
        self.goto_if_zero(skip, condition);
        self.halt(message);
        self.place(skip);
    }

    /// Halts when `condition` is zero.
    pub fn halt_unless(&mut self, condition: FieldId, message: impl Into<String>) {
        let skip = self.label();
        self.goto_if_not_zero(skip, condition);
        self.halt(message);
        self.place(skip);
    }

    pub fn if_then_else(
        &mut self,
        condition: FieldId,
        then: impl FnOnce(&mut Self),
        otherwise: impl FnOnce(&mut Self),
    ) {
        let otherwise_label = self.label();
        let end = self.label();
        self.goto_if_zero(otherwise_label, condition);
        then(self);
        self.goto(end);
        self.place(otherwise_label);
        otherwise(self);
        self.place(end);
    }

    pub fn if_then(&mut self, condition: FieldId, then: impl FnOnce(&mut Self)) {
        let end = self.label();
        self.goto_if_zero(end, condition);
        then(self);
        self.place(end);
    }

    pub fn block(&mut self, body: impl FnOnce(&mut Self, Block)) {
        let block = Block {
            start: self.label(),
            end: self.label(),
        };
        self.place(block.start);
        body(self, block);
        self.place(block.end);
    }

    // ========================================================================
    // Execution
    // ========================================================================

    fn resolve(&self, label: Label) -> Result<usize> {
        match self.labels.get(label.0 as usize).copied().flatten() {
            Some(offset) => Ok(offset),
            None => bail!(TapeFault::UnresolvedLabel { label: label.0 }),
        }
    }

    /// Checks every jump from the origin onwards targets a placed label.
    fn link(&self) -> Result<()> {
        if let Some(label) = self.misplaced {
            bail!(TapeFault::UnresolvedLabel { label });
        }
        for instruction in &self.code[self.origin.code..] {
            if let Some(label) = instruction.jump_target() {
                self.resolve(label)?;
            }
        }
        Ok(())
    }

    pub fn run(&mut self, store: &mut FieldStore) -> Result<Outcome> {
        self.rc = None;
        self.link()?;

        let max_steps = self.limits.max_steps;
        let mut pc = self.origin.code;
        let mut steps = 0u64;

        while pc < self.code.len() {
            if steps >= max_steps {
                bail!(TapeFault::StepBudgetExhausted { max_steps, pc });
            }
            steps += 1;

            match execute(&self.code[pc], store)? {
                Flow::Next => pc += 1,
                Flow::Jump(label) => pc = self.resolve(label)?,
                Flow::Halt(message) => {
                    if !self.suppress_halt_messages {
                        warn!(target: "stucktree::tape", steps, "{}", message);
                    }
                    self.rc = Some(message.clone());
                    return Ok(Outcome::Halted { message, steps });
                }
            }
        }

        debug!(target: "stucktree::tape", steps, "program completed");
        Ok(Outcome::Completed { steps })
    }
}

fn operand(store: &FieldStore, operand: Operand) -> Result<u64> {
    match operand {
        Operand::Const(value) => Ok(value),
        Operand::Field(id) => {
            let field = store.field(id);
            if !field.kind().is_spacer() {
                bail!(TapeFault::NotAValue {
                    field: field.name().to_string(),
                });
            }
            Ok(field.value())
        }
    }
}

fn offset(store: &FieldStore, target: FieldId, index: &Index) -> Result<usize> {
    let mut values: SmallVec<[u64; 3]> = SmallVec::new();
    for &op in index.operands() {
        values.push(operand(store, op)?);
    }
    store.convolute(target, &values)
}

fn execute(instruction: &Instruction, store: &mut FieldStore) -> Result<Flow> {
    match instruction {
        Instruction::Read { target, index } => {
            let at = offset(store, *target, index)?;
            store.load(*target, at)?;
        }
        Instruction::Write {
            target,
            source,
            index,
        } => {
            let value = operand(store, *source)?;
            let at = match index {
                Some(index) => Some(offset(store, *target, index)?),
                None => None,
            };
            store.set_value(*target, value)?;
            if let Some(at) = at {
                store.persist(*target, at)?;
            }
        }
        Instruction::Move { target, sources } => {
            let mut sum = 0u64;
            for &source in sources {
                sum = sum.wrapping_add(operand(store, Operand::Field(source))?);
            }
            store.set_value(*target, sum)?;
        }
        Instruction::Add { target, a, b } => {
            let value = operand(store, *a)?.wrapping_add(operand(store, *b)?);
            store.set_value(*target, value)?;
        }
        Instruction::Sub { target, a, b } => {
            let value = operand(store, *a)?.wrapping_sub(operand(store, *b)?);
            store.set_value(*target, value)?;
        }
        Instruction::Shr { target, a, bits } => {
            let value = operand(store, *a)?.checked_shr(*bits).unwrap_or(0);
            store.set_value(*target, value)?;
        }
        Instruction::Inc(target) => {
            let value = operand(store, Operand::Field(*target))?.wrapping_add(1);
            store.set_value(*target, value)?;
        }
        Instruction::Dec(target) => {
            let value = operand(store, Operand::Field(*target))?.wrapping_sub(1);
            store.set_value(*target, value)?;
        }
        Instruction::Compare { target, op, a, b } => {
            let result = op.apply(operand(store, *a)?, operand(store, *b)?);
            store.set_value(*target, result as u64)?;
        }
        Instruction::Goto(label) => return Ok(Flow::Jump(*label)),
        Instruction::GotoIfZero { label, field } => {
            if operand(store, Operand::Field(*field))? == 0 {
                return Ok(Flow::Jump(*label));
            }
        }
        Instruction::GotoIfNotZero { label, field } => {
            if operand(store, Operand::Field(*field))? != 0 {
                return Ok(Flow::Jump(*label));
            }
        }
        Instruction::Halt(message) => return Ok(Flow::Halt(message.clone())),
        Instruction::Trace { event, field } => match field {
            Some(id) => {
                let field = store.field(*id);
                trace!(
                    target: "stucktree::tape",
                    field = field.name(),
                    value = field.value(),
                    "{}",
                    event
                );
            }
            None => trace!(target: "stucktree::tape", "{}", event),
        },
    }
    Ok(Flow::Next)
}
