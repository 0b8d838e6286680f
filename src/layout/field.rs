//! # Fields and the Field Store
//!
//! A field is a named, fixed-width integer cell. The [`FieldStore`] is the
//! arena that owns every field of every layout; fields are addressed by
//! [`FieldId`] rather than by reference so that instructions recorded on a
//! tape can name them without borrowing the store.
//!
//! ## Current Value vs Backing Storage
//!
//! Every field carries a current value: the result of the last instruction
//! that targeted it. A var or bit nested inside one or more arrays (a
//! "spacer") additionally owns backing storage, one cell per element of the
//! enclosing arrays:
//!
//! ```text
//! nodes   array 16
//!   slots array 4
//!     keys var 8          -> 16 * 4 = 64 cells of 8 bits
//! ```
//!
//! Cells are addressed by convoluting index values outermost-first:
//!
//! ```text
//! offset = ((i0 * r1) + i1) * r2 + i2 ...
//! ```
//!
//! ## Width Masking
//!
//! Every assignment to the current value is masked to the field's width.
//! Decrementing zero therefore wraps to all ones within the width, exactly as
//! a hardware register of that width would.

use eyre::{bail, ensure, Result};
use smallvec::SmallVec;

use crate::config::MAX_FIELD_WIDTH;
use crate::tape::TapeFault;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u32);

impl FieldId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Grouping only. Establishes a dimension for the fields nested in it.
    Array { reps: usize },
    Var { width: u32 },
    Bit,
}

impl FieldKind {
    pub fn width(&self) -> Option<u32> {
        match self {
            FieldKind::Array { .. } => None,
            FieldKind::Var { width } => Some(*width),
            FieldKind::Bit => Some(1),
        }
    }

    pub fn is_spacer(&self) -> bool {
        !matches!(self, FieldKind::Array { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Array { .. } => "array",
            FieldKind::Var { .. } => "var",
            FieldKind::Bit => "bit",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    parent: Option<FieldId>,
    dimensions: SmallVec<[usize; 4]>,
    memory: Vec<u64>,
    value: u64,
}

impl Field {
    pub(crate) fn new(
        name: String,
        kind: FieldKind,
        parent: Option<FieldId>,
        dimensions: SmallVec<[usize; 4]>,
    ) -> Self {
        let memory = if kind.is_spacer() && !dimensions.is_empty() {
            vec![0; dimensions.iter().product()]
        } else {
            Vec::new()
        };

        Self {
            name,
            kind,
            parent,
            dimensions,
            memory,
            value: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn parent(&self) -> Option<FieldId> {
        self.parent
    }

    /// Repetitions of the enclosing arrays, outermost first.
    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn dim_product(&self) -> usize {
        self.dimensions.iter().product()
    }

    pub fn has_storage(&self) -> bool {
        !self.memory.is_empty()
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn cells(&self) -> &[u64] {
        &self.memory
    }

    fn mask(&self) -> u64 {
        match self.kind.width() {
            Some(w) if w >= MAX_FIELD_WIDTH => u64::MAX,
            Some(w) => (1u64 << w) - 1,
            None => 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct FieldStore {
    fields: Vec<Field>,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn next_id(&self) -> FieldId {
        FieldId::new(self.fields.len())
    }

    pub(crate) fn push(&mut self, field: Field) -> FieldId {
        let id = self.next_id();
        self.fields.push(field);
        id
    }

    /// Creates a scalar var with no backing storage, outside of any layout.
    pub fn scalar(&mut self, name: &str, width: u32) -> Result<FieldId> {
        ensure!(
            (1..=MAX_FIELD_WIDTH).contains(&width),
            "width {} of field {} must be in 1..={}",
            width,
            name,
            MAX_FIELD_WIDTH
        );
        Ok(self.push(Field::new(
            name.to_string(),
            FieldKind::Var { width },
            None,
            SmallVec::new(),
        )))
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.index()]
    }

    pub fn value(&self, id: FieldId) -> u64 {
        self.fields[id.index()].value
    }

    /// Reads a storage cell without going through a tape. Diagnostic only.
    pub fn peek(&self, id: FieldId, indices: &[usize]) -> Result<u64> {
        let values: SmallVec<[u64; 4]> = indices.iter().map(|&i| i as u64).collect();
        let offset = self.convolute(id, &values)?;
        Ok(self.fields[id.index()].memory[offset])
    }

    pub(crate) fn set_value(&mut self, id: FieldId, value: u64) -> Result<u64> {
        let field = &mut self.fields[id.index()];
        if !field.kind.is_spacer() {
            bail!(TapeFault::NotAValue {
                field: field.name.clone(),
            });
        }
        field.value = value & field.mask();
        Ok(field.value)
    }

    /// Loads the cell at `offset` into the field's current value.
    pub(crate) fn load(&mut self, id: FieldId, offset: usize) -> Result<()> {
        let field = &mut self.fields[id.index()];
        let Some(&cell) = field.memory.get(offset) else {
            bail!(storage_fault(field, offset));
        };
        field.value = cell;
        Ok(())
    }

    /// Persists the field's current value into the cell at `offset`.
    pub(crate) fn persist(&mut self, id: FieldId, offset: usize) -> Result<()> {
        let field = &mut self.fields[id.index()];
        let value = field.value;
        let Some(cell) = field.memory.get_mut(offset) else {
            bail!(storage_fault(field, offset));
        };
        *cell = value;
        Ok(())
    }

    /// Convolutes index values, outermost dimension first, into a flat offset.
    pub fn convolute(&self, id: FieldId, indices: &[u64]) -> Result<usize> {
        let field = &self.fields[id.index()];
        if !field.has_storage() {
            bail!(TapeFault::NotStorage {
                field: field.name.clone(),
            });
        }
        if indices.len() != field.dimensions.len() {
            bail!(TapeFault::IndexArity {
                field: field.name.clone(),
                expected: field.dimensions.len(),
                actual: indices.len(),
            });
        }

        let mut offset = 0usize;
        for (&index, &rep) in indices.iter().zip(field.dimensions.iter()) {
            if index >= rep as u64 {
                bail!(TapeFault::IndexOutOfRange {
                    field: field.name.clone(),
                    index,
                    limit: rep,
                });
            }
            offset = offset * rep + index as usize;
        }
        Ok(offset)
    }
}

fn storage_fault(field: &Field, offset: usize) -> TapeFault {
    if field.has_storage() {
        TapeFault::IndexOutOfRange {
            field: field.name.clone(),
            index: offset as u64,
            limit: field.memory.len(),
        }
    } else {
        TapeFault::NotStorage {
            field: field.name.clone(),
        }
    }
}
