//! # Layout Construction
//!
//! A [`Layout`] is a named view over a group of fields in a [`FieldStore`].
//! Layouts are built once through [`LayoutBuilder`], which plays the role of
//! a schema: arrays establish dimensions, vars and bits nested in them get
//! backing storage.
//!
//! ```ignore
//! let layout = Layout::build(&mut store, |s| {
//!     s.var("freeStart", 5);
//!     s.array("nodes", 16, |s| {
//!         s.bit("isLeaf");
//!         s.array("slots", 4, |s| {
//!             s.var("keys", 8);
//!             s.var("data", 8);
//!         });
//!     });
//! })?;
//! let keys = layout.locate("keys")?;
//! ```
//!
//! Names must be unique within a layout. Several layouts can share one store;
//! they are independent name spaces over the same arena.
//!
//! Nothing is committed to the store until the whole description has been
//! validated, so a failed build leaves the store untouched.

use eyre::{bail, eyre, Result};
use hashbrown::HashMap;
use smallvec::SmallVec;

use super::field::{Field, FieldId, FieldKind, FieldStore};
use crate::config::MAX_FIELD_WIDTH;

#[derive(Debug, Clone, Default)]
pub struct Layout {
    names: HashMap<String, FieldId>,
    fields: Vec<FieldId>,
}

impl Layout {
    pub fn build(store: &mut FieldStore, describe: impl FnOnce(&mut LayoutBuilder)) -> Result<Self> {
        let mut builder = LayoutBuilder {
            base: store.next_id().index(),
            pending: Vec::new(),
            names: HashMap::new(),
            parents: SmallVec::new(),
            dimensions: SmallVec::new(),
            error: None,
        };
        describe(&mut builder);

        if let Some(error) = builder.error {
            return Err(error);
        }

        let mut fields = Vec::with_capacity(builder.pending.len());
        for field in builder.pending {
            fields.push(store.push(field));
        }

        Ok(Self {
            names: builder.names,
            fields,
        })
    }

    pub fn locate(&self, name: &str) -> Result<FieldId> {
        self.get(name)
            .ok_or_else(|| eyre!("no field named {} in layout", name))
    }

    pub fn get(&self, name: &str) -> Option<FieldId> {
        self.names.get(name).copied()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub struct LayoutBuilder {
    base: usize,
    pending: Vec<Field>,
    names: HashMap<String, FieldId>,
    parents: SmallVec<[FieldId; 4]>,
    dimensions: SmallVec<[usize; 4]>,
    error: Option<eyre::Report>,
}

impl LayoutBuilder {
    pub fn var(&mut self, name: &str, width: u32) -> &mut Self {
        if !(1..=MAX_FIELD_WIDTH).contains(&width) {
            self.fail(eyre!(
                "var {} has width {}, expected 1..={}",
                name,
                width,
                MAX_FIELD_WIDTH
            ));
            return self;
        }
        self.declare(name, FieldKind::Var { width });
        self
    }

    pub fn bit(&mut self, name: &str) -> &mut Self {
        self.declare(name, FieldKind::Bit);
        self
    }

    /// Declares an array of `reps` elements. Every field declared inside
    /// `element` gains a dimension of `reps`.
    pub fn array(&mut self, name: &str, reps: usize, element: impl FnOnce(&mut Self)) -> &mut Self {
        if reps == 0 {
            self.fail(eyre!("array {} must have at least one repetition", name));
            return self;
        }
        let Some(id) = self.declare(name, FieldKind::Array { reps }) else {
            return self;
        };

        let before = self.pending.len();
        self.parents.push(id);
        self.dimensions.push(reps);
        element(self);
        self.dimensions.pop();
        self.parents.pop();

        if self.error.is_none() && self.pending.len() == before {
            self.fail(eyre!("array {} must have at least one child layout", name));
        }
        self
    }

    fn declare(&mut self, name: &str, kind: FieldKind) -> Option<FieldId> {
        if self.error.is_some() {
            return None;
        }
        if self.names.contains_key(name) {
            self.fail(eyre!("duplicate name: {}", name));
            return None;
        }

        let id = FieldId::new(self.base + self.pending.len());
        let dimensions = if kind.is_spacer() {
            self.dimensions.clone()
        } else {
            SmallVec::new()
        };
        self.pending.push(Field::new(
            name.to_string(),
            kind,
            self.parents.last().copied(),
            dimensions,
        ));
        self.names.insert(name.to_string(), id);
        Some(id)
    }

    fn fail(&mut self, error: eyre::Report) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

/// Builds a layout of scalar vars, one per `(name, width)` pair.
pub fn scalars(store: &mut FieldStore, vars: &[(&str, u32)]) -> Result<Layout> {
    if vars.is_empty() {
        bail!("a scalar layout needs at least one var");
    }
    Layout::build(store, |s| {
        for &(name, width) in vars {
            s.var(name, width);
        }
    })
}
