//! Render context.

use fpath_ir::Resolved;

use crate::{AccVar, Temp};

/// Where generation currently stands. Immutable: each descent builds a new
/// context, so siblings never see each other's bindings.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderContext {
    depth: usize,
    value: Temp,
    acc: AccVar,
    ty: Resolved,
}

impl RenderContext {
    /// Context for the body of a unit: the input record in slot 0, writing
    /// into the caller's accumulator.
    pub fn root(input: Resolved) -> Self {
        RenderContext { depth: 0, value: Temp::INPUT, acc: AccVar::ROOT, ty: input }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Temporary holding the current value.
    pub fn value(&self) -> Temp {
        self.value
    }

    /// Accumulator written by emitted text and values.
    pub fn acc(&self) -> AccVar {
        self.acc
    }

    pub fn ty(&self) -> &Resolved {
        &self.ty
    }

    /// One level down, with `value` of type `ty` as the current value.
    #[must_use]
    pub fn descend(&self, value: Temp, ty: Resolved) -> Self {
        RenderContext { depth: self.depth + 1, value, acc: self.acc, ty }
    }

    /// One level down, same current value.
    #[must_use]
    pub fn deeper(&self) -> Self {
        RenderContext { depth: self.depth + 1, ..self.clone() }
    }

    /// Same position, writing into `acc`.
    #[must_use]
    pub fn with_acc(&self, acc: AccVar) -> Self {
        RenderContext { acc, ..self.clone() }
    }
}
