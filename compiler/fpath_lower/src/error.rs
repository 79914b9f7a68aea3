//! Resolution and type errors.

use fpath_ir::{Span, Ty};
use thiserror::Error;

/// An unresolved reference. Fatal under the strict policy; replaced by a
/// NotFound node under the lenient one, except for an unknown input type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown record type `{name}`")]
    UnknownType { name: String, span: Span },

    #[error("`{owner}` has no field or method `{name}`")]
    UnknownMember { owner: String, name: String, span: Span },

    #[error("`{owner}` has no method `{name}`")]
    UnknownMethod { owner: String, name: String, span: Span },

    #[error("no function `{name}` taking {arity} argument(s){}", registered_arities(.available))]
    UnknownFunction { name: String, arity: usize, available: Vec<usize>, span: Span },

    #[error("cannot look up `{name}` on a value of type {ty}")]
    NotNavigable { ty: Ty, name: String, span: Span },
}

fn registered_arities(available: &[usize]) -> String {
    if available.is_empty() {
        return String::new();
    }
    let list: Vec<String> = available.iter().map(ToString::to_string).collect();
    format!(" (registered with {} argument(s))", list.join(", "))
}

impl ResolveError {
    pub fn span(&self) -> Span {
        match self {
            ResolveError::UnknownType { span, .. }
            | ResolveError::UnknownMember { span, .. }
            | ResolveError::UnknownMethod { span, .. }
            | ResolveError::UnknownFunction { span, .. }
            | ResolveError::NotNavigable { span, .. } => *span,
        }
    }

    /// The unresolved name, as shown by a NotFound node.
    pub fn name(&self) -> &str {
        match self {
            ResolveError::UnknownType { name, .. }
            | ResolveError::UnknownMember { name, .. }
            | ResolveError::UnknownMethod { name, .. }
            | ResolveError::UnknownFunction { name, .. }
            | ResolveError::NotNavigable { name, .. } => name,
        }
    }
}

/// A static type violation. Always fatal.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("default {default} is not compatible with {ty}")]
    IncompatibleDefault { default: String, ty: Ty, span: Span },

    #[error("a value of type {ty} cannot be printed")]
    NotPrintable { ty: Ty, span: Span },

    #[error("arithmetic needs a numeric value, found {ty}")]
    NotNumeric { ty: Ty, span: Span },

    #[error("integral division by zero")]
    DivisionByZero { span: Span },

    #[error("operand {operand} does not fit {ty}")]
    OperandOutOfRange { operand: i64, ty: Ty, span: Span },

    #[error("cannot cast {from} to {to}")]
    InvalidCast { from: Ty, to: Ty, span: Span },

    #[error("function arguments must be literals or plain paths")]
    InvalidArgument { span: Span },
}

impl TypeError {
    pub fn span(&self) -> Span {
        match self {
            TypeError::IncompatibleDefault { span, .. }
            | TypeError::NotPrintable { span, .. }
            | TypeError::NotNumeric { span, .. }
            | TypeError::DivisionByZero { span }
            | TypeError::OperandOutOfRange { span, .. }
            | TypeError::InvalidCast { span, .. }
            | TypeError::InvalidArgument { span } => *span,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LowerError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl LowerError {
    pub fn span(&self) -> Span {
        match self {
            LowerError::Resolve(e) => e.span(),
            LowerError::Type(e) => e.span(),
        }
    }
}
