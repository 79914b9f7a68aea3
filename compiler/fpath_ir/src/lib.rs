//! fpath IR
//!
//! Core data structures shared by the template compiler:
//! - Spans into template text
//! - Resolved type descriptors ([`Ty`] + [`Presence`] flags)
//! - The schema registry: per-type member tables built from [`Record`]
//! - The function registry
//! - Runtime [`Value`]s borrowed from the input graph
//! - The typed AST arena
//! - Stack growth for the recursive passes
//!
//! # Cache feature
//!
//! With `cache` enabled, the types that appear in generated units derive
//! `serde` so units can be persisted by the artifact cache.

mod constant;
mod describe;
mod function;
mod node;
mod schema;
mod span;
mod stack;
mod ty;
mod value;

pub use constant::{Const, DefaultValue, MathOp, Number};
pub use describe::{Bytes, Describe, IntoValue};
pub use function::{
    FunctionDef, FunctionError, FunctionProvider, FunctionRegistry, NativeFn, StdFunctions,
};
pub use node::{Access, Ast, FnArg, Node, NodeId, NodeKind, NodeList};
pub use schema::{
    Accessor, Member, MemberKind, Record, SchemaError, SchemaRegistry, Shape, ShapeBuilder,
};
pub use span::Span;
pub use stack::ensure_sufficient_stack;
pub use ty::{Presence, Resolved, Ty};
pub use value::{hex, MapAccess, Value};
