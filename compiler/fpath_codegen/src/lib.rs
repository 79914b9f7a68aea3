//! Code generation.
//!
//! Turns a typed AST into a [`Unit`]: a structured statement tree with one
//! freshly named temporary per computed value, plus a readable source
//! listing. Units are what the driver caches on disk and links into
//! callable programs.
//!
//! # Cache feature
//!
//! With `cache` enabled, [`Unit`] and its statements derive `serde`.

mod context;
mod error;
mod generate;
mod unit;

pub use context::RenderContext;
pub use error::CodegenError;
pub use generate::{generate, DEFAULT_MAX_DEPTH};
pub use unit::{AccVar, EmitCheck, GuardKind, Stmt, Temp, Unit};
