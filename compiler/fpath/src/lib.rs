//! fpath: compile field-path templates into cached renderers.
//!
//! ```text
//! template ─► parse ─► resolve ─► compact ─► generate ─► link ─► Renderer
//!                                                │
//!                                    units/<hash>.unit (optional)
//! ```
//!
//! A [`Compiler`] is built once from a schema registry, a function registry
//! and a [`CompilerConfig`]. [`Compiler::compile`] returns a [`Renderer`]
//! that is immutable, `Send + Sync` and cheap to clone; compiling the same
//! template again, from any thread, returns the cached program.
//!
//! Renders never fail and never perform I/O. Everything that can go wrong
//! is reported by [`Compiler::compile`] as an [`Error`], with diagnostics
//! pointing into the template text.
//!
//! # Logging
//!
//! Pipeline stages and cache activity are reported through `tracing`.
//! Call [`init_tracing`] to print them when `RUST_LOG` is set.

mod artifact;
mod cache;
mod compiler;
mod config;
mod error;
mod exec;
mod hash;
mod link;
mod pipeline;
mod render;
mod sweeper;

#[cfg(test)]
mod fixtures;

use std::sync::Once;

pub use artifact::FORMAT_VERSION;
pub use compiler::Compiler;
pub use config::{CompilerConfig, DiskCacheConfig, DEFAULT_CAPACITY};
pub use error::{CacheError, CompileError, ConfigError, Diagnostic, Error, Stage};
pub use hash::ContentHash;
pub use link::Program;
pub use render::{AccumulatorFactory, ParamFn, Params, Renderer};

pub use fpath_accum::{Accumulator, BinaryAccumulator, ObjectAccumulator, TextAccumulator};
pub use fpath_codegen::Unit;
pub use fpath_ir::{
    describe_enum, describe_record, Bytes, FunctionProvider, FunctionRegistry, Record, Resolved,
    SchemaRegistry, ShapeBuilder, StdFunctions, Ty, Value,
};
pub use fpath_lower::ResolutionPolicy;
pub use fpath_wire::{decode_records, WireValue};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset or a global subscriber already
/// exists. Safe to call any number of times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
