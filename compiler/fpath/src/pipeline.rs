//! Template text to renderer unit.
//!
//! ```text
//! parse -> resolve -> compact (optional) -> generate
//! ```

use fpath_codegen::{generate, Unit};
use fpath_ir::{FunctionRegistry, SchemaRegistry};
use fpath_lower::{compact, Resolver};
use fpath_parse::parse;
use tracing::debug;

use crate::{CompileError, CompilerConfig, Diagnostic};

/// Run the front end and code generator for one template.
pub fn compile_unit(
    template: &str,
    input: &str,
    accumulator: &str,
    name: &str,
    schema: &SchemaRegistry,
    functions: &FunctionRegistry,
    config: &CompilerConfig,
) -> Result<Unit, CompileError> {
    let fail = |diagnostic: Diagnostic| CompileError::single(template, diagnostic);
    let parsed = parse(template).map_err(|e| fail(Diagnostic::from(&e)))?;
    debug!(segments = parsed.segments.len(), "parsed template");

    let mut ast = Resolver::new(schema, functions, config.policy)
        .resolve(&parsed, input, accumulator)
        .map_err(|e| fail(Diagnostic::from(&e)))?;
    let missing = ast.count("NotFound");
    if missing > 0 {
        debug!(missing, "unresolved references rendered as nothing");
    }

    if config.optimize {
        let merged = compact(&mut ast);
        debug!(merged, nodes = ast.len(), "compacted AST");
    }

    generate(&ast, name, config.max_depth).map_err(|e| fail(Diagnostic::from(&e)))
}

#[cfg(test)]
mod tests;
