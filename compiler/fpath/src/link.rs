//! Linking: renderer unit to callable program.
//!
//! Units name members and functions; programs hold the bound accessor and
//! function closures and address temporaries by register slot. Linking
//! never stops at the first problem: every unbound name is reported, and
//! no program exists unless all of them bind.

use std::fmt;
use std::sync::Arc;

use fpath_codegen::{EmitCheck, Stmt, Temp, Unit};
use fpath_ir::{
    Access, Accessor, Const, DefaultValue, FnArg, FunctionDef, FunctionRegistry, MathOp, Number,
    SchemaRegistry, Ty,
};
use tracing::debug;

use crate::{CompileError, Diagnostic, Stage};

/// A bound navigation step.
#[derive(Clone)]
pub(crate) enum Bound {
    Member(Accessor),
    Key(String),
}

pub(crate) enum LinkedArg {
    Const(Const),
    Path(Vec<Bound>),
    Null,
}

/// One executable operation. Register indices are checked by the linker.
pub(crate) enum Op {
    Text(String),
    Load { dst: usize, src: usize, step: Bound },
    Math { dst: usize, src: usize, op: MathOp, operand: Number, ty: Ty },
    Cast { dst: usize, src: usize, to: Ty },
    Call { dst: usize, function: Arc<FunctionDef>, args: Vec<LinkedArg> },
    IfPresent { value: usize, then: Vec<Op>, otherwise: Vec<Op> },
    Emit { value: usize, check: EmitCheck },
    EmitDefault(DefaultValue),
    Capture { body: Vec<Op> },
    FirstNonEmpty { alternatives: Vec<Vec<Op>>, otherwise: Vec<Op> },
}

/// A linked renderer, shared by every [`Renderer`](crate::Renderer) handle
/// for the same key.
pub struct Program {
    pub(crate) name: String,
    pub(crate) input: String,
    pub(crate) accumulator: String,
    pub(crate) registers: usize,
    pub(crate) body: Vec<Op>,
    pub(crate) source: String,
}

impl Program {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input record name.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Accumulator kind.
    pub fn accumulator(&self) -> &str {
        &self.accumulator
    }

    /// Register slots one render needs.
    pub fn registers(&self) -> usize {
        self.registers
    }

    /// Listing of the unit the program was linked from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("name", &self.name)
            .field("input", &self.input)
            .field("accumulator", &self.accumulator)
            .field("registers", &self.registers)
            .finish_non_exhaustive()
    }
}

/// Bind `unit` against the registries.
pub fn link(
    unit: &Unit,
    template: &str,
    schema: &SchemaRegistry,
    functions: &FunctionRegistry,
) -> Result<Program, CompileError> {
    let mut linker = Linker { unit, schema, functions, diagnostics: Vec::new() };
    if schema.shape(&unit.input).is_none() {
        linker.error(format!("unknown record type `{}`", unit.input));
    }
    let body = linker.block(&unit.body);

    if !linker.diagnostics.is_empty() {
        return Err(CompileError::new(template, linker.diagnostics));
    }
    debug!(name = %unit.name, registers = unit.temp_count(), "linked program");
    Ok(Program {
        name: unit.name.clone(),
        input: unit.input.clone(),
        accumulator: unit.accumulator.clone(),
        registers: unit.temp_count().max(1),
        body,
        source: unit.source(),
    })
}

struct Linker<'a> {
    unit: &'a Unit,
    schema: &'a SchemaRegistry,
    functions: &'a FunctionRegistry,
    diagnostics: Vec<Diagnostic>,
}

impl Linker<'_> {
    fn error(&mut self, message: String) {
        self.diagnostics.push(Diagnostic::new(Stage::Link, message, None));
    }

    fn block(&mut self, stmts: &[Stmt]) -> Vec<Op> {
        stmts.iter().filter_map(|stmt| self.stmt(stmt)).collect()
    }

    fn slot(&mut self, temp: Temp) -> usize {
        if temp.index() >= self.unit.temp_count() {
            self.error(format!("temporary {} out of range", temp.0));
        }
        temp.index()
    }

    fn stmt(&mut self, stmt: &Stmt) -> Option<Op> {
        Some(match stmt {
            Stmt::Text(text) => Op::Text(text.clone()),
            Stmt::Load { dst, src, access } => {
                let (dst, src) = (self.slot(*dst), self.slot(*src));
                Op::Load { dst, src, step: self.bind(access)? }
            }
            Stmt::Math { dst, src, op, operand, ty } => Op::Math {
                dst: self.slot(*dst),
                src: self.slot(*src),
                op: *op,
                operand: *operand,
                ty: ty.clone(),
            },
            Stmt::Cast { dst, src, to } => {
                Op::Cast { dst: self.slot(*dst), src: self.slot(*src), to: to.clone() }
            }
            Stmt::Call { dst, function, args } => {
                let dst = self.slot(*dst);
                let args: Vec<LinkedArg> = args.iter().map(|a| self.arg(a)).collect();
                let functions = self.functions;
                let Some(def) = functions.lookup(function, args.len()) else {
                    let arity = args.len();
                    self.error(format!("no function `{function}` taking {arity} argument(s)"));
                    return None;
                };
                Op::Call { dst, function: Arc::clone(def), args }
            }
            Stmt::IfPresent { value, then, otherwise, .. } => Op::IfPresent {
                value: self.slot(*value),
                then: self.block(then),
                otherwise: self.block(otherwise),
            },
            Stmt::Emit { value, check } => {
                Op::Emit { value: self.slot(*value), check: check.clone() }
            }
            Stmt::EmitDefault(d) => Op::EmitDefault(d.clone()),
            Stmt::Capture { body, .. } => Op::Capture { body: self.block(body) },
            Stmt::FirstNonEmpty { alternatives, otherwise, .. } => Op::FirstNonEmpty {
                alternatives: alternatives.iter().map(|alt| self.block(alt)).collect(),
                otherwise: self.block(otherwise),
            },
            Stmt::Missing { .. } => return None,
        })
    }

    fn bind(&mut self, access: &Access) -> Option<Bound> {
        let schema = self.schema;
        let (owner, name, member) = match access {
            Access::Key(key) => return Some(Bound::Key(key.clone())),
            Access::Field { owner, name } => {
                (owner, name, schema.shape(owner).and_then(|s| s.field(name)))
            }
            Access::Method { owner, name } => {
                (owner, name, schema.shape(owner).and_then(|s| s.method(name)))
            }
        };
        match member {
            Some(member) => Some(Bound::Member(Arc::clone(member.accessor()))),
            None => {
                self.error(format!("`{owner}` has no member `{name}`"));
                None
            }
        }
    }

    fn arg(&mut self, arg: &FnArg) -> LinkedArg {
        match arg {
            FnArg::Const(c) => LinkedArg::Const(c.clone()),
            FnArg::Null => LinkedArg::Null,
            FnArg::Path(steps) => {
                let bound: Vec<Option<Bound>> = steps.iter().map(|s| self.bind(s)).collect();
                // Unbound steps are already reported.
                LinkedArg::Path(bound.into_iter().flatten().collect())
            }
        }
    }
}
