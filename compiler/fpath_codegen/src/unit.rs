//! Renderer units.

use std::fmt::{self, Write};

use fpath_ir::{Access, DefaultValue, FnArg, MathOp, Number, Ty};

/// Register slot of a temporary. Slot 0 always holds the input record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Temp(pub u32);

impl Temp {
    pub const INPUT: Temp = Temp(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Accumulator variable. 0 is the caller's accumulator; every other one is
/// a disposable instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct AccVar(pub u32);

impl AccVar {
    pub const ROOT: AccVar = AccVar(0);
}

impl fmt::Display for AccVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => f.write_str("acc"),
            n => write!(f, "acc_{n}"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum GuardKind {
    Optional,
    Nullable,
}

/// How a value is checked before it is written.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum EmitCheck {
    /// Primitive, never absent.
    Unchecked,
    /// Absent values write nothing.
    SkipAbsent,
    /// Absent values write the default.
    Default(DefaultValue),
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Stmt {
    /// Write literal text.
    Text(String),
    /// `dst = src.member` / `src[key]`.
    Load { dst: Temp, src: Temp, access: Access },
    /// `dst = src <op> operand`, computed in `ty`.
    Math { dst: Temp, src: Temp, op: MathOp, operand: Number, ty: Ty },
    Cast { dst: Temp, src: Temp, to: Ty },
    /// `dst = function(args)`, path arguments navigated from the input.
    Call { dst: Temp, function: String, args: Vec<FnArg> },
    IfPresent { guard: GuardKind, value: Temp, then: Vec<Stmt>, otherwise: Vec<Stmt> },
    Emit { value: Temp, check: EmitCheck },
    EmitDefault(DefaultValue),
    /// Render `body` into the fresh accumulator `acc`, then splice it into
    /// `parent`.
    Capture { acc: AccVar, parent: AccVar, body: Vec<Stmt> },
    /// Render each alternative into `acc` (reset in between) and splice the
    /// first non-empty one into `parent`; render `otherwise` into `parent`
    /// when all are empty.
    FirstNonEmpty {
        acc: AccVar,
        parent: AccVar,
        alternatives: Vec<Vec<Stmt>>,
        otherwise: Vec<Stmt>,
    },
    /// Unresolved reference under the lenient policy. Writes nothing.
    Missing { name: String },
}

/// Generated renderer for one template.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Unit {
    pub name: String,
    /// Input record name.
    pub input: String,
    /// Accumulator kind.
    pub accumulator: String,
    /// Temporary names by slot.
    pub temps: Vec<String>,
    pub body: Vec<Stmt>,
}

impl Unit {
    pub fn temp_count(&self) -> usize {
        self.temps.len()
    }

    /// Visit every statement, nested blocks included, in document order.
    pub fn walk(&self, f: &mut impl FnMut(&Stmt)) {
        walk_block(&self.body, f);
    }

    /// Number of member and key loads.
    pub fn loads(&self) -> usize {
        let mut n = 0;
        self.walk(&mut |stmt| {
            if matches!(stmt, Stmt::Load { .. }) {
                n += 1;
            }
        });
        n
    }

    /// Readable listing of the unit.
    pub fn source(&self) -> String {
        let mut w = SourceWriter { unit: self, out: String::new(), level: 0 };
        w.line(format_args!("// {} -> {}", self.input, self.accumulator));
        w.line(format_args!(
            "fn {}(input: &{}, params: &Params, acc: &mut {}) {{",
            self.name, self.input, self.accumulator
        ));
        w.block(&self.body, AccVar::ROOT);
        w.line(format_args!("}}"));
        w.out
    }
}

fn walk_block(block: &[Stmt], f: &mut impl FnMut(&Stmt)) {
    for stmt in block {
        f(stmt);
        match stmt {
            Stmt::IfPresent { then, otherwise, .. } => {
                walk_block(then, f);
                walk_block(otherwise, f);
            }
            Stmt::Capture { body, .. } => walk_block(body, f),
            Stmt::FirstNonEmpty { alternatives, otherwise, .. } => {
                for alt in alternatives {
                    walk_block(alt, f);
                }
                walk_block(otherwise, f);
            }
            _ => {}
        }
    }
}

struct SourceWriter<'u> {
    unit: &'u Unit,
    out: String,
    level: usize,
}

impl SourceWriter<'_> {
    fn line(&mut self, args: fmt::Arguments<'_>) {
        for _ in 0..self.level {
            self.out.push_str("    ");
        }
        let _ = self.out.write_fmt(args);
        self.out.push('\n');
    }

    fn name(&self, temp: Temp) -> &str {
        self.unit.temps.get(temp.index()).map_or("?", String::as_str)
    }

    fn block(&mut self, block: &[Stmt], acc: AccVar) {
        self.level += 1;
        for stmt in block {
            self.stmt(stmt, acc);
        }
        self.level -= 1;
    }

    fn stmt(&mut self, stmt: &Stmt, acc: AccVar) {
        match stmt {
            Stmt::Text(text) => self.line(format_args!("{acc}.accept_str({text:?});")),
            Stmt::Load { dst, src, access } => {
                let (dst, src) = (self.name(*dst).to_owned(), self.name(*src).to_owned());
                match access {
                    Access::Field { name, .. } => {
                        self.line(format_args!("let {dst} = {src}.{name};"));
                    }
                    Access::Method { name, .. } => {
                        self.line(format_args!("let {dst} = {src}.{name}();"));
                    }
                    Access::Key(key) => self.line(format_args!("let {dst} = {src}.get({key:?});")),
                }
            }
            Stmt::Math { dst, src, op, operand, ty } => {
                let (dst, src) = (self.name(*dst).to_owned(), self.name(*src).to_owned());
                let op = op.symbol();
                self.line(format_args!("let {dst}: {ty} = {src} {op} {operand};"));
            }
            Stmt::Cast { dst, src, to } => {
                let (dst, src) = (self.name(*dst).to_owned(), self.name(*src).to_owned());
                self.line(format_args!("let {dst} = {src} as {to};"));
            }
            Stmt::Call { dst, function, args } => {
                let dst = self.name(*dst).to_owned();
                let args: Vec<String> = args.iter().map(render_arg).collect();
                self.line(format_args!("let {dst} = {function}({});", args.join(", ")));
            }
            Stmt::IfPresent { guard, value, then, otherwise } => {
                let value = self.name(*value).to_owned();
                match guard {
                    GuardKind::Optional => {
                        self.line(format_args!("if let Some({value}) = {value} {{"));
                    }
                    GuardKind::Nullable => self.line(format_args!("if !{value}.is_null() {{")),
                }
                self.block(then, acc);
                if !otherwise.is_empty() {
                    self.line(format_args!("}} else {{"));
                    self.block(otherwise, acc);
                }
                self.line(format_args!("}}"));
            }
            Stmt::Emit { value, check } => {
                let value = self.name(*value).to_owned();
                match check {
                    EmitCheck::Unchecked => self.line(format_args!("{acc}.accept({value});")),
                    EmitCheck::SkipAbsent => {
                        self.line(format_args!(
                            "if !{value}.is_null() {{ {acc}.accept({value}); }}"
                        ));
                    }
                    EmitCheck::Default(d) => {
                        self.line(format_args!("{acc}.accept({value}.or({d}));"));
                    }
                }
            }
            Stmt::EmitDefault(d) => self.line(format_args!("{acc}.accept({d});")),
            Stmt::Capture { acc: inner, parent, body } => {
                self.line(format_args!("let mut {inner} = {parent}.new_instance();"));
                self.block_flat(body, *inner);
                self.line(format_args!("{parent}.accept_acc(&{inner});"));
            }
            Stmt::FirstNonEmpty { acc: inner, parent, alternatives, otherwise } => {
                self.line(format_args!("let mut {inner} = {parent}.new_instance();"));
                self.line(format_args!("'{inner}: {{"));
                self.level += 1;
                for alt in alternatives {
                    self.line(format_args!("{inner}.reset();"));
                    self.block_flat(alt, *inner);
                    self.line(format_args!(
                        "if !{inner}.is_empty() {{ {parent}.accept_acc(&{inner}); break '{inner}; }}"
                    ));
                }
                self.level -= 1;
                self.block(otherwise, *parent);
                self.line(format_args!("}}"));
            }
            Stmt::Missing { name } => self.line(format_args!("// not found: {name}")),
        }
    }

    /// Statements at the current level, writing into `acc`.
    fn block_flat(&mut self, block: &[Stmt], acc: AccVar) {
        for stmt in block {
            self.stmt(stmt, acc);
        }
    }
}

fn render_arg(arg: &FnArg) -> String {
    match arg {
        FnArg::Const(c) => c.to_string(),
        FnArg::Path(steps) => {
            let mut out = String::from("input");
            for step in steps {
                let _ = match step {
                    Access::Field { name, .. } => write!(out, ".{name}"),
                    Access::Method { name, .. } => write!(out, ".{name}()"),
                    Access::Key(key) => write!(out, "[{key:?}]"),
                };
            }
            out
        }
        FnArg::Null => "null".to_owned(),
    }
}
