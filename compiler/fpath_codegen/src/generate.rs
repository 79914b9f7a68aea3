//! AST to unit.
//!
//! Each value-producing node writes into a fresh temporary and generates
//! its children with that temporary as the current value:
//!
//! ```text
//! Field address : Address?        let field_0 = input.address;
//!   OptionalGuard : Address       if let Some(field_0) = field_0 {
//!     Field city : string             let field_1 = field_0.city;
//!       Print ?? "-"                  acc.accept(field_1.or("-"));
//!   else                          } else {
//!     Default "-"                     acc.accept("-");
//!                                 }
//! ```

use fpath_ir::{ensure_sufficient_stack, Access, Ast, NodeId, NodeKind};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{AccVar, CodegenError, EmitCheck, GuardKind, RenderContext, Stmt, Temp, Unit};

/// Nesting limit used when the caller has no preference.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Generate the unit for a resolved (and optionally compacted) AST.
pub fn generate(ast: &Ast, name: &str, max_depth: usize) -> Result<Unit, CodegenError> {
    let root = &ast[ast.root()];
    let (input, accumulator) = match &root.kind {
        NodeKind::Root { input, accumulator } => (input.clone(), accumulator.clone()),
        other => (other.name().to_owned(), String::new()),
    };

    let mut gen = Generator { ast, emitter: Emitter::new(), max_depth };
    let cx = RenderContext::root(root.ty.clone());
    let body = gen.block(&root.children, &cx)?;

    debug!(name, temps = gen.emitter.temps.len(), "generated unit");
    Ok(Unit { name: name.to_owned(), input, accumulator, temps: gen.emitter.temps, body })
}

/// Hands out temporaries and accumulator variables with per-kind counters:
/// `field_0`, `field_1`, `map_0`, `acc_1`, ...
struct Emitter {
    counters: FxHashMap<&'static str, u32>,
    temps: Vec<String>,
    accs: u32,
}

impl Emitter {
    fn new() -> Self {
        Emitter { counters: FxHashMap::default(), temps: vec!["input".to_owned()], accs: 0 }
    }

    fn temp(&mut self, kind: &'static str) -> Temp {
        let n = self.counters.entry(kind).or_insert(0);
        let name = format!("{kind}_{n}");
        *n += 1;
        let slot = Temp(u32::try_from(self.temps.len()).unwrap_or(u32::MAX));
        self.temps.push(name);
        slot
    }

    fn acc(&mut self) -> AccVar {
        self.accs += 1;
        AccVar(self.accs)
    }
}

struct Generator<'a> {
    ast: &'a Ast,
    emitter: Emitter,
    max_depth: usize,
}

impl Generator<'_> {
    fn block(&mut self, ids: &[NodeId], cx: &RenderContext) -> Result<Vec<Stmt>, CodegenError> {
        let mut out = Vec::with_capacity(ids.len());
        for &id in ids {
            self.node(id, cx, &mut out)?;
        }
        Ok(out)
    }

    fn node(
        &mut self,
        id: NodeId,
        cx: &RenderContext,
        out: &mut Vec<Stmt>,
    ) -> Result<(), CodegenError> {
        ensure_sufficient_stack(|| self.node_inner(id, cx, out))
    }

    fn node_inner(
        &mut self,
        id: NodeId,
        cx: &RenderContext,
        out: &mut Vec<Stmt>,
    ) -> Result<(), CodegenError> {
        let ast = self.ast;
        let node = &ast[id];
        if cx.depth() > self.max_depth {
            return Err(CodegenError::TooDeep { max: self.max_depth, span: node.span });
        }

        match &node.kind {
            NodeKind::Root { .. } => out.extend(self.block(&node.children, cx)?),
            NodeKind::Literal(text) => out.push(Stmt::Text(text.clone())),

            NodeKind::Field { owner, name } => {
                let access = Access::Field { owner: owner.clone(), name: name.clone() };
                self.load(id, "field", access, cx, out)?;
            }
            NodeKind::Method { owner, name } => {
                let access = Access::Method { owner: owner.clone(), name: name.clone() };
                self.load(id, "method", access, cx, out)?;
            }
            NodeKind::MapAccess { key } => self.load(id, "map", Access::Key(key.clone()), cx, out)?,

            NodeKind::Math { op, operand } => {
                let dst = self.emitter.temp("math");
                out.push(Stmt::Math {
                    dst,
                    src: cx.value(),
                    op: *op,
                    operand: *operand,
                    ty: node.ty.ty.clone(),
                });
                out.extend(self.block(&node.children, &cx.descend(dst, node.ty.clone()))?);
            }
            NodeKind::Cast { to } => {
                let dst = self.emitter.temp("cast");
                out.push(Stmt::Cast { dst, src: cx.value(), to: to.clone() });
                out.extend(self.block(&node.children, &cx.descend(dst, node.ty.clone()))?);
            }
            NodeKind::Function { name, args } => {
                let dst = self.emitter.temp("call");
                out.push(Stmt::Call { dst, function: name.clone(), args: args.clone() });
                out.extend(self.block(&node.children, &cx.descend(dst, node.ty.clone()))?);
            }

            NodeKind::OptionalGuard { otherwise } | NodeKind::NullableGuard { otherwise } => {
                let guard = if matches!(node.kind, NodeKind::OptionalGuard { .. }) {
                    GuardKind::Optional
                } else {
                    GuardKind::Nullable
                };
                let then = self.block(&node.children, &cx.descend(cx.value(), node.ty.clone()))?;
                let otherwise = self.block(otherwise, &cx.deeper())?;
                out.push(Stmt::IfPresent { guard, value: cx.value(), then, otherwise });
            }

            NodeKind::OrFallback { otherwise } => {
                let acc = self.emitter.acc();
                let inner = cx.deeper().with_acc(acc);
                let mut alternatives = Vec::with_capacity(node.children.len());
                for &alt in &node.children {
                    // Alternatives are Concatenations; the scratch accumulator
                    // already isolates them.
                    let alt_node = &ast[alt];
                    let body = match alt_node.kind {
                        NodeKind::Concatenation => self.block(&alt_node.children, &inner.deeper())?,
                        _ => self.block(&[alt], &inner)?,
                    };
                    alternatives.push(body);
                }
                let otherwise = self.block(otherwise, &cx.deeper())?;
                out.push(Stmt::FirstNonEmpty { acc, parent: cx.acc(), alternatives, otherwise });
            }
            NodeKind::Concatenation => {
                let acc = self.emitter.acc();
                let body = self.block(&node.children, &cx.deeper().with_acc(acc))?;
                out.push(Stmt::Capture { acc, parent: cx.acc(), body });
            }

            NodeKind::Print { default } => {
                let ty = cx.ty();
                let check = if ty.ty.is_primitive() && ty.flags.is_empty() {
                    EmitCheck::Unchecked
                } else if let Some(default) = default {
                    EmitCheck::Default(default.clone())
                } else {
                    EmitCheck::SkipAbsent
                };
                out.push(Stmt::Emit { value: cx.value(), check });
            }
            NodeKind::Default(value) => out.push(Stmt::EmitDefault(value.clone())),
            NodeKind::NotFound { name } => {
                out.push(Stmt::Missing { name: name.clone() });
                out.extend(self.block(&node.children, cx)?);
            }
        }
        Ok(())
    }

    fn load(
        &mut self,
        id: NodeId,
        kind: &'static str,
        access: Access,
        cx: &RenderContext,
        out: &mut Vec<Stmt>,
    ) -> Result<(), CodegenError> {
        let ast = self.ast;
        let node = &ast[id];
        let dst = self.emitter.temp(kind);
        out.push(Stmt::Load { dst, src: cx.value(), access });
        out.extend(self.block(&node.children, &cx.descend(dst, node.ty.clone()))?);
        Ok(())
    }
}
