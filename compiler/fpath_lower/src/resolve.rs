//! Schema resolution.
//!
//! Lowers parsed expressions onto the input type's registered shape, one
//! chain at a time. Each chain becomes a vertical path of nodes:
//!
//! ```text
//! ${user.age + 1 ?? 0}   (user: Option<User>, age: i32)
//!
//! Field user : User?
//!   OptionalGuard : User        else: Default 0
//!     Field age : int
//!       Math + 1 : int
//!         Print ?? 0 : int
//! ```
//!
//! A guard is inserted before every step that navigates out of, computes
//! with, or casts a value flagged OPTIONAL or NULLABLE. Terminal values keep
//! their flags; the Print node does the final presence check.

use std::fmt;
use std::str::FromStr;

use fpath_ir::{
    ensure_sufficient_stack, Access, Ast, Const, DefaultValue, FnArg, FunctionRegistry, MathOp, MemberKind, Node, NodeId,
    NodeKind, NodeList, Number, Presence, Resolved, SchemaRegistry, Span, Ty,
};
use fpath_parse::{
    Arg, Cast, Chain, Expr, Head, JoinItem, Literal, LiteralKind, Math, Segment, Step, Template,
};
use tracing::debug;

use crate::{LowerError, ResolveError, TypeError};

/// What happens to references that do not resolve.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResolutionPolicy {
    /// Abort compilation.
    Strict,
    /// Replace the reference with a NotFound node that renders nothing.
    Lenient,
}

impl ResolutionPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            ResolutionPolicy::Strict => "strict",
            ResolutionPolicy::Lenient => "lenient",
        }
    }
}

impl fmt::Display for ResolutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ResolutionPolicy::Strict),
            "lenient" => Ok(ResolutionPolicy::Lenient),
            other => {
                Err(format!("unknown resolution policy `{other}` (expected strict or lenient)"))
            }
        }
    }
}

/// Resolves templates against a schema and function registry.
pub struct Resolver<'a> {
    schema: &'a SchemaRegistry,
    functions: &'a FunctionRegistry,
    policy: ResolutionPolicy,
}

impl<'a> Resolver<'a> {
    pub fn new(
        schema: &'a SchemaRegistry,
        functions: &'a FunctionRegistry,
        policy: ResolutionPolicy,
    ) -> Self {
        Resolver { schema, functions, policy }
    }

    /// Build the typed AST for `template` rendered from `input` into an
    /// accumulator of kind `accumulator`.
    pub fn resolve(
        &self,
        template: &Template,
        input: &str,
        accumulator: &str,
    ) -> Result<Ast, LowerError> {
        if self.schema.shape(input).is_none() {
            let name = input.to_owned();
            return Err(ResolveError::UnknownType { name, span: Span::DUMMY }.into());
        }

        let mut lowering = Lowering { resolver: self, input, ast: Ast::new(input, accumulator) };
        let base = Resolved::new(Ty::Object(input.to_owned()));
        for segment in &template.segments {
            let id = match segment {
                Segment::Text { text, span } => lowering.literal(text, *span),
                Segment::Expr(expr) => lowering.expr(expr, &base)?,
            };
            let root = lowering.ast.root();
            lowering.ast[root].children.push(id);
        }

        debug!(
            input,
            accumulator,
            nodes = lowering.ast.len(),
            policy = %self.policy,
            "resolved template"
        );
        Ok(lowering.ast)
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Lookup {
    /// `.name`: field first, then zero-argument method, or map key.
    Member,
    /// `.name()`: methods only.
    Method,
    /// `[key]`: map key, or member by name on records.
    Key,
}

/// A chain under construction.
struct Path {
    first: Option<NodeId>,
    last: Option<NodeId>,
    /// Guards whose else-branch renders the declared default.
    guards: Vec<NodeId>,
    /// Type of the value produced by `last`.
    cur: Resolved,
    /// A terminal (join or NotFound) was linked.
    done: bool,
    not_found: bool,
    span: Span,
}

impl Path {
    fn new(base: &Resolved, span: Span) -> Self {
        Path {
            first: None,
            last: None,
            guards: Vec::new(),
            cur: base.clone(),
            done: false,
            not_found: false,
            span,
        }
    }
}

struct Lowering<'r, 'a> {
    resolver: &'r Resolver<'a>,
    input: &'r str,
    ast: Ast,
}

impl Lowering<'_, '_> {
    fn literal(&mut self, text: &str, span: Span) -> NodeId {
        self.ast.alloc(Node::new(NodeKind::Literal(text.to_owned()), Resolved::new(Ty::Str), span))
    }

    /// Append a node to the path; its type becomes the current type.
    fn link(&mut self, path: &mut Path, kind: NodeKind, ty: Resolved, span: Span) -> NodeId {
        path.cur = ty.clone();
        let id = self.ast.alloc(Node::new(kind, ty, span));
        match path.last {
            Some(last) => self.ast[last].children.push(id),
            None => path.first = Some(id),
        }
        path.last = Some(id);
        id
    }

    /// Guard the current value if it may be absent.
    fn guard(&mut self, path: &mut Path, span: Span) {
        if path.cur.is_optional() {
            let ty =
                Resolved { ty: path.cur.ty.clone(), flags: path.cur.flags - Presence::OPTIONAL };
            let guard = NodeKind::OptionalGuard { otherwise: NodeList::new() };
            let id = self.link(path, guard, ty, span);
            path.guards.push(id);
        }
        if path.cur.is_nullable() {
            let ty = path.cur.present();
            let guard = NodeKind::NullableGuard { otherwise: NodeList::new() };
            let id = self.link(path, guard, ty, span);
            path.guards.push(id);
        }
    }

    fn unresolved(&mut self, path: &mut Path, err: ResolveError) -> Result<(), LowerError> {
        match self.resolver.policy {
            ResolutionPolicy::Strict => Err(err.into()),
            ResolutionPolicy::Lenient => {
                debug!(%err, "unresolved reference renders empty");
                let kind = NodeKind::NotFound { name: err.name().to_owned() };
                self.link(path, kind, Resolved::unknown(), err.span());
                path.done = true;
                path.not_found = true;
                Ok(())
            }
        }
    }

    fn expr(&mut self, expr: &Expr, base: &Resolved) -> Result<NodeId, LowerError> {
        ensure_sufficient_stack(|| self.expr_inner(expr, base))
    }

    fn expr_inner(&mut self, expr: &Expr, base: &Resolved) -> Result<NodeId, LowerError> {
        if let [chain] = expr.alternatives.as_slice() {
            let path = self.chain(chain, base)?;
            return self.finish(path, expr.default.as_ref(), false).map(|(id, _)| id);
        }

        let fallback = self.ast.alloc(Node::new(
            NodeKind::OrFallback { otherwise: NodeList::new() },
            Resolved::new(Ty::Str),
            expr.span,
        ));
        let mut terminals = Vec::with_capacity(expr.alternatives.len());
        for chain in &expr.alternatives {
            let concat = self.ast.alloc(Node::new(
                NodeKind::Concatenation,
                Resolved::new(Ty::Str),
                chain.span,
            ));
            let path = self.chain(chain, base)?;
            let (first, terminal) = self.finish(path, None, true)?;
            self.ast[concat].children.push(first);
            self.ast[fallback].children.push(concat);
            terminals.push(terminal);
        }

        if let Some(lit) = &expr.default {
            let mut typed = None;
            for terminal in terminals.iter().flatten() {
                let value = self.default_for(lit, &terminal.ty)?;
                typed.get_or_insert(value);
            }
            let value = match typed {
                Some(value) => value,
                None => untyped_default(lit),
            };
            let node = Node::new(NodeKind::Default(value), Resolved::new(Ty::Str), lit.span);
            let id = self.ast.alloc(node);
            if let Some(otherwise) = self.ast[fallback].kind.otherwise_mut() {
                otherwise.push(id);
            }
        }
        Ok(fallback)
    }

    /// Close a chain with a Print (unless it ended in a join or NotFound)
    /// and attach the default to its guards. A NotFound chain renders the
    /// default as written.
    ///
    /// Returns the chain's first node and its terminal type, `None` for a
    /// NotFound chain.
    fn finish(
        &mut self,
        mut path: Path,
        default: Option<&Literal>,
        in_alternative: bool,
    ) -> Result<(NodeId, Option<Resolved>), LowerError> {
        if path.not_found {
            if let (Some(lit), false) = (default, in_alternative) {
                let value = untyped_default(lit);
                let ty = Resolved::new(Ty::Str);
                self.link(&mut path, NodeKind::Default(value.clone()), ty.clone(), lit.span);
                self.default_guards(&path, &value, &ty);
            }
            let first = self.first(&path);
            return Ok((first, None));
        }

        let terminal = path.cur.clone();
        let typed = match default {
            Some(lit) => Some(self.default_for(lit, &terminal.ty)?),
            None => None,
        };

        if !path.done {
            if !terminal.ty.is_printable() {
                return Err(TypeError::NotPrintable { ty: terminal.ty, span: path.span }.into());
            }
            let print_default = if in_alternative { None } else { typed.clone() };
            let span = path.span;
            let print = NodeKind::Print { default: print_default };
            self.link(&mut path, print, terminal.clone(), span);
        }

        if let (Some(value), false) = (&typed, in_alternative) {
            self.default_guards(&path, value, &Resolved::new(terminal.ty.clone()));
        }

        let first = self.first(&path);
        Ok((first, Some(terminal)))
    }

    /// Render `value` in the else-branch of every guard on the path.
    fn default_guards(&mut self, path: &Path, value: &DefaultValue, ty: &Resolved) {
        for &guard in &path.guards {
            let node = Node::new(NodeKind::Default(value.clone()), ty.clone(), path.span);
            let id = self.ast.alloc(node);
            if let Some(otherwise) = self.ast[guard].kind.otherwise_mut() {
                otherwise.push(id);
            }
        }
    }

    fn first(&mut self, path: &Path) -> NodeId {
        match path.first {
            Some(id) => id,
            None => {
                debug_assert!(false, "chain produced no nodes");
                self.ast.alloc(Node::new(
                    NodeKind::NotFound { name: String::new() },
                    Resolved::unknown(),
                    path.span,
                ))
            }
        }
    }

    fn chain(&mut self, chain: &Chain, base: &Resolved) -> Result<Path, LowerError> {
        let mut path = Path::new(base, chain.span);

        match &chain.head {
            Head::Name(id) => self.navigate(&mut path, &id.name, id.span, Lookup::Member)?,
            Head::Key(key) => self.navigate(&mut path, &key.key, key.span, Lookup::Key)?,
            Head::Call { name, args } => {
                let functions = self.resolver.functions;
                if let Some(def) = functions.lookup(&name.name, args.len()) {
                    // An untyped result may be any of the arguments.
                    let passthrough = def.returns.ty == Ty::Unknown;
                    let mut lowered = Vec::with_capacity(args.len());
                    for arg in args {
                        let (value, ty) = self.arg(arg)?;
                        if passthrough && !ty.is_printable() {
                            let span = match arg {
                                Arg::Literal(lit) => lit.span,
                                Arg::Path(chain) => chain.span,
                            };
                            return Err(TypeError::NotPrintable { ty, span }.into());
                        }
                        lowered.push(value);
                    }
                    let kind = NodeKind::Function { name: name.name.clone(), args: lowered };
                    self.link(&mut path, kind, def.returns.clone(), name.span);
                } else if args.is_empty() && self.has_method(&path.cur, &name.name) {
                    self.navigate(&mut path, &name.name, name.span, Lookup::Method)?;
                } else {
                    let err = ResolveError::UnknownFunction {
                        name: name.name.clone(),
                        arity: args.len(),
                        available: functions.arities(&name.name),
                        span: name.span,
                    };
                    self.unresolved(&mut path, err)?;
                }
            }
        }

        for step in &chain.steps {
            if path.done {
                break;
            }
            match step {
                Step::Member(id) => self.navigate(&mut path, &id.name, id.span, Lookup::Member)?,
                Step::Call(id) => self.navigate(&mut path, &id.name, id.span, Lookup::Method)?,
                Step::Key(key) => self.navigate(&mut path, &key.key, key.span, Lookup::Key)?,
                Step::Join { items, span } => self.join(&mut path, items, *span)?,
            }
        }

        if let (Some(math), false) = (&chain.math, path.done) {
            self.math(&mut path, math)?;
        }
        if let (Some(cast), false) = (&chain.cast, path.done) {
            self.cast(&mut path, cast)?;
        }
        Ok(path)
    }

    fn has_method(&self, ty: &Resolved, name: &str) -> bool {
        match &ty.ty {
            Ty::Object(owner) => self
                .resolver
                .schema
                .shape(owner)
                .is_some_and(|shape| shape.method(name).is_some()),
            _ => false,
        }
    }

    fn navigate(
        &mut self,
        path: &mut Path,
        name: &str,
        span: Span,
        lookup: Lookup,
    ) -> Result<(), LowerError> {
        self.guard(path, span);

        let schema = self.resolver.schema;
        match path.cur.ty.clone() {
            Ty::Object(owner) => {
                let Some(shape) = schema.shape(&owner) else {
                    return self.unresolved(path, ResolveError::UnknownType { name: owner, span });
                };
                let member = match lookup {
                    Lookup::Member | Lookup::Key => {
                        shape.field(name).or_else(|| shape.method(name))
                    }
                    Lookup::Method => shape.method(name),
                };
                let Some(member) = member else {
                    let err = if lookup == Lookup::Method {
                        ResolveError::UnknownMethod { owner, name: name.to_owned(), span }
                    } else {
                        ResolveError::UnknownMember { owner, name: name.to_owned(), span }
                    };
                    return self.unresolved(path, err);
                };
                let kind = match member.kind {
                    MemberKind::Field => NodeKind::Field { owner, name: name.to_owned() },
                    MemberKind::Method => NodeKind::Method { owner, name: name.to_owned() },
                };
                self.link(path, kind, member.resolved.clone(), span);
                Ok(())
            }
            Ty::Map(value) if lookup != Lookup::Method => {
                let ty = Resolved::new(*value).nullable();
                self.link(path, NodeKind::MapAccess { key: name.to_owned() }, ty, span);
                Ok(())
            }
            ty => {
                let err = ResolveError::NotNavigable { ty, name: name.to_owned(), span };
                self.unresolved(path, err)
            }
        }
    }

    fn join(&mut self, path: &mut Path, items: &[JoinItem], span: Span) -> Result<(), LowerError> {
        self.guard(path, span);
        let base = path.cur.clone();
        let concat = self.link(path, NodeKind::Concatenation, Resolved::new(Ty::Str), span);
        for item in items {
            let id = match item {
                JoinItem::Text { text, span } => self.literal(text, *span),
                JoinItem::Expr(expr) => self.expr(expr, &base)?,
            };
            self.ast[concat].children.push(id);
        }
        path.done = true;
        Ok(())
    }

    fn math(&mut self, path: &mut Path, math: &Math) -> Result<(), LowerError> {
        self.guard(path, math.span);
        let from = path.cur.ty.clone();
        if !from.is_numeric() {
            return Err(TypeError::NotNumeric { ty: from, span: math.span }.into());
        }

        let promoted = match (&from, math.operand) {
            (_, Number::Float(_)) => Ty::Double,
            (Ty::Byte | Ty::Short | Ty::Int, Number::Int(_)) => Ty::Int,
            (other, Number::Int(_)) => other.clone(),
        };
        if let Number::Int(v) = math.operand {
            if promoted == Ty::Int && i32::try_from(v).is_err() {
                let span = math.span;
                return Err(TypeError::OperandOutOfRange { operand: v, ty: promoted, span }.into());
            }
            if promoted.is_integral() && v == 0 && matches!(math.op, MathOp::Div | MathOp::Rem) {
                return Err(TypeError::DivisionByZero { span: math.span }.into());
            }
        }

        let kind = NodeKind::Math { op: math.op, operand: math.operand };
        self.link(path, kind, Resolved::new(promoted), math.span);
        Ok(())
    }

    fn cast(&mut self, path: &mut Path, cast: &Cast) -> Result<(), LowerError> {
        self.guard(path, cast.span);
        let from = path.cur.ty.clone();
        let to = cast.to.clone();
        let allowed = from == to
            || (from.is_numeric() && to.is_numeric())
            || (to == Ty::Str && from.is_printable())
            || (from == Ty::DateTime && to == Ty::Long);
        if !allowed {
            return Err(TypeError::InvalidCast { from, to, span: cast.span }.into());
        }
        self.link(path, NodeKind::Cast { to: to.clone() }, Resolved::new(to), cast.span);
        Ok(())
    }

    /// Lower a call argument. Also returns the argument's type, `Unknown`
    /// for an unresolved lenient path.
    fn arg(&mut self, arg: &Arg) -> Result<(FnArg, Ty), LowerError> {
        match arg {
            Arg::Literal(lit) => match &lit.kind {
                LiteralKind::Param(_) => Err(TypeError::InvalidArgument { span: lit.span }.into()),
                kind => {
                    let value = literal_const(kind);
                    let ty = value.ty();
                    Ok((FnArg::Const(value), ty))
                }
            },
            Arg::Path(chain) => self.arg_path(chain),
        }
    }

    fn arg_path(&mut self, chain: &Chain) -> Result<(FnArg, Ty), LowerError> {
        let invalid = || -> LowerError { TypeError::InvalidArgument { span: chain.span }.into() };
        if chain.math.is_some() || chain.cast.is_some() {
            return Err(invalid());
        }

        let mut steps: Vec<(&str, Span, Lookup)> = Vec::new();
        match &chain.head {
            Head::Name(id) => steps.push((&id.name, id.span, Lookup::Member)),
            Head::Key(key) => steps.push((&key.key, key.span, Lookup::Key)),
            Head::Call { .. } => return Err(invalid()),
        }
        for step in &chain.steps {
            match step {
                Step::Member(id) => steps.push((&id.name, id.span, Lookup::Member)),
                Step::Call(id) => steps.push((&id.name, id.span, Lookup::Method)),
                Step::Key(key) => steps.push((&key.key, key.span, Lookup::Key)),
                Step::Join { .. } => return Err(invalid()),
            }
        }

        let schema = self.resolver.schema;
        let mut ty = Ty::Object(self.input.to_owned());
        let mut accesses = Vec::with_capacity(steps.len());
        for (name, span, lookup) in steps {
            let resolved = match &ty {
                Ty::Object(owner) => match schema.shape(owner) {
                    Some(shape) => {
                        let member = match lookup {
                            Lookup::Method => shape.method(name),
                            _ => shape.field(name).or_else(|| shape.method(name)),
                        };
                        member
                            .map(|m| {
                                let (owner, name) = (owner.clone(), name.to_owned());
                                let access = match m.kind {
                                    MemberKind::Field => Access::Field { owner, name },
                                    MemberKind::Method => Access::Method { owner, name },
                                };
                                (access, m.resolved.ty.clone())
                            })
                            .ok_or_else(|| ResolveError::UnknownMember {
                                owner: owner.clone(),
                                name: name.to_owned(),
                                span,
                            })
                    }
                    None => Err(ResolveError::UnknownType { name: owner.clone(), span }),
                },
                Ty::Map(value) if lookup != Lookup::Method => {
                    Ok((Access::Key(name.to_owned()), (**value).clone()))
                }
                other => Err(ResolveError::NotNavigable {
                    ty: other.clone(),
                    name: name.to_owned(),
                    span,
                }),
            };

            match resolved {
                Ok((access, next)) => {
                    accesses.push(access);
                    ty = next;
                }
                Err(err) => {
                    return match self.resolver.policy {
                        ResolutionPolicy::Strict => Err(err.into()),
                        ResolutionPolicy::Lenient => {
                            debug!(%err, "unresolved function argument is null");
                            Ok((FnArg::Null, Ty::Unknown))
                        }
                    };
                }
            }
        }
        Ok((FnArg::Path(accesses), ty))
    }

    /// Convert a default literal to the terminal type.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn default_for(&self, lit: &Literal, target: &Ty) -> Result<DefaultValue, LowerError> {
        let incompatible = || -> LowerError {
            TypeError::IncompatibleDefault {
                default: describe_literal(&lit.kind),
                ty: target.clone(),
                span: lit.span,
            }
            .into()
        };

        let value = match (&lit.kind, target) {
            (LiteralKind::Param(name), _) => return Ok(DefaultValue::Param(name.clone())),
            (kind, Ty::Unknown) => literal_const(kind),

            (LiteralKind::Number(Number::Int(v)), Ty::Byte) => {
                Const::Byte(i8::try_from(*v).map_err(|_| incompatible())?)
            }
            (LiteralKind::Number(Number::Int(v)), Ty::Short) => {
                Const::Short(i16::try_from(*v).map_err(|_| incompatible())?)
            }
            (LiteralKind::Number(Number::Int(v)), Ty::Int) => {
                Const::Int(i32::try_from(*v).map_err(|_| incompatible())?)
            }
            (LiteralKind::Number(Number::Int(v)), Ty::Long) => Const::Long(*v),
            (LiteralKind::Number(Number::Int(v)), Ty::Float) => Const::Float(*v as f32),
            (LiteralKind::Number(Number::Int(v)), Ty::Double) => Const::Double(*v as f64),
            (LiteralKind::Number(Number::Float(v)), Ty::Float) => Const::Float(*v as f32),
            (LiteralKind::Number(Number::Float(v)), Ty::Double) => Const::Double(*v),
            (LiteralKind::Number(n), Ty::Str) => Const::Str(n.to_string()),

            (LiteralKind::Str(s), Ty::Str) => Const::Str(s.clone()),
            (LiteralKind::Str(s), Ty::Enum(_)) => Const::Enum(s.clone()),

            (LiteralKind::Bool(b), Ty::Bool) => Const::Bool(*b),
            (LiteralKind::Bool(b), Ty::Str) => Const::Str(b.to_string()),

            _ => return Err(incompatible()),
        };
        Ok(DefaultValue::Const(value))
    }
}

/// Literal in its natural type, for contexts without a target type.
fn literal_const(kind: &LiteralKind) -> Const {
    match kind {
        LiteralKind::Str(s) | LiteralKind::Param(s) => Const::Str(s.clone()),
        LiteralKind::Number(Number::Int(v)) => Const::Long(*v),
        LiteralKind::Number(Number::Float(v)) => Const::Double(*v),
        LiteralKind::Bool(b) => Const::Bool(*b),
    }
}

fn untyped_default(lit: &Literal) -> DefaultValue {
    match &lit.kind {
        LiteralKind::Param(name) => DefaultValue::Param(name.clone()),
        kind => DefaultValue::Const(literal_const(kind)),
    }
}

fn describe_literal(kind: &LiteralKind) -> String {
    match kind {
        LiteralKind::Str(s) => format!("{s:?}"),
        LiteralKind::Number(n) => n.to_string(),
        LiteralKind::Bool(b) => b.to_string(),
        LiteralKind::Param(name) => format!("${name}"),
    }
}

#[cfg(test)]
mod tests;
