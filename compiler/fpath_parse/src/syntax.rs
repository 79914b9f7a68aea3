//! Syntax tree produced by the parser.
//!
//! Names are unresolved here; the resolver maps them onto the input type.

use fpath_ir::{MathOp, Number, Span, Ty};

/// A parsed template: literal text and expressions in document order.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    pub segments: Vec<Segment>,
}

impl Template {
    pub fn expressions(&self) -> impl Iterator<Item = &Expr> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Expr(e) => Some(e),
            Segment::Text { .. } => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    /// Literal text with `$$` escapes already collapsed.
    Text { text: String, span: Span },
    Expr(Expr),
}

/// `chain | chain | ... ?? default`
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub alternatives: Vec<Chain>,
    pub default: Option<Literal>,
    pub span: Span,
}

/// One navigation path with optional arithmetic and cast.
#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    pub head: Head,
    pub steps: Vec<Step>,
    pub math: Option<Math>,
    pub cast: Option<Cast>,
    pub span: Span,
}

impl Chain {
    /// The join step, which is always last when present.
    pub fn join(&self) -> Option<&[JoinItem]> {
        match self.steps.last() {
            Some(Step::Join { items, .. }) => Some(items),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Head {
    /// Bare name: a field, or a zero-argument method.
    Name(Ident),
    /// `name(args)`: a registered function; `name()` may also be a method.
    Call { name: Ident, args: Vec<Arg> },
    /// `[key]` on the input itself.
    Key(Key),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// `.name`
    Member(Ident),
    /// `.name()`
    Call(Ident),
    /// `[key]`
    Key(Key),
    /// `.{item, item}`
    Join { items: Vec<JoinItem>, span: Span },
}

#[derive(Clone, Debug, PartialEq)]
pub enum JoinItem {
    Text { text: String, span: Span },
    /// Expression relative to the join prefix.
    Expr(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Literal(Literal),
    Path(Chain),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Math {
    pub op: MathOp,
    pub operand: Number,
    pub span: Span,
}

/// `as <type>`; the target is a numeric type or `Ty::Str`.
#[derive(Clone, Debug, PartialEq)]
pub struct Cast {
    pub to: Ty,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Key {
    pub key: String,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LiteralKind {
    Str(String),
    Number(Number),
    Bool(bool),
    /// `$name`, resolved against the render's parameter table.
    Param(String),
}
