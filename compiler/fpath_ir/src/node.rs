//! Typed template AST.
//!
//! Nodes live in a flat [`Ast`] arena and refer to each other by [`NodeId`].
//! Children describe what happens to the value a node produces: a Field's
//! children navigate further from the field value, a Print's value is written
//! to the accumulator. Every path through the tree ends in a Print, Literal,
//! Default or NotFound.

use std::fmt::{self, Write};
use std::ops::{Index, IndexMut};

use smallvec::SmallVec;

use crate::{Const, DefaultValue, MathOp, Number, Resolved, Span, Ty};

/// Index into the node arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Child or else-branch list. Most nodes have one to three entries.
pub type NodeList = SmallVec<[NodeId; 4]>;

/// One navigation step, as bound by the linker.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Access {
    Field { owner: String, name: String },
    Method { owner: String, name: String },
    /// Map lookup by literal key.
    Key(String),
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Field { owner, name } => write!(f, "{owner}.{name}"),
            Access::Method { owner, name } => write!(f, "{owner}.{name}()"),
            Access::Key(key) => write!(f, "[{key:?}]"),
        }
    }
}

/// Function argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum FnArg {
    Const(Const),
    /// Navigation from the root input. An absent step yields null.
    Path(Vec<Access>),
    /// Lenient stand-in for an unresolved argument path.
    Null,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// The whole template. Children are the top-level segments in order.
    Root { input: String, accumulator: String },
    /// Literal template text.
    Literal(String),
    Field { owner: String, name: String },
    Method { owner: String, name: String },
    MapAccess { key: String },
    /// `value <op> operand`; the node type is the promoted result type.
    Math { op: MathOp, operand: Number },
    Cast { to: Ty },
    /// Registered function applied to arguments evaluated from the root.
    Function { name: String, args: Vec<FnArg> },
    /// Descends into children when the `Option` is `Some`, else renders
    /// `otherwise`.
    OptionalGuard { otherwise: NodeList },
    /// Same as [`NodeKind::OptionalGuard`] for null values.
    NullableGuard { otherwise: NodeList },
    /// Children are the alternatives, each a Concatenation. The first one
    /// producing output wins; `otherwise` renders when none do.
    OrFallback { otherwise: NodeList },
    /// Renders children into a scratch accumulator and splices it in.
    Concatenation,
    /// Writes the current value. Absent values render the default, if any.
    Print { default: Option<DefaultValue> },
    /// Renders a declared default.
    Default(DefaultValue),
    /// Lenient placeholder for an unresolved reference. Renders nothing
    /// itself; a declared default follows as its child.
    NotFound { name: String },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Root { .. } => "Root",
            NodeKind::Literal(_) => "Literal",
            NodeKind::Field { .. } => "Field",
            NodeKind::Method { .. } => "Method",
            NodeKind::MapAccess { .. } => "MapAccess",
            NodeKind::Math { .. } => "Math",
            NodeKind::Cast { .. } => "Cast",
            NodeKind::Function { .. } => "Function",
            NodeKind::OptionalGuard { .. } => "OptionalGuard",
            NodeKind::NullableGuard { .. } => "NullableGuard",
            NodeKind::OrFallback { .. } => "OrFallback",
            NodeKind::Concatenation => "Concatenation",
            NodeKind::Print { .. } => "Print",
            NodeKind::Default(_) => "Default",
            NodeKind::NotFound { .. } => "NotFound",
        }
    }

    /// Else-branch, for the node kinds that have one.
    pub fn otherwise(&self) -> Option<&NodeList> {
        match self {
            NodeKind::OptionalGuard { otherwise }
            | NodeKind::NullableGuard { otherwise }
            | NodeKind::OrFallback { otherwise } => Some(otherwise),
            _ => None,
        }
    }

    pub fn otherwise_mut(&mut self) -> Option<&mut NodeList> {
        match self {
            NodeKind::OptionalGuard { otherwise }
            | NodeKind::NullableGuard { otherwise }
            | NodeKind::OrFallback { otherwise } => Some(otherwise),
            _ => None,
        }
    }

    fn detail(&self) -> String {
        match self {
            NodeKind::Root { input, accumulator } => format!("{input} -> {accumulator}"),
            NodeKind::Literal(text) => format!("{text:?}"),
            NodeKind::Field { name, .. } | NodeKind::Method { name, .. } => name.clone(),
            NodeKind::MapAccess { key } => format!("[{key:?}]"),
            NodeKind::Math { op, operand } => format!("{} {operand}", op.symbol()),
            NodeKind::Cast { to } => format!("as {to}"),
            NodeKind::Function { name, args } => format!("{name}/{}", args.len()),
            NodeKind::Print { default: Some(d) } | NodeKind::Default(d) => format!("?? {d}"),
            NodeKind::NotFound { name } => name.clone(),
            _ => String::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    /// Type of the value this node produces.
    pub ty: Resolved,
    pub children: NodeList,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, ty: Resolved, span: Span) -> Self {
        Node { kind, ty, children: NodeList::new(), span }
    }
}

/// Node arena for one template. The root is always the first node.
#[derive(Clone, Debug)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new(input: &str, accumulator: &str) -> Self {
        let root = Node::new(
            NodeKind::Root { input: input.to_owned(), accumulator: accumulator.to_owned() },
            Resolved::new(Ty::Object(input.to_owned())),
            Span::DUMMY,
        );
        Ast { nodes: vec![root] }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Copy the subtree at `id`, returning the new subtree root.
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let mut node = self[id].clone();
        node.children = node.children.iter().map(|&c| self.deep_copy(c)).collect();
        if let Some(otherwise) = node.kind.otherwise_mut() {
            let copied: NodeList = otherwise.clone().iter().map(|&c| self.deep_copy(c)).collect();
            *otherwise = copied;
        }
        self.alloc(node)
    }

    /// Visit every node reachable from `id`, parents first. Else-branches
    /// are visited after children.
    pub fn walk(&self, id: NodeId, f: &mut impl FnMut(NodeId, &Node)) {
        let node = &self[id];
        f(id, node);
        for &c in &node.children {
            self.walk(c, f);
        }
        if let Some(otherwise) = node.kind.otherwise() {
            for &c in otherwise {
                self.walk(c, f);
            }
        }
    }

    /// Number of reachable nodes of the given kind name.
    pub fn count(&self, kind: &str) -> usize {
        let mut n = 0;
        self.walk(self.root(), &mut |_, node| {
            if node.kind.name() == kind {
                n += 1;
            }
        });
        n
    }

    /// Indented tree listing of the reachable nodes.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root(), 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = &self[id];
        let _ = writeln!(
            out,
            "{:indent$}{} {} : {}",
            "",
            node.kind.name(),
            node.kind.detail(),
            node.ty,
            indent = depth * 2
        );
        for &c in &node.children {
            self.dump_node(c, depth + 1, out);
        }
        if let Some(otherwise) = node.kind.otherwise() {
            if !otherwise.is_empty() {
                let _ = writeln!(out, "{:indent$}else", "", indent = depth * 2 + 1);
                for &c in otherwise {
                    self.dump_node(c, depth + 1, out);
                }
            }
        }
    }
}

impl Index<NodeId> for Ast {
    type Output = Node;

    #[inline]
    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for Ast {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}
