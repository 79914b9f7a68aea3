//! Common-prefix compaction.
//!
//! Sibling paths that start with the same navigation are merged so the
//! shared value is fetched and checked once. Only literal text may sit
//! between the merged paths; it moves under the merged node, and guards
//! repeat it in their else-branch so absent values render the same text.
//!
//! ```text
//! ${address.city}, ${address.zip}
//!
//! Field address               Field address
//!   OptionalGuard               OptionalGuard
//!     Field city         =>       Field city
//! Literal ", "                    Literal ", "
//! Field address                   Field zip
//!   OptionalGuard               else
//!     Field zip                   Literal ", "
//! ```

use fpath_ir::{ensure_sufficient_stack, Ast, Node, NodeId, NodeKind, NodeList};
use tracing::debug;

/// Merge common prefixes throughout the tree. Returns the number of merges.
pub fn compact(ast: &mut Ast) -> usize {
    let root = ast.root();
    let merged = compact_node(ast, root);
    if merged > 0 {
        debug!(merged, nodes = ast.len(), "compacted common prefixes");
    }
    merged
}

fn compact_node(ast: &mut Ast, id: NodeId) -> usize {
    ensure_sufficient_stack(|| compact_children(ast, id))
}

fn compact_children(ast: &mut Ast, id: NodeId) -> usize {
    let children = std::mem::take(&mut ast[id].children);
    let (children, mut merged) = compact_list(ast, &children);
    ast[id].children = children;

    let otherwise = ast[id].kind.otherwise_mut().map(std::mem::take);
    if let Some(otherwise) = otherwise {
        let (otherwise, n) = compact_list(ast, &otherwise);
        if let Some(slot) = ast[id].kind.otherwise_mut() {
            *slot = otherwise;
        }
        merged += n;
    }
    merged
}

fn compact_list(ast: &mut Ast, list: &[NodeId]) -> (NodeList, usize) {
    let mut out = NodeList::new();
    let mut merged = 0;
    let mut i = 0;

    while i < list.len() {
        let id = list[i];
        i += 1;

        if is_mergeable(&ast[id].kind) {
            loop {
                let mut next = i;
                while next < list.len() && matches!(ast[list[next]].kind, NodeKind::Literal(_)) {
                    next += 1;
                }
                if next == list.len() || !same_head(&ast[id], &ast[list[next]]) {
                    break;
                }
                merge(ast, id, list[next], &list[i..next]);
                merged += 1;
                i = next + 1;
            }
        }

        merged += compact_node(ast, id);
        out.push(id);
    }
    (out, merged)
}

/// Move `separators` and the children of `other` under `keep`.
fn merge(ast: &mut Ast, keep: NodeId, other: NodeId, separators: &[NodeId]) {
    debug!(kind = ast[keep].kind.name(), separators = separators.len(), "merging sibling paths");

    let other_children = std::mem::take(&mut ast[other].children);
    let node = &mut ast[keep];
    node.children.extend_from_slice(separators);
    node.children.extend(other_children);

    if ast[keep].kind.otherwise().is_none() {
        return;
    }
    let copies: NodeList = separators.iter().map(|&s| ast.deep_copy(s)).collect();
    let other_else = ast[other].kind.otherwise_mut().map(std::mem::take).unwrap_or_default();
    if let Some(otherwise) = ast[keep].kind.otherwise_mut() {
        otherwise.extend(copies);
        otherwise.extend(other_else);
    }
}

fn is_mergeable(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Field { .. }
            | NodeKind::Method { .. }
            | NodeKind::MapAccess { .. }
            | NodeKind::Function { .. }
            | NodeKind::Math { .. }
            | NodeKind::Cast { .. }
            | NodeKind::OptionalGuard { .. }
            | NodeKind::NullableGuard { .. }
    )
}

/// Same navigation producing the same type. Else-branches are ignored.
fn same_head(a: &Node, b: &Node) -> bool {
    if a.ty != b.ty {
        return false;
    }
    match (&a.kind, &b.kind) {
        (NodeKind::OptionalGuard { .. }, NodeKind::OptionalGuard { .. })
        | (NodeKind::NullableGuard { .. }, NodeKind::NullableGuard { .. }) => true,
        (x, y) => is_mergeable(x) && x == y,
    }
}
