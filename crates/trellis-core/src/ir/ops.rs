//! Tree manipulation primitives (§4.A).
//!
//! All mutation goes through these functions; nothing else in the crate
//! reaches into a node's `children`/`parent` fields directly. That keeps the
//! double-insertion guard and the tombstoning-on-delete behavior in one
//! place.

use crate::error::{CoreError, CoreResult};
use crate::node_kind::NodeKind;

use super::document::Document;
use super::node::NodeId;
use super::range::IterationRange;

/// First descendant of `id` with the given kind, depth-first, pre-order.
pub fn find(doc: &Document, id: NodeId, kind: NodeKind) -> Option<NodeId> {
    for &child in doc.children(id) {
        if doc.kind(child) == kind {
            return Some(child);
        }
        if let Some(found) = find(doc, child, kind) {
            return Some(found);
        }
    }
    None
}

/// First child of `id` with the given kind (one level, not recursive).
pub fn find_child(doc: &Document, id: NodeId, kind: NodeKind) -> Option<NodeId> {
    doc.children(id).iter().copied().find(|&c| doc.kind(c) == kind)
}

/// Next sibling of `id` with the given kind, scanning forward among `id`'s
/// siblings in document order. Returns `None` for a detached or root node.
pub fn find_next(doc: &Document, id: NodeId, kind: NodeKind) -> Option<NodeId> {
    let parent = doc.parent(id)?;
    let siblings = doc.children(parent);
    let pos = siblings.iter().position(|&s| s == id)?;
    siblings[pos + 1..]
        .iter()
        .copied()
        .find(|&s| doc.kind(s) == kind)
}

/// Nearest enclosing ancestor of `id` with the given kind.
pub fn find_parent(doc: &Document, id: NodeId, kind: NodeKind) -> Option<NodeId> {
    let mut current = doc.parent(id)?;
    loop {
        if doc.kind(current) == kind {
            return Some(current);
        }
        current = doc.parent(current)?;
    }
}

/// Deep clone of the subtree rooted at `id`. The result is detached.
pub fn clone(doc: &mut Document, id: NodeId) -> NodeId {
    doc.clone_subtree(id)
}

fn position_in_parent(doc: &Document, parent: NodeId, anchor: NodeId) -> usize {
    doc.children(parent)
        .iter()
        .position(|&c| c == anchor)
        .expect("anchor must be a child of its own reported parent")
}

/// Insert `node` as `anchor`'s immediately preceding sibling.
pub fn insert_before(doc: &mut Document, anchor: NodeId, node: NodeId) -> CoreResult<()> {
    doc.ensure_detached(node)?;
    let parent = doc.parent(anchor).ok_or(CoreError::NoParent(anchor))?;
    let pos = position_in_parent(doc, parent, anchor);
    doc.get_mut(parent).children.insert(pos, node);
    doc.attach(node, parent);
    Ok(())
}

/// Insert `node` as `anchor`'s immediately following sibling.
pub fn insert_after(doc: &mut Document, anchor: NodeId, node: NodeId) -> CoreResult<()> {
    doc.ensure_detached(node)?;
    let parent = doc.parent(anchor).ok_or(CoreError::NoParent(anchor))?;
    let pos = position_in_parent(doc, parent, anchor);
    doc.get_mut(parent).children.insert(pos + 1, node);
    doc.attach(node, parent);
    Ok(())
}

/// Insert `node` at the end of `parent`'s children.
pub fn append(doc: &mut Document, parent: NodeId, node: NodeId) -> CoreResult<()> {
    doc.ensure_detached(node)?;
    doc.get_mut(parent).children.push(node);
    doc.attach(node, parent);
    Ok(())
}

/// Remove `id` (and the subtree rooted at it) from its parent. The node
/// becomes detached; reusing it afterwards other than by dropping it is a
/// caller error (§3: "after `transform` completes they may hold dangling
/// references — they must not be reused").
pub fn delete(doc: &mut Document, id: NodeId) -> CoreResult<()> {
    let parent = doc.parent(id).ok_or(CoreError::NoParent(id))?;
    let pos = position_in_parent(doc, parent, id);
    doc.get_mut(parent).children.remove(pos);
    doc.detach(id);
    Ok(())
}

/// Replace `old` with `new` in `old`'s parent, detaching `old`.
pub fn replace(doc: &mut Document, old: NodeId, new: NodeId) -> CoreResult<()> {
    doc.ensure_detached(new)?;
    let parent = doc.parent(old).ok_or(CoreError::NoParent(old))?;
    let pos = position_in_parent(doc, parent, old);
    doc.get_mut(parent).children[pos] = new;
    doc.attach(new, parent);
    doc.detach(old);
    Ok(())
}

/// Splice a do-statement's `Body` children into the do-statement's parent,
/// positioned immediately after the do-statement itself (§4.A). The
/// do-statement is left in place, now with an empty body; callers that want
/// to remove the (now bodiless) loop header call [`delete`] separately —
/// this mirrors how loop extraction (§4.D.2 step 2) first hoists the body,
/// then deletes the header.
pub fn extract_body(doc: &mut Document, do_stmt: NodeId) -> CoreResult<()> {
    let body = find_child(doc, do_stmt, NodeKind::Body)
        .ok_or_else(|| CoreError::InvariantViolation(format!("{do_stmt} has no Body child")))?;
    let stmts: Vec<NodeId> = doc.children(body).to_vec();

    for stmt in &stmts {
        doc.detach(*stmt);
    }
    doc.get_mut(body).children.clear();

    let mut anchor = do_stmt;
    for stmt in stmts {
        insert_after(doc, anchor, stmt)?;
        anchor = stmt;
    }
    Ok(())
}

/// Read the iteration range of a `DoStatement` node from its `var`, `lower`,
/// `upper`, and `step` attributes.
pub fn iteration_range_of(doc: &Document, do_stmt: NodeId) -> CoreResult<IterationRange> {
    let node = doc.get(do_stmt);
    if node.kind != NodeKind::DoStatement {
        return Err(CoreError::InvariantViolation(format!(
            "{do_stmt} is not a DoStatement"
        )));
    }
    let attr = |name: &str| -> CoreResult<String> {
        node.attr(name)
            .map(str::to_owned)
            .ok_or_else(|| CoreError::InvariantViolation(format!("{do_stmt} missing `{name}`")))
    };
    Ok(IterationRange::new(
        attr("var")?,
        attr("lower")?,
        attr("upper")?,
        attr("step")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::node::IrNode;

    fn doc_with_chain() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let root = doc.insert_new(IrNode::new(NodeKind::Program));
        let func = doc.insert_new(IrNode::new(NodeKind::FunctionDefinition));
        let body = doc.insert_new(IrNode::new(NodeKind::Body));
        doc.set_root(root);
        append(&mut doc, root, func).unwrap();
        append(&mut doc, func, body).unwrap();
        (doc, root, func, body)
    }

    #[test]
    fn find_locates_nested_descendant() {
        let (doc, root, _func, body) = doc_with_chain();
        assert_eq!(find(&doc, root, NodeKind::Body), Some(body));
        assert_eq!(find(&doc, root, NodeKind::Pragma), None);
    }

    #[test]
    fn find_next_scans_following_siblings_only() {
        let mut doc = Document::new();
        let parent = doc.insert_new(IrNode::new(NodeKind::Body));
        let a = doc.insert_new(IrNode::new(NodeKind::Pragma));
        let b = doc.insert_new(IrNode::new(NodeKind::DoStatement));
        let c = doc.insert_new(IrNode::new(NodeKind::ExprStatement));
        append(&mut doc, parent, a).unwrap();
        append(&mut doc, parent, b).unwrap();
        append(&mut doc, parent, c).unwrap();

        assert_eq!(find_next(&doc, a, NodeKind::DoStatement), Some(b));
        assert_eq!(find_next(&doc, b, NodeKind::Pragma), None);
    }

    #[test]
    fn find_parent_walks_up() {
        let (doc, root, func, body) = doc_with_chain();
        assert_eq!(find_parent(&doc, body, NodeKind::FunctionDefinition), Some(func));
        assert_eq!(find_parent(&doc, body, NodeKind::Program), Some(root));
    }

    #[test]
    fn clone_allocates_fresh_ids_and_is_detached() {
        let (mut doc, _root, func, _body) = doc_with_chain();
        let cloned = clone(&mut doc, func);
        assert_ne!(cloned, func);
        assert!(doc.get(cloned).is_detached());
        assert_eq!(doc.children(cloned).len(), doc.children(func).len());
    }

    #[test]
    fn double_insertion_is_rejected() {
        let (mut doc, root, func, _body) = doc_with_chain();
        let err = append(&mut doc, root, func).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyAttached(id) if id == func));
    }

    #[test]
    fn delete_detaches_and_removes_from_parent() {
        let (mut doc, _root, func, body) = doc_with_chain();
        delete(&mut doc, body).unwrap();
        assert!(doc.get(body).is_detached());
        assert!(!doc.children(func).contains(&body));
    }

    #[test]
    fn insert_before_and_after_preserve_order() {
        let mut doc = Document::new();
        let parent = doc.insert_new(IrNode::new(NodeKind::Body));
        let anchor = doc.insert_new(IrNode::new(NodeKind::DoStatement));
        append(&mut doc, parent, anchor).unwrap();

        let before = doc.insert_new(IrNode::new(NodeKind::Pragma));
        let after = doc.insert_new(IrNode::new(NodeKind::ExprStatement));
        insert_before(&mut doc, anchor, before).unwrap();
        insert_after(&mut doc, anchor, after).unwrap();

        assert_eq!(doc.children(parent), &[before, anchor, after]);
    }

    #[test]
    fn replace_swaps_in_place_and_detaches_old() {
        let mut doc = Document::new();
        let parent = doc.insert_new(IrNode::new(NodeKind::Body));
        let old = doc.insert_new(IrNode::new(NodeKind::DoStatement));
        append(&mut doc, parent, old).unwrap();
        let new = doc.insert_new(IrNode::new(NodeKind::DoStatement));

        replace(&mut doc, old, new).unwrap();

        assert_eq!(doc.children(parent), &[new]);
        assert!(doc.get(old).is_detached());
    }

    #[test]
    fn extract_body_splices_children_after_do_statement() {
        let mut doc = Document::new();
        let parent = doc.insert_new(IrNode::new(NodeKind::Body));
        let do_stmt = doc
            .insert_new(IrNode::new(NodeKind::DoStatement).with_attr("var", "i"));
        append(&mut doc, parent, do_stmt).unwrap();

        let inner_body = doc.insert_new(IrNode::new(NodeKind::Body));
        append(&mut doc, do_stmt, inner_body).unwrap();
        let s1 = doc.insert_new(IrNode::new(NodeKind::ExprStatement));
        let s2 = doc.insert_new(IrNode::new(NodeKind::ExprStatement));
        append(&mut doc, inner_body, s1).unwrap();
        append(&mut doc, inner_body, s2).unwrap();

        extract_body(&mut doc, do_stmt).unwrap();

        assert_eq!(doc.children(parent), &[do_stmt, s1, s2]);
        assert!(doc.children(inner_body).is_empty());
    }

    #[test]
    fn iteration_range_of_reads_attrs() {
        let mut doc = Document::new();
        let do_stmt = doc.insert_new(
            IrNode::new(NodeKind::DoStatement)
                .with_attr("var", "i")
                .with_attr("lower", "1")
                .with_attr("upper", "n")
                .with_attr("step", "1"),
        );
        let range = iteration_range_of(&doc, do_stmt).unwrap();
        assert_eq!(range, IterationRange::new("i", "1", "n", "1"));
    }
}
