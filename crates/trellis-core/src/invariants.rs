//! Invariant checks for the tree shape §3 requires, excluded from coverage —
//! these only fire when something upstream (the deserializer, or a
//! transformation) has already violated a structural guarantee.

#![cfg_attr(coverage_nightly, coverage(off))]

use crate::ir::ops::find_child;
use crate::ir::{Document, NodeId};
use crate::node_kind::NodeKind;

/// A `FunctionDefinition` must carry exactly one `Name` and one `Body`.
///
/// # Panics
/// Panics if either is missing — this is the *Internal* error kind of §7,
/// reserved for invariant violations that should never occur in practice.
pub fn ensure_function_shape(doc: &Document, func: NodeId) -> (NodeId, NodeId) {
    assert_eq!(doc.kind(func), NodeKind::FunctionDefinition);
    let name = find_child(doc, func, NodeKind::Name).unwrap_or_else(|| {
        panic!("FunctionDefinition {func} has no Name child (front-end invariant violated)")
    });
    let body = find_child(doc, func, NodeKind::Body).unwrap_or_else(|| {
        panic!("FunctionDefinition {func} has no Body child (front-end invariant violated)")
    });
    (name, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ops::append;
    use crate::ir::IrNode;

    #[test]
    #[should_panic(expected = "no Name child")]
    fn missing_name_panics() {
        let mut doc = Document::new();
        let func = doc.insert_new(IrNode::new(NodeKind::FunctionDefinition));
        let body = doc.insert_new(IrNode::new(NodeKind::Body));
        append(&mut doc, func, body).unwrap();
        ensure_function_shape(&doc, func);
    }

    #[test]
    fn well_formed_function_passes() {
        let mut doc = Document::new();
        let func = doc.insert_new(IrNode::new(NodeKind::FunctionDefinition));
        let name = doc.insert_new(IrNode::new(NodeKind::Name));
        let body = doc.insert_new(IrNode::new(NodeKind::Body));
        append(&mut doc, func, name).unwrap();
        append(&mut doc, func, body).unwrap();
        let (got_name, got_body) = ensure_function_shape(&doc, func);
        assert_eq!((got_name, got_body), (name, body));
    }
}
