//! Small IR fragment builders shared by end-to-end pipeline tests, so each
//! test file builds fixtures the same way rather than duplicating the
//! boilerplate per test.

use trellis_core::ir::ops;
use trellis_core::{Document, IrNode, NodeId, NodeKind};

/// A `Pragma` node carrying the directive prefix and a `lineno` attribute,
/// the shape `pipeline::scan` expects.
pub(crate) fn pragma(doc: &mut Document, parent: NodeId, line: u32, body: &str) -> NodeId {
    let node = doc.insert_new(
        IrNode::new(NodeKind::Pragma)
            .with_text(format!("claw {body}"))
            .with_attr("lineno", line.to_string()),
    );
    ops::append(doc, parent, node).unwrap();
    node
}

/// A `DoStatement` with a single-statement `Body`, appended to `parent`.
pub(crate) fn do_loop(
    doc: &mut Document,
    parent: NodeId,
    var: &str,
    lower: &str,
    upper: &str,
    text: &str,
) -> (NodeId, NodeId) {
    let do_stmt = doc.insert_new(
        IrNode::new(NodeKind::DoStatement)
            .with_attr("var", var)
            .with_attr("lower", lower)
            .with_attr("upper", upper)
            .with_attr("step", "1"),
    );
    ops::append(doc, parent, do_stmt).unwrap();
    let body = doc.insert_new(IrNode::new(NodeKind::Body));
    ops::append(doc, do_stmt, body).unwrap();
    let stmt = doc.insert_new(IrNode::new(NodeKind::ExprStatement).with_text(text));
    ops::append(doc, body, stmt).unwrap();
    (do_stmt, body)
}

/// A `BasicType` entry registered under `key` in `program`'s type table,
/// optionally naming the element type its `ref` attribute demotes to.
pub(crate) fn basic_type(
    program: &mut trellis_core::Program,
    key: &str,
    dimensions: usize,
    elem_ref: Option<&str>,
) -> NodeId {
    let mut node = IrNode::new(NodeKind::BasicType).with_attr("dimensions", dimensions.to_string());
    if let Some(elem) = elem_ref {
        node = node.with_attr("ref", elem);
    }
    let id = program.doc.insert_new(node);
    program.types.add(key, id).unwrap();
    id
}

/// A `VarDecl` entry for `name` inside `table`, declared at type `type_key`.
pub(crate) fn decl(doc: &mut Document, table: NodeId, name: &str, type_key: &str) -> NodeId {
    let entry = doc.insert_new(
        IrNode::new(NodeKind::VarDecl)
            .with_attr("key", name)
            .with_attr("type", type_key),
    );
    ops::append(doc, table, entry).unwrap();
    entry
}

/// A resolved configuration declaring one group per built-in transformation
/// kind, in a fixed order, so pipeline tests can exercise `run` without
/// going through `config::load`. Each group's `class` path names the actual
/// type implementing that kind, matching how `pipeline::scan` resolves a
/// directive's governing group.
pub(crate) fn default_config() -> crate::config::ResolvedConfig {
    use crate::config::GroupSpec;
    use crate::transform::{TransformationClass, TriggerClass};

    let groups = vec![
        GroupSpec {
            name: "fuse".to_string(),
            class: "trellis_engine::transform::loop_fusion::LoopFusion".to_string(),
            kind: TransformationClass::Dependent,
            trigger: TriggerClass::Directive,
            block: false,
        },
        GroupSpec {
            name: "extract".to_string(),
            class: "trellis_engine::transform::loop_extract::LoopExtract".to_string(),
            kind: TransformationClass::Independent,
            trigger: TriggerClass::Directive,
            block: false,
        },
        GroupSpec {
            name: "accelerate".to_string(),
            class: "trellis_engine::passes::accelerator::Accelerator".to_string(),
            kind: TransformationClass::Independent,
            trigger: TriggerClass::Directive,
            block: false,
        },
        GroupSpec {
            name: "block".to_string(),
            class: "trellis_engine::passes::block::BlockTransform".to_string(),
            kind: TransformationClass::Independent,
            trigger: TriggerClass::Directive,
            block: true,
        },
    ];

    crate::config::ResolvedConfig {
        sets: Vec::new(),
        groups,
        params: std::collections::HashMap::new(),
        set_documents: std::collections::HashMap::new(),
    }
}
