//! Deserialization boundary (§10): a 1:1 JSON mirror of the IR document,
//! resolved into the arena-backed, ID-indexed [`crate::program::Program`].

use indexmap::IndexMap;

use crate::error::{CoreError, CoreResult};
use crate::ir::ops::find_child;
use crate::ir::{Document, IrNode, NodeId};
use crate::node_kind::NodeKind;
use crate::program::Program;

/// Raw, 1:1 deserialization of one IR node, matching the document shape
/// exchanged with the front-end/back-end (§6, §10).
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct RawNode {
    pub kind: NodeKind,
    #[serde(default)]
    pub attrs: IndexMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub children: Vec<RawNode>,
}

/// Parse one IR document from its JSON text.
pub fn parse_document(json: &str) -> serde_json::Result<RawNode> {
    serde_json::from_str(json)
}

/// Re-serialize a raw tree back to JSON text, matching attribute and child
/// order exactly for untouched subtrees (§10's idempotent-no-op support).
pub fn to_json(raw: &RawNode) -> serde_json::Result<String> {
    serde_json::to_string_pretty(raw)
}

/// Resolve a raw, 1:1 tree into an arena-backed, ID-indexed [`Program`].
///
/// This is the boundary described in §10: malformed shapes here are
/// deserialization failures, fatal at load time, distinct from the
/// *Internal* error kind reserved for invariant violations discovered
/// mid-pipeline.
pub fn load(raw: &RawNode) -> CoreResult<Program> {
    if raw.kind != NodeKind::Program {
        return Err(CoreError::InvariantViolation(format!(
            "document root must be Program, found {}",
            raw.kind
        )));
    }

    let mut doc = Document::new();
    let root = build(&mut doc, raw);
    doc.set_root(root);

    let mut program = Program::new(doc, root);
    index_global_tables(&mut program)?;
    validate_function_shapes(&program)?;
    Ok(program)
}

fn build(doc: &mut Document, raw: &RawNode) -> NodeId {
    let mut node = IrNode::new(raw.kind);
    for (k, v) in &raw.attrs {
        node.set_attr(k.clone(), v.clone());
    }
    if let Some(text) = &raw.text {
        node = node.with_text(text.clone());
    }
    let id = doc.insert_new(node);

    let children: Vec<NodeId> = raw.children.iter().map(|c| build(doc, c)).collect();
    for &child in &children {
        doc.attach(child, id);
    }
    doc.get_mut(id).children = children;
    id
}

/// Re-express a resolved program as the 1:1 raw tree, the inverse of
/// [`load`]. Used to hand the transformed document back across the
/// deserialization boundary (§6, §10).
pub fn dump(program: &Program) -> RawNode {
    dump_node(&program.doc, program.root)
}

fn dump_node(doc: &Document, id: NodeId) -> RawNode {
    let node = doc.get(id);
    RawNode {
        kind: node.kind,
        attrs: node.attrs().map(|(k, v)| (k.to_owned(), v.to_owned())).collect(),
        text: node.text.clone(),
        children: doc.children(id).iter().map(|&child| dump_node(doc, child)).collect(),
    }
}

fn index_global_tables(program: &mut Program) -> CoreResult<()> {
    if let Some(type_table) = find_child(&program.doc, program.root, NodeKind::TypeTable) {
        for &entry in program.doc.children(type_table).to_vec().iter() {
            let key = entry_key(&program.doc, entry)?;
            program.types.add(key, entry)?;
        }
    }
    if let Some(sym_table) = find_child(&program.doc, program.root, NodeKind::SymbolTable) {
        for &entry in program.doc.children(sym_table).to_vec().iter() {
            let key = entry_key(&program.doc, entry)?;
            program.global_symbols.add(key, entry)?;
        }
    }
    if let Some(decl_table) = find_child(&program.doc, program.root, NodeKind::DeclTable) {
        for &entry in program.doc.children(decl_table).to_vec().iter() {
            let key = entry_key(&program.doc, entry)?;
            program.global_decls.add(key, entry)?;
        }
    }
    Ok(())
}

fn entry_key(doc: &Document, entry: NodeId) -> CoreResult<String> {
    doc.get(entry)
        .attr("key")
        .map(str::to_owned)
        .ok_or_else(|| CoreError::InvariantViolation(format!("table entry {entry} has no `key` attr")))
}

fn validate_function_shapes(program: &Program) -> CoreResult<()> {
    for func in program.function_definitions() {
        crate::invariants::ensure_function_shape(&program.doc, func);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "kind": "Program",
            "children": [
                { "kind": "TypeTable", "children": [
                    { "kind": "BasicType", "attrs": { "key": "int4", "dimensions": "0" } }
                ]},
                { "kind": "SymbolTable", "children": [] },
                { "kind": "DeclTable", "children": [] },
                { "kind": "FunctionDefinition", "children": [
                    { "kind": "Name", "text": "main" },
                    { "kind": "Body", "children": [] }
                ]}
            ]
        }"#
    }

    #[test]
    fn parses_and_indexes_round_trip() {
        let raw = parse_document(sample_json()).unwrap();
        let program = load(&raw).unwrap();
        assert_eq!(program.types.lookup("int4").is_some(), true);
        assert_eq!(program.function_definitions().len(), 1);
        assert!(program.find_function("main").is_some());
    }

    #[test]
    fn rejects_non_program_root() {
        let raw = parse_document(r#"{ "kind": "Body" }"#).unwrap();
        assert!(load(&raw).is_err());
    }

    #[test]
    #[should_panic(expected = "no Name child")]
    fn malformed_function_panics_as_invariant_violation() {
        let raw = parse_document(
            r#"{
                "kind": "Program",
                "children": [
                    { "kind": "FunctionDefinition", "children": [
                        { "kind": "Body", "children": [] }
                    ]}
                ]
            }"#,
        )
        .unwrap();
        let _ = load(&raw);
    }
}
