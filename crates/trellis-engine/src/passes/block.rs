//! Block transformations: a start/end pragma pair delimiting a region
//! (§4.D.4). `analyze` walks forward from the start pragma counting nested
//! starts/ends of the same group until the balancing end is found;
//! `transform` removes both delimiters now that the region they marked has
//! served its structural purpose.

use std::any::Any;

use trellis_core::ir::ops;
use trellis_core::{Document, NodeId, NodeKind, Program};

use crate::directive::Directive;
use crate::error::{EngineError, EngineResult};
use crate::transform::{Transformation, TransformationClass, TriggerClass};

pub struct BlockTransform {
    start: NodeId,
    line: u32,
    group: Option<String>,
    end: Option<NodeId>,
}

impl BlockTransform {
    pub fn new(start: NodeId, line: u32, directive: &Directive) -> Self {
        Self {
            start,
            line,
            group: directive.group_label().map(str::to_string),
            end: None,
        }
    }
}

/// Pragma text recorded by the directive scan, so block.rs doesn't have to
/// re-run the directive parser to tell a start pragma from an end pragma.
fn pragma_kind(doc: &Document, id: NodeId) -> Option<&str> {
    doc.get(id).attr("directive-kind")
}

/// Walk forward through `start`'s following siblings, tracking nesting depth
/// of same-kind start/end pragmas, until the balancing end is found at
/// depth zero.
fn find_matching_end(doc: &Document, start: NodeId) -> Option<NodeId> {
    let parent = doc.parent(start)?;
    let siblings = doc.children(parent);
    let pos = siblings.iter().position(|&s| s == start)?;

    let mut depth = 0;
    for &sibling in &siblings[pos + 1..] {
        if doc.kind(sibling) != NodeKind::Pragma {
            continue;
        }
        match pragma_kind(doc, sibling) {
            Some("block-start") => depth += 1,
            Some("block-end") if depth == 0 => return Some(sibling),
            Some("block-end") => depth -= 1,
            _ => {}
        }
    }
    None
}

impl Transformation for BlockTransform {
    fn kind_name(&self) -> &'static str {
        "block-transform"
    }

    fn class(&self) -> TransformationClass {
        TransformationClass::Independent
    }

    fn trigger(&self) -> TriggerClass {
        TriggerClass::Directive
    }

    fn group_label(&self) -> Option<String> {
        self.group.clone()
    }

    fn line(&self) -> u32 {
        self.line
    }

    fn analyze(&mut self, program: &mut Program) -> bool {
        match find_matching_end(&program.doc, self.start) {
            Some(end) => {
                self.end = Some(end);
                true
            }
            None => {
                let err = EngineError::unbalanced_block(
                    self.line,
                    "block-start has no balancing block-end at the same nesting depth",
                );
                program
                    .diagnostics
                    .error(err.to_string(), trellis_core::Span::line(self.line))
                    .emit();
                false
            }
        }
    }

    fn transform(
        &mut self,
        program: &mut Program,
        _spawned: &mut Vec<Box<dyn Transformation>>,
    ) -> EngineResult<()> {
        let end = self.end.expect("analyze must run before transform");
        ops::delete(&mut program.doc, end)?;
        ops::delete(&mut program.doc, self.start)?;
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{Document, IrNode};

    fn directive() -> Directive {
        Directive {
            kind: "block-start".to_string(),
            clauses: indexmap::IndexMap::new(),
        }
    }

    fn pragma(doc: &mut Document, kind: &str) -> NodeId {
        doc.insert_new(IrNode::new(NodeKind::Pragma).with_attr("directive-kind", kind))
    }

    #[test]
    fn analyze_finds_matching_end_through_nesting() {
        let mut doc = Document::new();
        let body = doc.insert_new(IrNode::new(NodeKind::Body));
        let outer_start = pragma(&mut doc, "block-start");
        ops::append(&mut doc, body, outer_start).unwrap();
        let inner_start = pragma(&mut doc, "block-start");
        ops::append(&mut doc, body, inner_start).unwrap();
        let inner_end = pragma(&mut doc, "block-end");
        ops::append(&mut doc, body, inner_end).unwrap();
        let outer_end = pragma(&mut doc, "block-end");
        ops::append(&mut doc, body, outer_end).unwrap();

        let root = doc.insert_new(IrNode::new(NodeKind::Program));
        doc.set_root(root);
        let mut program = Program::new(doc, root);

        let mut block = BlockTransform::new(outer_start, 1, &directive());
        assert!(block.analyze(&mut program));
        assert_eq!(block.end, Some(outer_end));
    }

    #[test]
    fn analyze_fails_when_unbalanced() {
        let mut doc = Document::new();
        let body = doc.insert_new(IrNode::new(NodeKind::Body));
        let start = pragma(&mut doc, "block-start");
        ops::append(&mut doc, body, start).unwrap();

        let root = doc.insert_new(IrNode::new(NodeKind::Program));
        doc.set_root(root);
        let mut program = Program::new(doc, root);

        let mut block = BlockTransform::new(start, 1, &directive());
        assert!(!block.analyze(&mut program));
        assert!(program.diagnostics.has_errors());
    }

    #[test]
    fn transform_removes_both_delimiters() {
        let mut doc = Document::new();
        let body = doc.insert_new(IrNode::new(NodeKind::Body));
        let start = pragma(&mut doc, "block-start");
        ops::append(&mut doc, body, start).unwrap();
        let inner = doc.insert_new(IrNode::new(NodeKind::ExprStatement));
        ops::append(&mut doc, body, inner).unwrap();
        let end = pragma(&mut doc, "block-end");
        ops::append(&mut doc, body, end).unwrap();

        let root = doc.insert_new(IrNode::new(NodeKind::Program));
        doc.set_root(root);
        let mut program = Program::new(doc, root);

        let mut block = BlockTransform::new(start, 1, &directive());
        assert!(block.analyze(&mut program));
        block.transform(&mut program, &mut Vec::new()).unwrap();
        assert_eq!(program.doc.children(body), &[inner]);
    }
}
