//! Accelerator directive insertion: an independent, directive-triggered
//! transformation (§4.D.3). Pure IR surgery around a pragma-selected region;
//! no analysis beyond locating that region.

use std::any::Any;

use trellis_core::ir::ops;
use trellis_core::{Document, IrNode, NodeId, NodeKind, Program};

use crate::directive::Directive;
use crate::error::EngineResult;
use crate::transform::{Transformation, TransformationClass, TriggerClass};

pub struct Accelerator {
    pragma: NodeId,
    line: u32,
    accelerator: Option<String>,
    group: Option<String>,
    region: Option<NodeId>,
}

impl Accelerator {
    pub fn new(pragma: NodeId, line: u32, directive: &Directive) -> Self {
        Self {
            pragma,
            line,
            accelerator: directive.scalar("accelerator").map(str::to_string),
            group: directive.group_label().map(str::to_string),
            region: None,
        }
    }
}

fn next_sibling(doc: &Document, id: NodeId) -> Option<NodeId> {
    let parent = doc.parent(id)?;
    let siblings = doc.children(parent);
    let pos = siblings.iter().position(|&s| s == id)?;
    siblings.get(pos + 1).copied()
}

impl Transformation for Accelerator {
    fn kind_name(&self) -> &'static str {
        "parallelize"
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
        match next_sibling(&program.doc, self.pragma) {
            Some(id) => {
                self.region = Some(id);
                true
            }
            None => {
                program
                    .diagnostics
                    .error(
                        "parallelize pragma selects no following region",
                        trellis_core::Span::line(self.line),
                    )
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
        let region = self.region.expect("analyze must run before transform");

        let start = program
            .doc
            .insert_new(IrNode::new(NodeKind::Pragma).with_text("acc parallel"));
        let end = program
            .doc
            .insert_new(IrNode::new(NodeKind::Pragma).with_text("acc end parallel"));
        ops::insert_before(&mut program.doc, region, start)?;
        ops::insert_after(&mut program.doc, region, end)?;

        if let Some(accel) = &self.accelerator {
            let accel_pragma = program
                .doc
                .insert_new(IrNode::new(NodeKind::Pragma).with_text(format!("acc {accel}")));
            ops::insert_after(&mut program.doc, start, accel_pragma)?;
        }

        ops::delete(&mut program.doc, self.pragma)?;
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

    fn directive(accel: Option<&str>) -> Directive {
        let mut clauses = indexmap::IndexMap::new();
        if let Some(a) = accel {
            clauses.insert(
                "accelerator".to_string(),
                crate::directive::ClauseValue::Scalar(a.to_string()),
            );
        }
        Directive {
            kind: "parallelize".to_string(),
            clauses,
        }
    }

    #[test]
    fn analyze_fails_with_no_following_region() {
        let mut doc = Document::new();
        let body = doc.insert_new(IrNode::new(NodeKind::Body));
        let pragma = doc.insert_new(IrNode::new(NodeKind::Pragma));
        ops::append(&mut doc, body, pragma).unwrap();
        let root = doc.insert_new(IrNode::new(NodeKind::Program));
        doc.set_root(root);
        let mut program = Program::new(doc, root);

        let mut accel = Accelerator::new(pragma, 1, &directive(None));
        assert!(!accel.analyze(&mut program));
    }

    #[test]
    fn transform_wraps_region_with_start_and_end_pragmas() {
        let mut doc = Document::new();
        let body = doc.insert_new(IrNode::new(NodeKind::Body));
        let pragma = doc.insert_new(IrNode::new(NodeKind::Pragma));
        ops::append(&mut doc, body, pragma).unwrap();
        let do_stmt = doc.insert_new(IrNode::new(NodeKind::DoStatement));
        ops::append(&mut doc, body, do_stmt).unwrap();

        let root = doc.insert_new(IrNode::new(NodeKind::Program));
        doc.set_root(root);
        let mut program = Program::new(doc, root);

        let mut accel = Accelerator::new(pragma, 1, &directive(Some("vector")));
        assert!(accel.analyze(&mut program));
        accel.transform(&mut program, &mut Vec::new()).unwrap();

        let children = program.doc.children(body).to_vec();
        assert_eq!(children.len(), 4);
        assert_eq!(program.doc.get(children[0]).text.as_deref(), Some("acc parallel"));
        assert_eq!(program.doc.get(children[1]).text.as_deref(), Some("acc vector"));
        assert_eq!(children[2], do_stmt);
        assert_eq!(program.doc.get(children[3]).text.as_deref(), Some("acc end parallel"));
    }
}
