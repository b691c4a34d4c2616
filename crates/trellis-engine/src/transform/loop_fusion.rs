//! Loop fusion: a dependent, directive-triggered transformation (§4.D.1).

use std::any::Any;
use std::collections::HashSet;

use trellis_core::ir::ops;
use trellis_core::{Document, NodeId, NodeKind, Program};

use crate::error::EngineResult;

use super::{Transformation, TransformationClass, TriggerClass};

pub struct LoopFusion {
    pragma: NodeId,
    line: u32,
    group: Option<String>,
    do_stmt: Option<NodeId>,
    /// Other instances in the same group this one has absorbed, in the
    /// order they were paired (document order): `(their pragma, their
    /// do-statement)`. A group of more than two same-group pragmas chains
    /// onto a single anchor instead of only ever merging two at a time
    /// (§4.D.1, §8 scenario 1).
    partners: Vec<(NodeId, NodeId)>,
}

impl LoopFusion {
    pub fn new(pragma: NodeId, line: u32, group: Option<String>) -> Self {
        Self {
            pragma,
            line,
            group,
            do_stmt: None,
            partners: Vec::new(),
        }
    }
}

fn next_sibling(doc: &Document, id: NodeId) -> Option<NodeId> {
    let parent = doc.parent(id)?;
    let siblings = doc.children(parent);
    let pos = siblings.iter().position(|&s| s == id)?;
    siblings.get(pos + 1).copied()
}

fn collect_var_names(doc: &Document, root: NodeId, out: &mut HashSet<String>) {
    for &child in doc.children(root) {
        let node = doc.get(child);
        if matches!(node.kind, NodeKind::Var | NodeKind::VarRef) {
            if let Some(name) = node.attr("name").or(node.text.as_deref()) {
                out.insert(name.to_string());
            }
        }
        collect_var_names(doc, child, out);
    }
}

/// Conservative side-effect check (§4.D.1 pairing condition c, stricter than
/// the source per §9's flagged open behavioral choice): any node between the
/// two loops carrying a `writes` attribute naming a variable the second
/// loop's body reads aborts the pairing.
fn has_conflicting_write(doc: &Document, between: &[NodeId], second_body: NodeId) -> bool {
    let mut reads = HashSet::new();
    collect_var_names(doc, second_body, &mut reads);
    between
        .iter()
        .any(|&n| doc.get(n).attr("writes").is_some_and(|w| reads.contains(w)))
}

impl Transformation for LoopFusion {
    fn kind_name(&self) -> &'static str {
        "loop-fusion"
    }

    fn class(&self) -> TransformationClass {
        TransformationClass::Dependent
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
            Some(id) if program.doc.kind(id) == NodeKind::DoStatement => {
                self.do_stmt = Some(id);
                true
            }
            _ => {
                program
                    .diagnostics
                    .error(
                        "loop-fusion pragma is not immediately followed by a do-statement",
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
        let first_do = self.do_stmt.expect("analyze must run before transform");
        if self.partners.is_empty() {
            panic!("transform called on an unpaired loop-fusion instance");
        }

        let first_body = ops::find_child(&program.doc, first_do, NodeKind::Body)
            .expect("do-statement has a Body child");

        for (partner_pragma, partner_do) in self.partners.drain(..) {
            let partner_body = ops::find_child(&program.doc, partner_do, NodeKind::Body)
                .expect("do-statement has a Body child");

            let moved: Vec<NodeId> = program.doc.children(partner_body).to_vec();
            for stmt in moved {
                ops::delete(&mut program.doc, stmt)?;
                ops::append(&mut program.doc, first_body, stmt)?;
            }

            ops::delete(&mut program.doc, partner_do)?;
            ops::delete(&mut program.doc, partner_pragma)?;
        }

        ops::delete(&mut program.doc, self.pragma)?;
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn pair_with(&mut self, partner: &mut dyn Transformation, doc: &Document) -> bool {
        let Some(other) = partner.as_any_mut().downcast_mut::<LoopFusion>() else {
            return false;
        };
        if !ranges_compatible(doc, self, other) {
            return false;
        }
        let other_do = other.do_stmt.expect("ranges_compatible implies do_stmt is set");
        self.partners.push((other.pragma, other_do));
        true
    }
}

/// Range-equality check (§4.D.1 condition a) and the side-effect check
/// (condition c): both instances must already have an analyzed `do_stmt`.
pub fn ranges_compatible(doc: &Document, first: &LoopFusion, second: &LoopFusion) -> bool {
    let (Some(first_do), Some(second_do)) = (first.do_stmt, second.do_stmt) else {
        return false;
    };
    let Ok(r1) = ops::iteration_range_of(doc, first_do) else {
        return false;
    };
    let Ok(r2) = ops::iteration_range_of(doc, second_do) else {
        return false;
    };
    if r1 != r2 {
        return false;
    }
    let between: Vec<NodeId> = {
        let parent = doc.parent(first_do).expect("do-statement is attached");
        let siblings = doc.children(parent);
        let lo = siblings.iter().position(|&s| s == first_do).unwrap();
        let hi = siblings.iter().position(|&s| s == second_do).unwrap();
        if lo + 1 >= hi {
            Vec::new()
        } else {
            siblings[lo + 1..hi].to_vec()
        }
    };
    let second_body =
        ops::find_child(doc, second_do, NodeKind::Body).expect("do-statement has a Body child");
    !has_conflicting_write(doc, &between, second_body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::ir::IrNode;
    use trellis_core::Document;

    fn do_loop(doc: &mut Document, var: &str, text: &str) -> (NodeId, NodeId) {
        let do_stmt = doc.insert_new(
            IrNode::new(NodeKind::DoStatement)
                .with_attr("var", var)
                .with_attr("lower", "1")
                .with_attr("upper", "2")
                .with_attr("step", "1"),
        );
        let body = doc.insert_new(IrNode::new(NodeKind::Body));
        ops::append(doc, do_stmt, body).unwrap();
        let stmt = doc.insert_new(IrNode::new(NodeKind::ExprStatement).with_text(text));
        ops::append(doc, body, stmt).unwrap();
        (do_stmt, body)
    }

    #[test]
    fn analyze_succeeds_when_pragma_precedes_do_statement() {
        let mut doc = Document::new();
        let body = doc.insert_new(IrNode::new(NodeKind::Body));
        let pragma = doc.insert_new(IrNode::new(NodeKind::Pragma));
        ops::append(&mut doc, body, pragma).unwrap();
        let (do_stmt, _) = do_loop(&mut doc, "i", "print 1");
        ops::append(&mut doc, body, do_stmt).unwrap();

        let root = doc.insert_new(IrNode::new(NodeKind::Program));
        doc.set_root(root);
        let mut program = Program::new(doc, root);

        let mut fusion = LoopFusion::new(pragma, 1, None);
        assert!(fusion.analyze(&mut program));
        assert_eq!(fusion.do_stmt, Some(do_stmt));
    }

    #[test]
    fn transform_merges_bodies_and_removes_second_loop() {
        let mut doc = Document::new();
        let program_body = doc.insert_new(IrNode::new(NodeKind::Body));

        let p1 = doc.insert_new(IrNode::new(NodeKind::Pragma));
        ops::append(&mut doc, program_body, p1).unwrap();
        let (do1, body1) = do_loop(&mut doc, "i", "print 'A'");
        ops::append(&mut doc, program_body, do1).unwrap();

        let p2 = doc.insert_new(IrNode::new(NodeKind::Pragma));
        ops::append(&mut doc, program_body, p2).unwrap();
        let (do2, body2) = do_loop(&mut doc, "i", "print 'B'");
        ops::append(&mut doc, program_body, do2).unwrap();

        let root = doc.insert_new(IrNode::new(NodeKind::Program));
        doc.set_root(root);
        let mut program = Program::new(doc, root);

        let mut first = LoopFusion::new(p1, 1, None);
        let mut second = LoopFusion::new(p2, 2, None);
        assert!(first.analyze(&mut program));
        assert!(second.analyze(&mut program));
        assert!(first.pair_with(&mut second, &program.doc));

        first.transform(&mut program, &mut Vec::new()).unwrap();

        assert_eq!(program.doc.children(program_body), &[do1]);
        assert_eq!(program.doc.children(body1).len(), 2);
        let _ = body2;
    }

    #[test]
    fn anchor_absorbs_every_member_of_a_larger_group() {
        let mut doc = Document::new();
        let program_body = doc.insert_new(IrNode::new(NodeKind::Body));

        let p1 = doc.insert_new(IrNode::new(NodeKind::Pragma));
        ops::append(&mut doc, program_body, p1).unwrap();
        let (do1, body1) = do_loop(&mut doc, "i", "print 'A'");
        ops::append(&mut doc, program_body, do1).unwrap();

        let p2 = doc.insert_new(IrNode::new(NodeKind::Pragma));
        ops::append(&mut doc, program_body, p2).unwrap();
        let (do2, _) = do_loop(&mut doc, "i", "print 'B'");
        ops::append(&mut doc, program_body, do2).unwrap();

        let p3 = doc.insert_new(IrNode::new(NodeKind::Pragma));
        ops::append(&mut doc, program_body, p3).unwrap();
        let (do3, _) = do_loop(&mut doc, "i", "print 'C'");
        ops::append(&mut doc, program_body, do3).unwrap();

        let root = doc.insert_new(IrNode::new(NodeKind::Program));
        doc.set_root(root);
        let mut program = Program::new(doc, root);

        let mut first = LoopFusion::new(p1, 1, Some("g".to_string()));
        let mut second = LoopFusion::new(p2, 2, Some("g".to_string()));
        let mut third = LoopFusion::new(p3, 3, Some("g".to_string()));
        assert!(first.analyze(&mut program));
        assert!(second.analyze(&mut program));
        assert!(third.analyze(&mut program));
        assert!(first.pair_with(&mut second, &program.doc));
        assert!(first.pair_with(&mut third, &program.doc));

        first.transform(&mut program, &mut Vec::new()).unwrap();

        assert_eq!(program.doc.children(program_body), &[do1]);
        assert_eq!(program.doc.children(body1).len(), 3);
    }

    #[test]
    fn pairing_rejects_mismatched_ranges() {
        let mut doc = Document::new();
        let program_body = doc.insert_new(IrNode::new(NodeKind::Body));

        let p1 = doc.insert_new(IrNode::new(NodeKind::Pragma));
        ops::append(&mut doc, program_body, p1).unwrap();
        let (do1, _) = do_loop(&mut doc, "i", "print 'A'");
        ops::append(&mut doc, program_body, do1).unwrap();
        doc.get_mut(do1).set_attr("upper", "2");

        let p2 = doc.insert_new(IrNode::new(NodeKind::Pragma));
        ops::append(&mut doc, program_body, p2).unwrap();
        let (do2, _) = do_loop(&mut doc, "i", "print 'B'");
        ops::append(&mut doc, program_body, do2).unwrap();
        doc.get_mut(do2).set_attr("upper", "9");

        let root = doc.insert_new(IrNode::new(NodeKind::Program));
        doc.set_root(root);
        let mut program = Program::new(doc, root);

        let mut first = LoopFusion::new(p1, 1, None);
        let mut second = LoopFusion::new(p2, 2, None);
        assert!(first.analyze(&mut program));
        assert!(second.analyze(&mut program));
        assert!(!first.pair_with(&mut second, &program.doc));
    }
}
