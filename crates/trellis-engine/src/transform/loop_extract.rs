//! Loop extraction: an independent, directive-triggered transformation
//! (§4.D.2). Hoists a loop out of a callee into the caller, around the call
//! site, rewriting the call's arguments to match.

use std::any::Any;

use trellis_core::ir::ops;
use trellis_core::{Document, IrNode, IterationRange, NodeId, NodeKind, Program};

use crate::directive::{Directive, Mapping, Range};
use crate::error::{EngineError, EngineResult};

use super::loop_fusion::LoopFusion;
use super::{Transformation, TransformationClass, TriggerClass};

pub struct LoopExtract {
    pragma: NodeId,
    line: u32,
    range: Range,
    mapping: Option<Mapping>,
    parallel: bool,
    accelerator: Option<String>,
    fusion_group: Option<String>,
    group: Option<String>,

    call_stmt: Option<NodeId>,
    call: Option<NodeId>,
    callee: Option<NodeId>,
    target_do: Option<NodeId>,
}

impl LoopExtract {
    pub fn new(pragma: NodeId, line: u32, directive: &Directive) -> Self {
        Self {
            pragma,
            line,
            range: directive
                .range()
                .expect("parser enforces loop-extract's required range clause")
                .clone(),
            mapping: directive.mapping().cloned(),
            parallel: directive.has_flag("parallel"),
            accelerator: directive.scalar("accelerator").map(str::to_string),
            fusion_group: directive.scalar("fusion").map(str::to_string),
            group: directive.group_label().map(str::to_string),
            call_stmt: None,
            call: None,
            callee: None,
            target_do: None,
        }
    }
}

fn next_sibling(doc: &Document, id: NodeId) -> Option<NodeId> {
    let parent = doc.parent(id)?;
    let siblings = doc.children(parent);
    let pos = siblings.iter().position(|&s| s == id)?;
    siblings.get(pos + 1).copied()
}

fn call_arguments(doc: &Document, call: NodeId) -> Vec<NodeId> {
    doc.children(call)
        .iter()
        .copied()
        .filter(|&id| matches!(doc.kind(id), NodeKind::VarRef | NodeKind::ArrayRef))
        .collect()
}

fn arg_name(doc: &Document, arg: NodeId) -> Option<String> {
    doc.get(arg)
        .attr("name")
        .map(str::to_owned)
        .or_else(|| doc.get(arg).text.clone())
}

/// Locate the do-statement inside `callee` whose range equals `range` (§4.D.2
/// step 2): the first do-statement in the callee's body is tried first; if it
/// doesn't match, later siblings at the same level are scanned in order.
fn matching_do_statement(doc: &Document, callee: NodeId, range: &Range) -> Option<NodeId> {
    let body = ops::find_child(doc, callee, NodeKind::Body)?;
    let target = IterationRange::new(
        range.induction_var.clone(),
        range.lower.clone(),
        range.upper.clone(),
        range.step.clone(),
    );
    doc.children(body)
        .iter()
        .copied()
        .filter(|&id| doc.kind(id) == NodeKind::DoStatement)
        .find(|&id| ops::iteration_range_of(doc, id).map(|r| r == target).unwrap_or(false))
}

/// Dimensionality declared for `name` in `func`'s declaration table, read
/// from the `BasicType` entry its `VarDecl`'s `type` attribute resolves to
/// (§6: "a `dimensions` count on basic-type entries").
fn declared_dimensions(program: &Program, func: Option<NodeId>, name: &str) -> usize {
    let Some(decl) = program.lookup_decl(func, name) else {
        return 0;
    };
    let Some(type_key) = program.doc.get(decl).attr("type") else {
        return 0;
    };
    let Some(type_node) = program.types.lookup(type_key) else {
        return 0;
    };
    program
        .doc
        .get(type_node)
        .attr("dimensions")
        .and_then(|d| d.parse().ok())
        .unwrap_or(0)
}

/// Next unused `{base}_extracted_{n}` suffix, scanning existing function
/// names rather than keeping process-wide counter state (§4.E: "the engine
/// must not rely on any process-wide mutable state").
fn next_extraction_name(program: &Program, base: &str) -> String {
    let prefix = format!("{base}_extracted_");
    let max = program
        .function_definitions()
        .iter()
        .filter_map(|&func| ops::find_child(&program.doc, func, NodeKind::Name))
        .filter_map(|name_node| program.doc.get(name_node).text.clone())
        .filter_map(|name| name.strip_prefix(&prefix).and_then(|s| s.parse::<u32>().ok()))
        .max()
        .unwrap_or(0);
    format!("{prefix}{}", max + 1)
}

/// Rename a cloned function definition: its own `Name` text, its local
/// symbol table entry (if present), and the global symbol table entry
/// pointing at it (if present) — §4.D.2 step 1.
fn rename_clone(program: &mut Program, clone: NodeId, old_name: &str, new_name: &str) {
    if let Some(name_node) = ops::find_child(&program.doc, clone, NodeKind::Name) {
        program.doc.get_mut(name_node).text = Some(new_name.to_string());
    }
    if let Some(sym_table) = ops::find_child(&program.doc, clone, NodeKind::SymbolTable) {
        for &entry in program.doc.children(sym_table).to_vec().iter() {
            if program.doc.get(entry).attr("key") == Some(old_name) {
                program.doc.get_mut(entry).set_attr("key", new_name);
            }
        }
    }
    if let Some(id) = program.global_symbols.remove(old_name) {
        program.doc.get_mut(id).set_attr("key", new_name);
        let _ = program.global_symbols.add(new_name, id);
    }
}

impl Transformation for LoopExtract {
    fn kind_name(&self) -> &'static str {
        "loop-extract"
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
        match self.try_analyze(program) {
            Ok(()) => true,
            Err(err) => {
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
        spawned: &mut Vec<Box<dyn Transformation>>,
    ) -> EngineResult<()> {
        let call_stmt = self.call_stmt.expect("analyze must run before transform");
        let call = self.call.expect("analyze must run before transform");
        let callee = self.callee.expect("analyze must run before transform");
        let target_do = self.target_do.expect("analyze must run before transform");
        let caller = ops::find_parent(&program.doc, self.pragma, NodeKind::FunctionDefinition);

        // Step 1: clone the callee under a fresh name and type hash.
        let old_name = ops::find_child(&program.doc, callee, NodeKind::Name)
            .and_then(|n| program.doc.get(n).text.clone())
            .expect("callee has a Name child (ensure_function_shape)");
        let new_name = next_extraction_name(program, &old_name);
        let hash = program.types.generate_function_type_hash();
        let clone_func = ops::clone(&mut program.doc, callee);
        rename_clone(program, clone_func, &old_name, &new_name);
        if let Some(type_node) = ops::find_child(&program.doc, clone_func, NodeKind::FunctionType) {
            program.types.add(hash, type_node).map_err(EngineError::from)?;
        }
        ops::append(&mut program.doc, program.root, clone_func).map_err(EngineError::from)?;

        // Step 2: hoist the matching loop's body into the clone, in place.
        let clone_target_do = clone_target_do(&program.doc, clone_func, &self.range)
            .expect("clone mirrors the analyzed callee 1:1");
        ops::extract_body(&mut program.doc, clone_target_do).map_err(EngineError::from)?;
        ops::delete(&mut program.doc, clone_target_do).map_err(EngineError::from)?;

        // Step 3: wrap the call in a new do-statement with the extracted range.
        let wrapped_do = program.doc.insert_new(
            IrNode::new(NodeKind::DoStatement)
                .with_attr("var", self.range.induction_var.clone())
                .with_attr("lower", self.range.lower.clone())
                .with_attr("upper", self.range.upper.clone())
                .with_attr("step", self.range.step.clone()),
        );
        let wrapped_body = program.doc.insert_new(IrNode::new(NodeKind::Body));
        ops::append(&mut program.doc, wrapped_do, wrapped_body).map_err(EngineError::from)?;

        if let Some(func) = caller {
            inject_range_decls(program, func, &self.range, callee);
        }

        ops::delete(&mut program.doc, call).map_err(EngineError::from)?;
        program.doc.get_mut(call).set_attr("target", new_name.clone());
        ops::append(&mut program.doc, wrapped_body, call).map_err(EngineError::from)?;

        // Attach the wrapped loop next to the pragma now, so step 5 can use
        // it as an insertion anchor (it needs a parent to position against).
        ops::insert_after(&mut program.doc, self.pragma, wrapped_do).map_err(EngineError::from)?;

        // Step 4: retarget and adapt mappings.
        if let Some(mapping) = self.mapping.clone() {
            let args = call_arguments(&program.doc, call);
            let mapped_dims = mapping.mapped_dimensions();
            for pair in &mapping.mapped {
                let arg_id = args
                    .iter()
                    .copied()
                    .find(|&a| arg_name(&program.doc, a).as_deref() == Some(pair.name.as_str()))
                    .ok_or_else(|| EngineError::mapping_mismatch(self.line, &pair.name))?;
                let dims = declared_dimensions(program, caller, &pair.name);
                if dims < mapped_dims {
                    return Err(EngineError::illegal_mapping(
                        "loop-extract",
                        self.line,
                        &pair.name,
                    ));
                }
                promote_to_array_ref(program, arg_id, &pair.name, self.line, &mapping)?;
            }
            demote_callee_params(program, clone_func, &mapping, self.line);
        }

        // Step 5: optional accelerator wrap.
        if self.parallel {
            let start = program
                .doc
                .insert_new(IrNode::new(NodeKind::Pragma).with_text("acc parallel"));
            let end = program
                .doc
                .insert_new(IrNode::new(NodeKind::Pragma).with_text("acc end parallel"));
            ops::insert_before(&mut program.doc, wrapped_do, start).map_err(EngineError::from)?;
            ops::insert_after(&mut program.doc, wrapped_do, end).map_err(EngineError::from)?;
            if let Some(accel) = &self.accelerator {
                let accel_pragma = program
                    .doc
                    .insert_new(IrNode::new(NodeKind::Pragma).with_text(format!("acc {accel}")));
                ops::insert_after(&mut program.doc, start, accel_pragma).map_err(EngineError::from)?;
            }
        } else if let Some(accel) = &self.accelerator {
            let accel_pragma = program
                .doc
                .insert_new(IrNode::new(NodeKind::Pragma).with_text(format!("acc {accel}")));
            ops::insert_before(&mut program.doc, wrapped_do, accel_pragma).map_err(EngineError::from)?;
        }

        ops::delete(&mut program.doc, call_stmt).map_err(EngineError::from)?;
        ops::delete(&mut program.doc, self.pragma).map_err(EngineError::from)?;

        // Step 6: chain a loop-fusion transformation on the wrapped loop.
        if let Some(group) = self.fusion_group.clone() {
            let fusion_pragma = program.doc.insert_new(IrNode::new(NodeKind::Pragma));
            ops::insert_before(&mut program.doc, wrapped_do, fusion_pragma).map_err(EngineError::from)?;
            spawned.push(Box::new(LoopFusion::new(fusion_pragma, self.line, Some(group))));
        }

        let _ = target_do;
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl LoopExtract {
    fn try_analyze(&mut self, program: &mut Program) -> EngineResult<()> {
        let call_stmt = next_sibling(&program.doc, self.pragma)
            .filter(|&id| program.doc.kind(id) == NodeKind::ExprStatement)
            .ok_or_else(|| EngineError::no_call(self.line))?;
        let call = ops::find_child(&program.doc, call_stmt, NodeKind::FunctionCall)
            .ok_or_else(|| EngineError::no_call(self.line))?;
        let callee_name = ops::find_child(&program.doc, call, NodeKind::Name)
            .and_then(|n| program.doc.get(n).text.clone())
            .ok_or_else(|| EngineError::no_call(self.line))?;
        let callee = program
            .find_function(&callee_name)
            .ok_or_else(|| EngineError::unknown_callee(self.line, &callee_name))?;
        let target_do = matching_do_statement(&program.doc, callee, &self.range)
            .ok_or_else(|| EngineError::no_matching_loop(self.line))?;

        if let Some(mapping) = &self.mapping {
            let args = call_arguments(&program.doc, call);
            let names: Vec<Option<String>> = args.iter().map(|&a| arg_name(&program.doc, a)).collect();
            for pair in &mapping.mapped {
                if !names.iter().any(|n| n.as_deref() == Some(pair.name.as_str())) {
                    return Err(EngineError::mapping_mismatch(self.line, &pair.name));
                }
            }
        }

        self.call_stmt = Some(call_stmt);
        self.call = Some(call);
        self.callee = Some(callee);
        self.target_do = Some(target_do);
        Ok(())
    }
}

fn clone_target_do(doc: &Document, clone_func: NodeId, range: &Range) -> Option<NodeId> {
    matching_do_statement(doc, clone_func, range)
}

/// Inject the induction variable and any variable-valued bound/step into the
/// caller's tables, copied from the callee, if not already present (§4.D.2
/// step 3).
fn inject_range_decls(program: &mut Program, caller: NodeId, range: &Range, callee: NodeId) {
    for name in [&range.induction_var, &range.lower, &range.upper, &range.step] {
        if program.lookup_decl(Some(caller), name).is_some() {
            continue;
        }
        let Some(decl) = program.lookup_decl(Some(callee), name) else {
            continue;
        };
        let copied = program.doc.get(decl).clone();
        let mut fresh = IrNode::new(copied.kind);
        for (k, v) in copied.attrs() {
            fresh.set_attr(k, v);
        }
        let fresh_id = program.doc.insert_new(fresh);
        let _ = program.ensure_local_decl(caller, name, fresh_id);
    }
}

/// Promote a scalar call argument to an `ArrayRef` indexed by the mapping's
/// variables (§4.D.2 step 4, first bullet). A mapped argument that is
/// already an `ArrayRef` is rejected rather than silently left alone (§9).
fn promote_to_array_ref(
    program: &mut Program,
    arg_id: NodeId,
    name: &str,
    line: u32,
    mapping: &Mapping,
) -> EngineResult<()> {
    if program.doc.kind(arg_id) == NodeKind::ArrayRef {
        return Err(EngineError::unsupported_mapped_array_ref(line, name));
    }
    for index_var in &mapping.mapping {
        let index_node = program
            .doc
            .insert_new(IrNode::new(NodeKind::VarRef).with_attr("name", index_var.name.clone()));
        let idx_wrapper = program.doc.insert_new(IrNode::new(NodeKind::ArrayIndex));
        ops::append(&mut program.doc, idx_wrapper, index_node)?;
        ops::append(&mut program.doc, arg_id, idx_wrapper)?;
    }
    program.doc.get_mut(arg_id).kind = NodeKind::ArrayRef;
    Ok(())
}

/// Demote every `ArrayRef` in the clone's body whose base is a mapped
/// parameter and whose leading indices are exactly the mapping vars, in
/// order, to a plain `Var` reference (§4.D.2 step 4, second bullet), and
/// reduce the clone's own declarations for those parameters accordingly
/// (third bullet).
fn demote_callee_params(program: &mut Program, clone_func: NodeId, mapping: &Mapping, line: u32) {
    let mapped_names: Vec<&str> = mapping.mapped.iter().map(|p| p.name.as_str()).collect();
    let index_names: Vec<&str> = mapping.mapping.iter().map(|p| p.name.as_str()).collect();

    let body = match ops::find_child(&program.doc, clone_func, NodeKind::Body) {
        Some(b) => b,
        None => return,
    };
    demote_in_subtree(program, body, &mapped_names, &index_names);

    if let Some(decl_table) = ops::find_child(&program.doc, clone_func, NodeKind::DeclTable) {
        for &entry in program.doc.children(decl_table).to_vec().iter() {
            let Some(key) = program.doc.get(entry).attr("key").map(str::to_owned) else {
                continue;
            };
            if !mapped_names.contains(&key.as_str()) {
                continue;
            }
            let dims = program
                .doc
                .get(entry)
                .attr("type")
                .and_then(|t| program.types.lookup(t))
                .and_then(|t| program.doc.get(t).attr("dimensions")?.parse::<usize>().ok())
                .unwrap_or(0);
            if dims == index_names.len() {
                if let Some(type_key) = program.doc.get(entry).attr("type") {
                    if let Some(type_node) = program.types.lookup(type_key) {
                        if let Some(elem_type) = program.doc.get(type_node).attr("ref").map(str::to_owned) {
                            program.doc.get_mut(entry).set_attr("type", elem_type);
                        }
                    }
                }
            } else {
                program
                    .diagnostics
                    .warning(
                        format!(
                            "reduced-rank type synthesis for {key:?} is not implemented; declaration left unchanged"
                        ),
                        trellis_core::Span::line(line),
                    )
                    .emit();
            }
        }
    }
}

fn demote_in_subtree(program: &mut Program, root: NodeId, mapped_names: &[&str], index_names: &[&str]) {
    let children = program.doc.children(root).to_vec();
    for child in children {
        if program.doc.kind(child) == NodeKind::ArrayRef && matches_mapped_indexing(program, child, mapped_names, index_names)
        {
            let base = program.doc.get(child).attr("name").map(str::to_owned);
            for idx in program.doc.children(child).to_vec() {
                let _ = ops::delete(&mut program.doc, idx);
            }
            program.doc.get_mut(child).kind = NodeKind::Var;
            if let Some(name) = base {
                program.doc.get_mut(child).set_attr("name", name);
            }
        } else {
            demote_in_subtree(program, child, mapped_names, index_names);
        }
    }
}

fn matches_mapped_indexing(program: &Program, array_ref: NodeId, mapped_names: &[&str], index_names: &[&str]) -> bool {
    let Some(base) = program.doc.get(array_ref).attr("name") else {
        return false;
    };
    if !mapped_names.contains(&base) {
        return false;
    }
    let indices: Vec<String> = program
        .doc
        .children(array_ref)
        .iter()
        .filter_map(|&idx| ops::find_child(&program.doc, idx, NodeKind::VarRef))
        .filter_map(|v| program.doc.get(v).attr("name").map(str::to_owned))
        .collect();
    indices.len() >= index_names.len()
        && indices
            .iter()
            .zip(index_names)
            .all(|(a, b)| a.as_str() == *b)
}
