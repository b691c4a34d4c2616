//! The top-level facade: a document plus its global tables and diagnostics.

use crate::diagnostics::Diagnostics;
use crate::error::{CoreError, CoreResult};
use crate::ir::ops::find_child;
use crate::ir::{Document, NodeId};
use crate::node_kind::NodeKind;
use crate::tables::{DeclTable, SymbolTable, TypeTable};

/// A compilation unit: the IR tree plus its global tables and the
/// errors/warnings surface (§6).
///
/// Function-local `SymbolTable`/`DeclTable` nodes (§3: "optional but, when
/// present, mutually consistent") stay plain IR subtrees — they're small, so
/// [`lookup_symbol`] resolves them by scanning tree children rather than
/// building a second parallel index for every function.
pub struct Program {
    pub doc: Document,
    pub root: NodeId,
    pub types: TypeTable,
    pub global_symbols: SymbolTable,
    pub global_decls: DeclTable,
    pub diagnostics: Diagnostics,
}

impl Program {
    pub fn new(doc: Document, root: NodeId) -> Self {
        Self {
            doc,
            root,
            types: TypeTable::new(),
            global_symbols: SymbolTable::new(),
            global_decls: DeclTable::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Resolve a name to an `Id` node, function-local table first, then the
    /// global symbol table (§3 reference closure).
    pub fn lookup_symbol(&self, enclosing_func: Option<NodeId>, name: &str) -> Option<NodeId> {
        if let Some(func) = enclosing_func
            && let Some(table) = find_child(&self.doc, func, NodeKind::SymbolTable)
            && let Some(id) = find_entry_by_key(&self.doc, table, name)
        {
            return Some(id);
        }
        self.global_symbols.lookup(name)
    }

    /// Resolve a name to a `VarDecl` node, function-local table first, then
    /// the global declaration table.
    pub fn lookup_decl(&self, enclosing_func: Option<NodeId>, name: &str) -> Option<NodeId> {
        if let Some(func) = enclosing_func
            && let Some(table) = find_child(&self.doc, func, NodeKind::DeclTable)
            && let Some(id) = find_entry_by_key(&self.doc, table, name)
        {
            return Some(id);
        }
        self.global_decls.lookup(name)
    }

    /// Every function definition reachable from the root, in document order.
    pub fn function_definitions(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        collect_kind(&self.doc, self.root, NodeKind::FunctionDefinition, &mut out);
        out
    }

    /// Find a function definition by its `Name` text.
    pub fn find_function(&self, name: &str) -> Option<NodeId> {
        self.function_definitions().into_iter().find(|&func| {
            find_child(&self.doc, func, NodeKind::Name)
                .and_then(|n| self.doc.get(n).text.as_deref())
                == Some(name)
        })
    }

    /// Insert a declaration (and symbol, if `symbol` is given) for `name`
    /// into `func`'s local tables, if not already present — used by loop
    /// extraction to inject the induction variable and any variable-valued
    /// bound into the caller (§4.D.2 step 3).
    pub fn ensure_local_decl(
        &mut self,
        func: NodeId,
        name: &str,
        decl_node: NodeId,
    ) -> CoreResult<()> {
        let table = find_child(&self.doc, func, NodeKind::DeclTable)
            .ok_or_else(|| CoreError::InvariantViolation(format!("{func} has no DeclTable")))?;
        if find_entry_by_key(&self.doc, table, name).is_some() {
            return Ok(());
        }
        crate::ir::ops::append(&mut self.doc, table, decl_node)
    }
}

fn find_entry_by_key(doc: &Document, table: NodeId, key: &str) -> Option<NodeId> {
    doc.children(table)
        .iter()
        .copied()
        .find(|&entry| doc.get(entry).attr("key") == Some(key))
}

fn collect_kind(doc: &Document, id: NodeId, kind: NodeKind, out: &mut Vec<NodeId>) {
    for &child in doc.children(id) {
        if doc.kind(child) == kind {
            out.push(child);
        }
        collect_kind(doc, child, kind, out);
    }
}
