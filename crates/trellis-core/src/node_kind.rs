//! The tag carried by every [`crate::ir::IrNode`].

/// Kind of an IR node.
///
/// Mirrors the element shapes exchanged with the front-end/back-end
/// (`FfunctionDefinition`, `FdoStatement`, `FarrayRef`, ...): each variant here
/// corresponds to one such element name, without the front-end's `F`-prefix
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum NodeKind {
    Program,
    FunctionDefinition,
    Body,
    Pragma,
    DoStatement,
    ExprStatement,
    FunctionCall,
    VarRef,
    ArrayRef,
    ArrayIndex,
    Var,
    Name,
    VarDecl,
    ArgumentsTable,
    Params,
    SymbolTable,
    DeclTable,
    TypeTable,
    BasicType,
    FunctionType,
    Id,
}

impl NodeKind {
    /// Whether this kind is one of the three table wrappers (§3: "ordered
    /// mappings from string key to node").
    pub fn is_table(self) -> bool {
        matches!(
            self,
            NodeKind::SymbolTable | NodeKind::DeclTable | NodeKind::TypeTable
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
