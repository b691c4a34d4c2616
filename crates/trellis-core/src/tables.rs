//! Ordered, string-keyed tables with O(1) lookup and key uniqueness (§3).

use indexmap::IndexMap;

use crate::error::{CoreError, CoreResult};
use crate::ir::NodeId;

/// An ordered mapping from string key to node, used for `TypeTable`,
/// `SymbolTable`, and `DeclTable` alike. Insertion order is preserved so
/// that re-serializing an untouched table round-trips exactly (§10).
#[derive(Debug, Clone, Default)]
pub struct Table {
    label: &'static str,
    entries: IndexMap<String, NodeId>,
}

impl Table {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: IndexMap::new(),
        }
    }

    /// Insert a new entry. Fails with `DuplicateType` if the key already
    /// exists — every table shares this invariant, not just `TypeTable`.
    pub fn add(&mut self, key: impl Into<String>, node: NodeId) -> CoreResult<()> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(CoreError::DuplicateType {
                table: self.label,
                key,
            });
        }
        self.entries.insert(key, node);
        Ok(())
    }

    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.entries.get(key).copied()
    }

    pub fn remove(&mut self, key: &str) -> Option<NodeId> {
        self.entries.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.entries.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// The type table: function and basic types keyed by a generated hash.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    table: Table,
    next_hash_seq: u32,
}

impl TypeTable {
    pub fn new() -> Self {
        Self {
            table: Table::new("TypeTable"),
            next_hash_seq: 0,
        }
    }

    pub fn add(&mut self, key: impl Into<String>, node: NodeId) -> CoreResult<()> {
        self.table.add(key, node)
    }

    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.table.lookup(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<NodeId> {
        self.table.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.table.contains(key)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.table.iter()
    }

    /// Generate a fresh hash key, unique within this table.
    ///
    /// Cloning a function must call this *before* inserting the clone's
    /// function type, so that any transformation applied afterwards in the
    /// same pipeline run observes a consistent table (§5).
    pub fn generate_function_type_hash(&mut self) -> String {
        loop {
            let seq = self.next_hash_seq;
            self.next_hash_seq = self.next_hash_seq.wrapping_add(1);
            let hash = crc32fast::hash(format!("fn_type_{seq}").as_bytes());
            let key = format!("{hash:08x}");
            if !self.table.contains(&key) {
                return key;
            }
        }
    }
}

/// The (function-local or global) symbol table: names resolve to `Id` nodes.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable(Table);

impl SymbolTable {
    pub fn new() -> Self {
        Self(Table::new("SymbolTable"))
    }

    pub fn add(&mut self, key: impl Into<String>, node: NodeId) -> CoreResult<()> {
        self.0.add(key, node)
    }

    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.0.lookup(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<NodeId> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.0.iter()
    }
}

/// The (function-local or global) declaration table: names resolve to
/// `VarDecl` nodes.
#[derive(Debug, Clone, Default)]
pub struct DeclTable(Table);

impl DeclTable {
    pub fn new() -> Self {
        Self(Table::new("DeclTable"))
    }

    pub fn add(&mut self, key: impl Into<String>, node: NodeId) -> CoreResult<()> {
        self.0.add(key, node)
    }

    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.0.lookup(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<NodeId> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Document, IrNode};
    use crate::node_kind::NodeKind;

    #[test]
    fn add_rejects_duplicate_key() {
        let mut doc = Document::new();
        let a = doc.insert_new(IrNode::new(NodeKind::Id));
        let b = doc.insert_new(IrNode::new(NodeKind::Id));

        let mut table = SymbolTable::new();
        table.add("x", a).unwrap();
        let err = table.add("x", b).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateType { .. }));
    }

    #[test]
    fn generate_function_type_hash_is_unique() {
        let mut types = TypeTable::new();
        let mut doc = Document::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..64 {
            let hash = types.generate_function_type_hash();
            let node = doc.insert_new(IrNode::new(NodeKind::FunctionType));
            types.add(hash.clone(), node).unwrap();
            assert!(seen.insert(hash), "hash collided within the same table");
        }
    }

    #[test]
    fn lookup_roundtrips_through_add() {
        let mut doc = Document::new();
        let id = doc.insert_new(IrNode::new(NodeKind::BasicType));
        let mut types = TypeTable::new();
        types.add("int4", id).unwrap();
        assert_eq!(types.lookup("int4"), Some(id));
        assert_eq!(types.lookup("missing"), None);
    }
}
