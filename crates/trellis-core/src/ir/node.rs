//! The node record and its stable identity.

use indexmap::IndexMap;

use crate::node_kind::NodeKind;

/// Stable identity of a node within its owning [`crate::ir::Document`].
///
/// `NodeId`s are never reused within a document's lifetime; comparing two ids
/// is an O(1) integer comparison, the same way `Symbol` compares cheaply in
/// an interner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn from_raw(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single IR node: a kind tag, an ordered child sequence, a string-keyed
/// attribute map, optional text content, and a link to its parent.
///
/// A node with `parent: None` that isn't the document root is *detached* —
/// either freshly cloned or freshly deleted (see [`crate::ir::ops`]).
#[derive(Debug, Clone)]
pub struct IrNode {
    pub kind: NodeKind,
    pub(crate) attrs: IndexMap<String, String>,
    pub text: Option<String>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl IrNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: IndexMap::new(),
            text: None,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(key.into(), value.into());
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        self.attrs.shift_remove(key)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_detached(&self) -> bool {
        self.parent.is_none()
    }
}
