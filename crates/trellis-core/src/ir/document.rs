//! The arena-backed document that owns every node.

use crate::error::{CoreError, CoreResult};
use crate::node_kind::NodeKind;

use super::node::{IrNode, NodeId};

/// Owns every [`IrNode`] created for one compilation unit.
///
/// Tables (`TypeTable`/`SymbolTable`/`DeclTable`) are indices into this
/// ownership, never separate owners — the same non-owning-reference
/// discipline the transformation framework uses for its own node references
/// (§3: "the program document exclusively owns all nodes").
#[derive(Debug, Clone, Default)]
pub struct Document {
    arena: Vec<IrNode>,
    root: Option<NodeId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh, detached node and return its id.
    pub fn insert_new(&mut self, node: IrNode) -> NodeId {
        let id = NodeId::from_raw(self.arena.len() as u32);
        self.arena.push(node);
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Set the document root. Only valid once, on an empty document.
    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn get(&self, id: NodeId) -> &IrNode {
        self.arena
            .get(id.index())
            .unwrap_or_else(|| panic!("{}", CoreError::DanglingNodeId(id)))
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut IrNode {
        self.arena
            .get_mut(id.index())
            .unwrap_or_else(|| panic!("dangling NodeId {id}"))
    }

    pub fn try_get(&self, id: NodeId) -> Option<&IrNode> {
        self.arena.get(id.index())
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.get(id).kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).children()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent()
    }

    /// Deep-clone the subtree rooted at `id`, allocating fresh ids for every
    /// node in the copy. The returned id is detached (no parent) until
    /// inserted somewhere via the primitives in [`super::ops`].
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let source = self.get(id).clone();
        let mut copy = IrNode::new(source.kind);
        copy.attrs = source.attrs;
        copy.text = source.text;

        let new_id = self.insert_new(copy);

        let child_copies: Vec<NodeId> = source
            .children
            .iter()
            .map(|&child| self.clone_subtree(child))
            .collect();

        for &child in &child_copies {
            self.get_mut(child).parent = Some(new_id);
        }
        self.get_mut(new_id).children = child_copies;

        new_id
    }

    /// Panic-free attach: used only by primitives in [`super::ops`], which
    /// enforce the double-insertion guard before calling this.
    pub(crate) fn attach(&mut self, id: NodeId, parent: NodeId) {
        self.get_mut(id).parent = Some(parent);
    }

    pub(crate) fn detach(&mut self, id: NodeId) {
        self.get_mut(id).parent = None;
    }

    pub(crate) fn ensure_detached(&self, id: NodeId) -> CoreResult<()> {
        if self.get(id).is_detached() {
            Ok(())
        } else {
            Err(CoreError::AlreadyAttached(id))
        }
    }
}
