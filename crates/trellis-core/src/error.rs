//! Error kinds raised by the IR tree and table primitives.

use crate::ir::NodeId;

/// Errors raised while mutating or querying the IR tree.
///
/// These correspond to the *Internal* error kind of the engine's error
/// handling design: invariant violations that should never occur during
/// normal operation, and a *DuplicateType* variant for the one table
/// invariant (key uniqueness) that a caller can legitimately trip.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoreError {
    /// A table `add` collided with an existing key.
    #[error("duplicate key {key:?} in {table}")]
    DuplicateType { table: &'static str, key: String },

    /// An insertion primitive was given a node that already has a parent.
    #[error("internal error: node {0} is already attached to a parent; double-insertion is a programming error")]
    AlreadyAttached(NodeId),

    /// A primitive was asked to operate on a node with no parent where one
    /// is required (e.g. `insertBefore` on a document root).
    #[error("internal error: node {0} has no parent")]
    NoParent(NodeId),

    /// A primitive was given a `NodeId` that isn't present in the document's
    /// arena (never produced by this crate's own APIs; only possible if a
    /// caller fabricates or mixes up ids across documents).
    #[error("internal error: node {0} not found in document")]
    DanglingNodeId(NodeId),

    /// A structural invariant required by §3 was violated (e.g. a
    /// `FunctionDefinition` missing its `Name` or `Body`).
    #[error("internal error: {0}")]
    InvariantViolation(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
