//! Arena-backed IR tree, ordered tables, and the diagnostics surface shared
//! by the directive parser and transformation passes.
//!
//! - [`ir`]: the [`ir::Document`] arena, [`ir::NodeId`] identity, and the
//!   tree manipulation primitives in [`ir::ops`].
//! - [`node_kind`]: the closed set of node kinds making up an IR document.
//! - [`tables`]: ordered, string-keyed `TypeTable`/`SymbolTable`/`DeclTable`.
//! - [`diagnostics`]: the errors/warnings surface, with its silent-drop
//!   filtering rule for empty messages and unlocated spans.
//! - [`program`]: [`program::Program`], tying a document to its global
//!   tables and diagnostics.
//! - [`raw`]: the JSON deserialization boundary, resolving a 1:1 tree into a
//!   [`program::Program`].
//! - [`invariants`]: structural checks on tree shape, panicking (the
//!   *Internal* error kind) when a front-end guarantee has been violated.
//! - [`error`]: [`error::CoreError`]/[`error::CoreResult`].

pub mod diagnostics;
pub mod error;
pub mod invariants;
pub mod ir;
pub mod node_kind;
pub mod program;
pub mod raw;
pub mod tables;

pub use diagnostics::{Diagnostics, Severity, Span};
pub use error::{CoreError, CoreResult};
pub use ir::{Document, IrNode, IterationRange, NodeId};
pub use node_kind::NodeKind;
pub use program::Program;
pub use raw::RawNode;
pub use tables::{DeclTable, SymbolTable, Table, TypeTable};
