//! The engine's top-level error, composing each layer's own error type
//! (§7: "a top-level driver error type wraps each layer's error variant
//! with `#[from]` conversions so that `?` composes across layer boundaries").

use trellis_core::CoreError;

use crate::config::ConfigurationError;
use crate::directive::ParseError;

/// One of the five error kinds of §7, each still distinguishable by variant
/// so callers can apply the right policy (discard-and-continue vs. fatal).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("malformed directive: {0}")]
    Parse(#[from] ParseError),

    /// Transformation prerequisites unmet (no call, no matching loop, an
    /// unresolved callee, or a mapping referencing an unknown argument).
    #[error("{kind} on line {line}: {reason}")]
    Analyze {
        kind: &'static str,
        line: u32,
        reason: String,
    },

    /// Preconditions held at analyze time but the transformation cannot be
    /// carried out (dimensionality shortfall, unbalanced block, unresolvable
    /// type reference). Fatal: the pipeline aborts (§7).
    #[error("{kind} on line {line}: {reason}")]
    IllegalTransformation {
        kind: &'static str,
        line: u32,
        reason: String,
    },

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("internal error: {0}")]
    Core(#[from] CoreError),
}

impl EngineError {
    pub fn illegal_mapping(kind: &'static str, line: u32, argument: &str) -> Self {
        Self::IllegalTransformation {
            kind,
            line,
            reason: format!(
                "argument {argument:?} has insufficient dimensionality for the supplied mapping"
            ),
        }
    }

    /// A mapped argument is already an `ArrayRef` (§9: the source leaves this
    /// case unimplemented; this spec fails it explicitly rather than
    /// silently no-opping).
    pub fn unsupported_mapped_array_ref(line: u32, argument: &str) -> Self {
        Self::IllegalTransformation {
            kind: "loop-extract",
            line,
            reason: format!("argument {argument:?} is already an ArrayRef; mapping it is not supported"),
        }
    }

    pub fn unbalanced_block(line: u32, detail: impl Into<String>) -> Self {
        Self::IllegalTransformation {
            kind: "block-transform",
            line,
            reason: detail.into(),
        }
    }

    pub fn no_call(line: u32) -> Self {
        Self::Analyze {
            kind: "loop-extract",
            line,
            reason: "pragma is not followed by a function call".to_string(),
        }
    }

    pub fn unknown_callee(line: u32, name: &str) -> Self {
        Self::Analyze {
            kind: "loop-extract",
            line,
            reason: format!("callee {name:?} has no definition in this program"),
        }
    }

    pub fn no_matching_loop(line: u32) -> Self {
        Self::Analyze {
            kind: "loop-extract",
            line,
            reason: "callee has no do-statement matching the supplied range".to_string(),
        }
    }

    pub fn mapping_mismatch(line: u32, name: &str) -> Self {
        Self::Analyze {
            kind: "loop-extract",
            line,
            reason: format!("mapping references unknown argument {name:?}"),
        }
    }

    /// True when this error should discard the offending transformation and
    /// let the pipeline continue, rather than abort it (§7).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::Parse(_) | EngineError::Analyze { .. })
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
