//! The errors/warnings surface exposed on a program document (§6).

use std::fmt;

/// Where a diagnostic points to: a single source line, a contiguous range of
/// lines, or nowhere (a diagnostic raised before any pragma/node was
/// resolved — see the filtering rule on [`DiagnosticBuilder::emit`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    None,
    Line(u32),
    Lines(u32, u32),
}

impl Span {
    pub fn line(line: u32) -> Self {
        Span::Line(line)
    }

    pub fn lines(start: u32, end: u32) -> Self {
        if start == end {
            Span::Line(start)
        } else {
            Span::Lines(start, end)
        }
    }

    fn is_null(self) -> bool {
        matches!(self, Span::None)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Span::None => write!(f, "<unknown location>"),
            Span::Line(l) => write!(f, "line {l}"),
            Span::Lines(a, b) => write!(f, "lines {a}-{b}"),
        }
    }
}

/// Severity of a recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
struct DiagnosticMessage {
    severity: Severity,
    message: String,
    span: Span,
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level}: {} ({})", self.message, self.span)
    }
}

/// Collection of diagnostic messages accumulated while running the pipeline.
///
/// Two ordered lists conceptually (errors, warnings), backed by one vector
/// so document order between the two kinds is preserved for rendering.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
}

/// Builder returned by [`Diagnostics::error`]/[`Diagnostics::warning`].
///
/// Empty messages, a `Span::None` location, and (by construction) any
/// diagnostic built from a default-constructed directive placeholder are
/// silently dropped on `.emit()` rather than recorded (§6).
#[must_use = "diagnostic not recorded until .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    message: DiagnosticMessage,
}

impl<'a> DiagnosticBuilder<'a> {
    pub fn emit(self) {
        if self.message.message.trim().is_empty() || self.message.span.is_null() {
            return;
        }
        self.diagnostics.messages.push(self.message);
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, message: impl Into<String>, span: Span) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            message: DiagnosticMessage {
                severity: Severity::Error,
                message: message.into(),
                span,
            },
        }
    }

    pub fn warning(&mut self, message: impl Into<String>, span: Span) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            message: DiagnosticMessage {
                severity: Severity::Warning,
                message: message.into(),
                span,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity == Severity::Warning)
            .count()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Severity, &str, Span)> {
        self.messages
            .iter()
            .map(|m| (m.severity, m.message.as_str(), m.span))
    }

    /// Render as plain text, one diagnostic per line — used by the CLI when
    /// printing a fatal failure's diagnostic list (§7).
    pub fn render_plain(&self) -> String {
        use std::fmt::Write;
        let mut out = String::new();
        for (i, m) in self.messages.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = write!(out, "{m}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_message_is_never_recorded() {
        let mut diags = Diagnostics::new();
        diags.error("", Span::line(3)).emit();
        diags.error("   ", Span::line(3)).emit();
        assert!(diags.is_empty());
    }

    #[test]
    fn null_span_is_never_recorded() {
        let mut diags = Diagnostics::new();
        diags.error("oops", Span::None).emit();
        assert!(diags.is_empty());
    }

    #[test]
    fn well_formed_diagnostic_is_recorded() {
        let mut diags = Diagnostics::new();
        diags.error("bad mapping", Span::line(10)).emit();
        diags.warning("unimplemented synthesis", Span::line(11)).emit();
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 1);
        assert!(diags.has_errors());
        assert!(diags.has_warnings());
    }
}
