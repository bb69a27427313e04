//! The diagnostic sink: an append-only recipient of messages with source
//! ranges and severity (spec §5: "Diagnostic sinks are append-only"; spec §6
//! enumerates the rule set this crate's `rule` field draws from).

use std::fmt;

use crate::file::File;
use crate::text_size::TextRange;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Severity {
    Error,
    Warning,
    /// An "unused code" finding (dead code, unused symbol, unused import):
    /// distinct from `Warning` so a host can triage it separately, per
    /// spec §6's `severity` enumeration.
    Unused,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Unused => "unused",
            Severity::Info => "info",
        };
        f.write_str(label)
    }
}

/// One reported finding, per spec §6's output contract.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub range: TextRange,
    pub rule: Option<&'static str>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>, range: TextRange) -> Self {
        Self {
            severity,
            message: message.into(),
            range,
            rule: None,
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: &'static str) -> Self {
        self.rule = Some(rule);
        self
    }
}

/// An append-only recipient of diagnostics for one file.
///
/// A plain `Vec`-backed implementation is provided below for the CLI and for
/// tests; a language-service host is free to supply its own (e.g. one that
/// also updates a "squiggly underline" overlay as diagnostics arrive).
pub trait DiagnosticSink {
    fn push(&mut self, diagnostic: Diagnostic);
}

#[derive(Debug, Default, Clone)]
pub struct VecDiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl VecDiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for VecDiagnosticSink {
    fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Renders a diagnostic as `path:line:column: severity: message`, matching
/// the line/column conversion spec §7 requires.
pub fn render(file: &File, diagnostic: &Diagnostic) -> String {
    let start = file.line_index().line_column(diagnostic.range.start());
    let rule_suffix = diagnostic
        .rule
        .map(|rule| format!(" [{rule}]"))
        .unwrap_or_default();
    format!(
        "{}:{}:{}: {}: {}{}",
        file.path(),
        start.line,
        start.column,
        diagnostic.severity,
        diagnostic.message,
        rule_suffix,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_size::TextSize;

    #[test]
    fn render_includes_line_and_column() {
        let file = File::new("m.py", "x = 1\ny = 2\n");
        let diagnostic = Diagnostic::new(
            Severity::Error,
            "incompatible assignment",
            TextRange::new(TextSize::new(6), TextSize::new(7)),
        );
        assert_eq!(render(&file, &diagnostic), "m.py:2:1: error: incompatible assignment");
    }

    #[test]
    fn vec_sink_preserves_insertion_order() {
        let mut sink = VecDiagnosticSink::new();
        sink.push(Diagnostic::new(Severity::Warning, "a", TextRange::empty(TextSize::new(0))));
        sink.push(Diagnostic::new(Severity::Error, "b", TextRange::empty(TextSize::new(1))));
        let messages: Vec<_> = sink.diagnostics().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b"]);
    }
}
