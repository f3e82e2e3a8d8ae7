//! Recoverable conversion diagnostics.
//!
//! Nothing in the converter or the transform pass aborts on a single bad node.
//! Instead a [`Diagnostic`] is recorded against the document's source
//! identifier and best-effort line, logged, and processing continues.

use serde::Serialize;
use std::fmt;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// The recoverable condition a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// An event or node kind has no handler and was skipped.
    UnsupportedConstruct,
    /// An expected attribute was missing and defaulted to empty.
    MalformedAttributes,
    /// A pipe table paragraph could not be flattened into rows and cells.
    AmbiguousTableShape,
    /// Two headings normalized to the same identifier.
    DuplicateIdentifier,
    /// The HTML tokenizer gave up; the remainder was passed through raw.
    MalformedMarkup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        kind: DiagnosticKind,
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            source: source.into(),
            line: None,
        }
    }

    pub fn warning(
        kind: DiagnosticKind,
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, kind, message, source)
    }

    pub fn info(kind: DiagnosticKind, message: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(Severity::Info, kind, message, source)
    }

    pub fn with_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
        };
        match self.line {
            Some(line) => write!(f, "{}:{}: {}: {}", self.source, line, severity, self.message),
            None => write!(f, "{}: {}: {}", self.source, severity, self.message),
        }
    }
}

/// Ordered log of diagnostics for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and forward it to the `log` facade.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => log::warn!("{diagnostic}"),
            Severity::Info => log::debug!("{diagnostic}"),
        }
        self.entries.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}
