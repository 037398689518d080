//! # Diagnostic Module
//!
//! Accumulating diagnostics for the EDL compiler.
//!
//! Every stage of the pipeline (document validation, dependency analysis,
//! code generation) reports problems by pushing [`Diagnostic`] values into a
//! shared [`Diagnostics`] collector instead of failing on the first error.
//! A single compile therefore surfaces every fixable issue at once.
//!
//! Two severities matter to callers:
//! - **Error** — the document is wrong; `success` will be false.
//! - **Warning** — suspicious but compilable (e.g. an unknown capability key
//!   that is probably a typo).

use serde::Serialize;
use std::fmt;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A problem that makes the compile unsuccessful
    Error,
    /// A suspicious construct that does not block compilation
    Warning,
}

impl Severity {
    /// Returns the display name of this severity level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Optional help suggestion (e.g. "did you mean 'fetchTicker'?")
    pub help: Option<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            help: None,
        }
    }

    /// Creates a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            help: None,
        }
    }

    /// Attaches a help suggestion.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(help) = &self.help {
            write!(f, " ({})", help)?;
        }
        Ok(())
    }
}

/// Ordered collection of diagnostics produced by one compile call.
///
/// Diagnostics compose by concatenation: nested validators build their own
/// collector and the caller merges it with [`Diagnostics::extend`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error message.
    pub fn error(&mut self, message: impl Into<String>) {
        self.items.push(Diagnostic::error(message));
    }

    /// Records a warning message.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.items.push(Diagnostic::warning(message));
    }

    /// Records an already-built diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Appends every diagnostic from another collector.
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// True when no error-severity diagnostic has been recorded.
    /// Warnings never make a compile unsuccessful.
    pub fn success(&self) -> bool {
        !self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Error messages only, in recording order.
    pub fn errors(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.message.clone())
            .collect()
    }

    /// Warning messages only, in recording order.
    pub fn warnings(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| d.message.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_ignores_warnings() {
        let mut diags = Diagnostics::new();
        diags.warning("unknown capability key 'fetchTickr'");
        assert!(diags.success());
        diags.error("exchange id is required");
        assert!(!diags.success());
    }

    #[test]
    fn extend_concatenates_in_order() {
        let mut outer = Diagnostics::new();
        outer.error("first");
        let mut inner = Diagnostics::new();
        inner.error("second");
        inner.warning("third");
        outer.extend(inner);
        assert_eq!(outer.errors(), vec!["first", "second"]);
        assert_eq!(outer.warnings(), vec!["third"]);
    }

    #[test]
    fn display_includes_help() {
        let d = Diagnostic::warning("unknown capability key 'fetchTickr'")
            .with_help("did you mean 'fetchTicker'?");
        assert_eq!(
            d.to_string(),
            "warning: unknown capability key 'fetchTickr' (did you mean 'fetchTicker'?)"
        );
    }
}
