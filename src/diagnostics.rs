//! Per-element conversion reports.
//!
//! Failures that do not abort a conversion pass are collected here and
//! mirrored to `tracing` as warnings.

use std::fmt;

use tracing::warn;

use crate::document::ElementKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// Why an element ended up without a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationFailure {
    /// The host's own boundary could not be resolved.
    GeometryUnresolved,
    /// The boundary was found but inserts that should become openings were not.
    OpeningsUnresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    LocationNotFound(LocationFailure),
    ConversionFailed,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::LocationNotFound(LocationFailure::GeometryUnresolved) => {
                f.write_str("location not found: host geometry unresolved")
            }
            DiagnosticKind::LocationNotFound(LocationFailure::OpeningsUnresolved) => {
                f.write_str("location not found: openings unresolved")
            }
            DiagnosticKind::ConversionFailed => f.write_str("conversion failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub element: ElementKey,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn location_not_found(element: ElementKey, failure: LocationFailure, message: impl Into<String>) -> Self {
        let severity = match failure {
            LocationFailure::GeometryUnresolved => Severity::Error,
            LocationFailure::OpeningsUnresolved => Severity::Warning,
        };
        Self {
            element,
            severity,
            kind: DiagnosticKind::LocationNotFound(failure),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conversion_failed(element: ElementKey, message: impl Into<String>) -> Self {
        Self {
            element,
            severity: Severity::Error,
            kind: DiagnosticKind::ConversionFailed,
            message: message.into(),
        }
    }
}

/// Ordered collection of diagnostics for one conversion pass.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        warn!(
            element = %diagnostic.element,
            severity = ?diagnostic.severity,
            kind = %diagnostic.kind,
            "{}",
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Diagnostics reported against one element.
    pub fn for_element(&self, element: ElementKey) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.element == element)
    }

    /// Returns `true` if any diagnostic of `kind` was reported for `element`.
    #[must_use]
    pub fn has(&self, element: ElementKey, kind: DiagnosticKind) -> bool {
        self.for_element(element).any(|d| d.kind == kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
