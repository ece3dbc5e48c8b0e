//! Shared value types for the tbdocs domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (e.g. report counters always agree with
//! the message list, a diff scope is either unrestricted or an explicit set)
//! and participate in domain computations.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ArtifactPath, MessageId, ReporterKind};

// ---------------------------------------------------------------------------
// Diff scope
// ---------------------------------------------------------------------------

/// The set of files touched by the current change-set.
///
/// Ordered and de-duplicated; computed once per run and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFiles(BTreeSet<ArtifactPath>);

impl ChangedFiles {
    /// Returns `true` if `path` is part of the change-set.
    pub fn contains(&self, path: &ArtifactPath) -> bool {
        self.0.contains(path)
    }

    /// Number of changed files.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the changed paths in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &ArtifactPath> {
        self.0.iter()
    }
}

impl FromIterator<ArtifactPath> for ChangedFiles {
    fn from_iter<T: IntoIterator<Item = ArtifactPath>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------

/// Which files downstream steps should consider.
///
/// `All` is the explicit "no restriction" marker: the scope resolver returns it
/// whenever changed-scope reporting is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "files")]
pub enum DiffScope {
    /// Every file is in scope.
    All,
    /// Only the listed files are in scope.
    Changed(ChangedFiles),
}

impl DiffScope {
    /// Returns `true` if `path` is in scope.
    pub fn includes(&self, path: &ArtifactPath) -> bool {
        match self {
            DiffScope::All => true,
            DiffScope::Changed(files) => files.contains(path),
        }
    }

    /// Returns the changed set, or `None` for an unrestricted scope.
    pub fn changed_files(&self) -> Option<&ChangedFiles> {
        match self {
            DiffScope::All => None,
            DiffScope::Changed(files) => Some(files),
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Severity of a [`ReportMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    /// Counts toward `errors_count`; may fail the run under `fail_on_error`.
    Error,
    /// Counts toward `warnings_count`; may fail the run under `fail_on_warnings`.
    Warning,
}

impl std::fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageLevel::Error => f.write_str("error"),
            MessageLevel::Warning => f.write_str("warning"),
        }
    }
}

// ---------------------------------------------------------------------------

/// Where in the sources a message points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// File the message relates to, relative to the project root.
    pub path: ArtifactPath,
    /// 1-based line, when the reporter knows it.
    pub line: Option<u32>,
    /// 1-based column, when the reporter knows it.
    pub column: Option<u32>,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(column) = self.column {
                write!(f, ":{column}")?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------

/// A single finding produced by a docs reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMessage {
    /// Error or warning.
    pub level: MessageLevel,
    /// Reporter-specific identifier, used by ignore patterns.
    pub message_id: MessageId,
    /// Human-readable description.
    pub text: String,
    /// `None` for findings that are not tied to a file.
    pub location: Option<SourceLocation>,
}

// ---------------------------------------------------------------------------

/// The outcome of running one docs reporter against one entry point.
///
/// The counters are derived from `messages` at construction and cannot drift
/// from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocsReport {
    reporter: ReporterKind,
    entry_point: ArtifactPath,
    messages: Vec<ReportMessage>,
    errors_count: usize,
    warnings_count: usize,
}

impl DocsReport {
    /// Builds a report, counting errors and warnings from `messages`.
    pub fn new(
        reporter: ReporterKind,
        entry_point: ArtifactPath,
        messages: Vec<ReportMessage>,
    ) -> Self {
        let errors_count = messages
            .iter()
            .filter(|m| m.level == MessageLevel::Error)
            .count();
        let warnings_count = messages.len() - errors_count;
        Self {
            reporter,
            entry_point,
            messages,
            errors_count,
            warnings_count,
        }
    }

    /// The strategy that produced this report.
    pub fn reporter(&self) -> ReporterKind {
        self.reporter
    }

    /// The entry point file the report covers.
    pub fn entry_point(&self) -> &ArtifactPath {
        &self.entry_point
    }

    /// All findings, in reporter order.
    pub fn messages(&self) -> &[ReportMessage] {
        &self.messages
    }

    /// Number of [`MessageLevel::Error`] findings.
    pub fn errors_count(&self) -> usize {
        self.errors_count
    }

    /// Number of [`MessageLevel::Warning`] findings.
    pub fn warnings_count(&self) -> usize {
        self.warnings_count
    }

    /// Returns `true` if there are no findings at all.
    pub fn is_clean(&self) -> bool {
        self.messages.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
