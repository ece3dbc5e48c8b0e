//! Entry points and their per-run results.
//!
//! An [`EntryPoint`] is configuration: it names a documentation source and the
//! strategies to run against it. It never changes during a run. What the run
//! learns about an entry point accumulates in a separate [`EntryPointResult`],
//! which is only ever updated by functional replacement.

use serde::{Deserialize, Serialize};

use crate::{ArtifactPath, DocsReport};

// ---------------------------------------------------------------------------
// Strategy names
// ---------------------------------------------------------------------------

/// The closed set of docs reporter strategies.
///
/// Configuration refers to a reporter by its kebab-case name; unknown names are
/// rejected when the entry point list is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReporterKind {
    /// Microsoft API Extractor diagnostics (`ae-*`, `tsdoc-*` messages).
    #[serde(rename = "api-extractor")]
    ApiExtractor,
}

impl ReporterKind {
    /// Every known reporter, in declaration order.
    pub const ALL: &'static [ReporterKind] = &[ReporterKind::ApiExtractor];

    /// The configuration name of this reporter.
    pub fn as_str(self) -> &'static str {
        match self {
            ReporterKind::ApiExtractor => "api-extractor",
        }
    }
}

impl std::fmt::Display for ReporterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReporterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown docs reporter '{s}'"))
    }
}

// ---------------------------------------------------------------------------

/// The closed set of docs generator strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeneratorKind {
    /// TypeDoc with `typedoc-plugin-markdown`.
    #[serde(rename = "typedoc-markdown")]
    TypedocMarkdown,
}

impl GeneratorKind {
    /// Every known generator, in declaration order.
    pub const ALL: &'static [GeneratorKind] = &[GeneratorKind::TypedocMarkdown];

    /// The configuration name of this generator.
    pub fn as_str(self) -> &'static str {
        match self {
            GeneratorKind::TypedocMarkdown => "typedoc-markdown",
        }
    }
}

impl std::fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GeneratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown docs generator '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Entry point (input)
// ---------------------------------------------------------------------------

/// A configured documentation source.
///
/// Deserialised from the `entry-points` action input:
///
/// ```yaml
/// - file: packages/api/src/index.ts
///   docsReporter: api-extractor
///   docsReporterIgnore: [ae-missing-release-tag]
///   docsGenerator: typedoc-markdown
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EntryPoint {
    /// Source file of the documented surface, relative to the project root.
    pub file: ArtifactPath,

    /// Reporter to run, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_reporter: Option<ReporterKind>,

    /// Message-id glob patterns the reporter should drop.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs_reporter_ignore: Vec<String>,

    /// Generator to run, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_generator: Option<GeneratorKind>,
}

impl EntryPoint {
    /// Creates an entry point with no strategies configured.
    pub fn new(file: ArtifactPath) -> Self {
        Self {
            file,
            docs_reporter: None,
            docs_reporter_ignore: Vec::new(),
            docs_generator: None,
        }
    }

    /// Returns `true` if neither a reporter nor a generator is configured.
    pub fn is_passive(&self) -> bool {
        self.docs_reporter.is_none() && self.docs_generator.is_none()
    }
}

// ---------------------------------------------------------------------------
// Entry point result (accumulator)
// ---------------------------------------------------------------------------

/// What a run produced for one entry point.
///
/// Starts empty; the processor fills `report` and `generated_docs_path` at most
/// once each, and only when the corresponding strategy is configured and
/// succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPointResult {
    entry_point: EntryPoint,
    report: Option<DocsReport>,
    generated_docs_path: Option<ArtifactPath>,
}

impl EntryPointResult {
    /// An empty result for `entry_point`.
    pub fn new(entry_point: EntryPoint) -> Self {
        Self {
            entry_point,
            report: None,
            generated_docs_path: None,
        }
    }

    /// Returns a copy carrying `report`.
    #[must_use]
    pub fn with_report(self, report: DocsReport) -> Self {
        Self {
            report: Some(report),
            ..self
        }
    }

    /// Returns a copy whose generated docs live at `path`.
    ///
    /// Also used by grouping to point at relocated docs.
    #[must_use]
    pub fn with_generated_docs_path(self, path: ArtifactPath) -> Self {
        Self {
            generated_docs_path: Some(path),
            ..self
        }
    }

    /// The configuration this result belongs to.
    pub fn entry_point(&self) -> &EntryPoint {
        &self.entry_point
    }

    /// The reporter's output, if a reporter ran.
    pub fn report(&self) -> Option<&DocsReport> {
        self.report.as_ref()
    }

    /// Where generated docs were written, if a generator ran.
    pub fn generated_docs_path(&self) -> Option<&ArtifactPath> {
        self.generated_docs_path.as_ref()
    }
}
