//! Port traits implemented by infrastructure crates.
//!
//! The orchestration layer (`nodes`) talks to the outside world only through
//! these traits. `toolchain` implements the docs strategies and grouping,
//! `github` implements the diff provider and both publishers.
//!
//! All ports are `async` and object-safe (`Arc<dyn Port>`), so tests can swap
//! in scripted fakes.

use async_trait::async_trait;

use crate::{
    ArtifactPath, ChangedFiles, DiffScope, DocsReport, DocsTarget, EntryPoint, EntryPointResult,
    FailurePolicy, ToolError,
};

/// Produces a [`DocsReport`] for an entry point.
#[async_trait]
pub trait DocsReporter: Send + Sync {
    /// Inspects `entry_point`, keeping only findings inside `scope` whose
    /// message id matches none of `ignore` (glob patterns).
    async fn report(
        &self,
        entry_point: &EntryPoint,
        scope: &DiffScope,
        ignore: &[String],
    ) -> Result<DocsReport, ToolError>;
}

/// Renders documentation for an entry point.
#[async_trait]
pub trait DocsGenerator: Send + Sync {
    /// Generates docs and returns the directory they were written to,
    /// relative to the project root.
    async fn generate(&self, entry_point: &EntryPoint) -> Result<ArtifactPath, ToolError>;
}

/// Computes the files changed in the current change-set.
#[async_trait]
pub trait DiffProvider: Send + Sync {
    /// Returns the changed files. Called at most once per run.
    async fn changed_files(&self) -> Result<ChangedFiles, ToolError>;
}

/// Rearranges generated docs of all entry points into one location.
#[async_trait]
pub trait DocsGrouper: Send + Sync {
    /// Groups the generated docs and returns the results with their
    /// `generated_docs_path` pointing at the grouped locations.
    async fn group(
        &self,
        results: Vec<EntryPointResult>,
    ) -> Result<Vec<EntryPointResult>, ToolError>;
}

/// Publishes the aggregated markdown report.
#[async_trait]
pub trait ReportPublisher: Send + Sync {
    /// Publishes `markdown` and applies `policy`.
    ///
    /// Returns [`ToolError::PolicyViolation`] when the policy says the run
    /// fails; the report has still been published at that point.
    async fn publish_report(
        &self,
        results: &[EntryPointResult],
        markdown: &str,
        policy: FailurePolicy,
    ) -> Result<(), ToolError>;
}

/// Pushes generated docs to a target repository.
#[async_trait]
pub trait DocsPublisher: Send + Sync {
    /// Commits the generated docs of every result to `target`.
    async fn publish_docs(
        &self,
        results: &[EntryPointResult],
        target: &DocsTarget,
    ) -> Result<(), ToolError>;
}
