//! Core domain for tbdocs.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and cross-cutting error type used throughout the workspace, plus the
//! port traits the infrastructure crates implement.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ArtifactPath`, `RepositoryId`, `RunId`, etc.) |
//! | [`types`] | Shared value types (`DiffScope`, `DocsReport`, `Timestamp`, etc.) |
//! | [`entry_point`] | Entry point configuration, strategy kinds, and per-run results |
//! | [`config`] | `RunConfig`, `DocsTarget`, and the failure policy |
//! | [`errors`] | `ToolError` (ports) and `TbdocsError` (run) |
//! | [`ports`] | Traits for reporters, generators, diff, grouping, and publishing |
//! | [`registry`] | Name-keyed strategy registry |
//! | [`report`] | Markdown rendering of the aggregated report |

pub mod config;
pub mod entry_point;
pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod registry;
pub mod report;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{
    total_findings, DocsTarget, FailurePolicy, PolicyVerdict, RunConfig,
    DEFAULT_DOCS_TARGET_BRANCH, DEFAULT_DOCS_TARGET_PATH,
};
pub use entry_point::{EntryPoint, EntryPointResult, GeneratorKind, ReporterKind};
pub use errors::{TbdocsError, ToolError};
pub use identifiers::{
    ArtifactPath, BranchName, CommentId, CommitSha, MessageId, PullRequestNumber, RepositoryId,
    RunId,
};
pub use ports::{
    DiffProvider, DocsGenerator, DocsGrouper, DocsPublisher, DocsReporter, ReportPublisher,
};
pub use registry::StrategyRegistry;
pub use report::{render_report_markdown, REPORT_TITLE};
pub use types::{
    ChangedFiles, DiffScope, DocsReport, MessageLevel, ReportMessage, SourceLocation, Timestamp,
};
