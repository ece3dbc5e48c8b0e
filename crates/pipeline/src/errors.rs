//! Error types for the tbdocs domain.
//!
//! [`ToolError`] is what every port returns: it describes why an external
//! collaborator (a docs tool, git, the GitHub API) could not do its job.
//!
//! [`TbdocsError`] covers conditions that terminate the run. Each variant adds
//! the step context (which entry point, which strategy) for logging, while its
//! `Display` output stays the originating message; that message is what the
//! action surfaces as its failure reason.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ArtifactPath, GeneratorKind, ReporterKind};

// ---------------------------------------------------------------------------
// Port-level errors
// ---------------------------------------------------------------------------

/// Failure reported by an infrastructure adapter behind one of the ports in
/// [`crate::ports`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ToolError {
    /// Reading or writing local files failed.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the failed operation.
        message: String,
    },

    /// An external program could not be started or exited unsuccessfully.
    #[error("`{program}` failed ({}): {stderr}", .code.map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}")))]
    CommandFailed {
        /// Program name as invoked (e.g. `"npx"`, `"git"`).
        program: String,
        /// Exit code, `None` if the process was killed by a signal or never ran.
        code: Option<i32>,
        /// Captured standard error (possibly truncated).
        stderr: String,
    },

    /// Tool output could not be interpreted.
    #[error("Could not parse {what}: {message}")]
    Parse {
        /// What was being parsed (e.g. `"GitHub event payload"`).
        what: String,
        /// Parser message.
        message: String,
    },

    /// A remote API answered with an error status.
    #[error("API request failed with status {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response message or body excerpt.
        message: String,
    },

    /// The report publisher decided, per the failure policy, that the run fails.
    #[error("Docs report has {errors} error(s) and {warnings} warning(s)")]
    PolicyViolation {
        /// Total errors across all reports.
        errors: usize,
        /// Total warnings across all reports.
        warnings: usize,
    },

    /// Any other failure, carried verbatim.
    #[error("{message}")]
    Failed {
        /// Human-readable description.
        message: String,
    },
}

impl ToolError {
    /// Shorthand for [`ToolError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        ToolError::Failed {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::Io {
            message: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Run-level errors
// ---------------------------------------------------------------------------

/// Errors that terminate a run.
///
/// There is no transient/permanent distinction: every variant is fatal and no
/// later step runs once one is produced.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum TbdocsError {
    /// The run configuration is invalid. Produced before any step runs.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },

    /// An entry point names a strategy that has no implementation registered.
    #[error("No implementation registered for {strategy}")]
    StrategyNotRegistered {
        /// Human-readable strategy description (e.g. `"docs reporter 'api-extractor'"`).
        strategy: String,
    },

    /// The diff provider failed while computing the changed files.
    #[error("{source}")]
    DiffScope {
        /// Underlying failure.
        source: ToolError,
    },

    /// A docs reporter failed for an entry point.
    #[error("{source}")]
    Reporter {
        /// Entry point being processed.
        entry_point: ArtifactPath,
        /// Strategy that failed.
        reporter: ReporterKind,
        /// Underlying failure.
        source: ToolError,
    },

    /// A docs generator failed for an entry point.
    #[error("{source}")]
    Generator {
        /// Entry point being processed.
        entry_point: ArtifactPath,
        /// Strategy that failed.
        generator: GeneratorKind,
        /// Underlying failure.
        source: ToolError,
    },

    /// Grouping generated docs failed.
    #[error("{source}")]
    Grouping {
        /// Underlying failure.
        source: ToolError,
    },

    /// Publishing the report (or the failure policy it applies) failed.
    #[error("{source}")]
    Publish {
        /// Underlying failure.
        source: ToolError,
    },

    /// Pushing generated docs to the target repository failed.
    #[error("{source}")]
    DocsPush {
        /// Underlying failure.
        source: ToolError,
    },
}
